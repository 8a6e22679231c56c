//! Client-side PDF composition for the expense report.
//!
//! Composition is split in two: [layout] turns tables, headings and images
//! into a flat list of positioned drawing operations (tracking page breaks as
//! it goes), and [render] draws those operations with `printpdf`. Keeping the
//! layout free of any PDF types is what makes pagination testable.

mod composer;
mod images;
mod layout;
mod render;

pub use composer::{ExpenseReportInput, generate_expense_pdf};
pub use images::encode_data_uri;

/// Errors from composing or rendering a PDF.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PdfError {
    /// A table row did not have one cell per column.
    #[error("table row {row} has {found} cells but the table has {expected} columns")]
    Table {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A support image could not be decoded.
    #[error("could not decode image: {0}")]
    Image(String),

    /// The PDF library failed to produce the document.
    #[error("could not render PDF: {0}")]
    Render(String),
}
