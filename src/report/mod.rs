//! The backend generated reports: "Relación de Servicios" and "Pendientes de
//! Pago".
//!
//! Both pages share one form (spreadsheet, date range, notes, support images
//! and an optional filename) with a row preview and a PDF download.

mod filename;
mod form;
mod handlers;
mod multipart;
mod page;

pub use filename::{default_filename, normalize_filename};
pub use form::{ReportForm, ReportFormEvent, ReportRequest, ValidationError};
pub use handlers::{
    download_pendientes_pdf, download_relacion_pdf, get_pendientes_page,
    get_relacion_page, preview_pendientes, preview_relacion,
};
