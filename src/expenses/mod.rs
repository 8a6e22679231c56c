//! The expenses page: expenses and consignments entered during a work trip,
//! their support images, the running balance and the expense report PDF.

mod calculator;
mod handlers;
pub mod models;
mod page;
pub(crate) mod workflow;

pub use calculator::ExpenseSummary;
pub use handlers::{
    add_consignment, add_expense, clear_expenses, delete_consignment, delete_expense,
    delete_support_image, download_expenses_pdf, get_expenses_page, upload_support_images,
};
pub use workflow::{ExpenseWorkflow, ImageKind};
