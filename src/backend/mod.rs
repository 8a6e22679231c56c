//! The external report backend.
//!
//! The backend parses the uploaded spreadsheets and renders the official PDF
//! reports. This module only knows how to talk to it over HTTP.

mod client;
mod error;
mod models;

pub use client::BackendClient;
pub use error::{BackendError, UNREACHABLE_MESSAGE};
pub use models::{AnalyticsSummary, ExpensePdfRequest, PendingAnalytics, UploadedFile};

#[cfg(test)]
pub use client::paths;
