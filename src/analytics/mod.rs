//! The analytics page: KPIs, trends, charts and tables computed from the
//! rows the backend extracts from an uploaded spreadsheet.

mod aggregation;
mod cards;
mod charts;
mod handlers;
mod month;
mod tables;

pub use aggregation::is_pending;
pub use handlers::{get_analytics_page, post_analytics};
