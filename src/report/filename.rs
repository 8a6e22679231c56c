//! Output filenames for generated PDFs.

use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

const TIMESTAMP_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");

/// The filename used when the user does not pick one, e.g.
/// `Relacion_Servicios_2024-05-02_10-30-00.pdf`.
pub fn default_filename(prefix: &str, now: OffsetDateTime) -> String {
    match now.format(TIMESTAMP_FORMAT) {
        Ok(timestamp) => format!("{prefix}_{timestamp}.pdf"),
        Err(error) => {
            tracing::warn!("could not format timestamp for filename: {error}");
            format!("{prefix}.pdf")
        }
    }
}

/// Clean up a user supplied filename.
///
/// Path separators, quotes and control characters become underscores and
/// `.pdf` is appended when missing. Returns `None` for a blank name.
pub fn normalize_filename(name: &str) -> Option<String> {
    let name = name.trim();

    if name.is_empty() {
        return None;
    }

    let mut cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if !cleaned.to_lowercase().ends_with(".pdf") {
        cleaned.push_str(".pdf");
    }

    Some(cleaned)
}
