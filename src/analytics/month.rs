//! Month keys used to bucket service rows.

use std::fmt::Display;

use serde::Serialize;
use time::Date;

/// Spanish three-letter month abbreviations, in calendar order.
///
/// Sorting always goes through this table (via [MonthKey]'s ordering) so
/// that "abr" never sorts before "ene".
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic",
];

/// Full Spanish month names, in calendar order.
pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// A calendar month of a specific year.
///
/// Ordering is chronological: by year, then by month number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MonthKey {
    pub year: i32,
    /// 1 to 12.
    pub month: u8,
}

impl MonthKey {
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month() as u8,
        }
    }

    /// The abbreviated label, e.g. "ene 2024".
    pub fn label(&self) -> String {
        format!("{} {}", self.abbreviation(), self.year)
    }

    /// The sortable key, e.g. "2024-01".
    pub fn iso(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }

    /// The long label, e.g. "Enero 2024".
    pub fn long_label(&self) -> String {
        format!("{} {}", MONTH_NAMES[self.index()], self.year)
    }

    pub fn abbreviation(&self) -> &'static str {
        MONTH_ABBREVIATIONS[self.index()]
    }

    fn index(&self) -> usize {
        usize::from(self.month.clamp(1, 12)) - 1
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::MonthKey;

    #[test]
    fn formats_both_label_styles() {
        let key = MonthKey::from_date(date!(2024 - 01 - 20));

        assert_eq!(key.label(), "ene 2024");
        assert_eq!(key.iso(), "2024-01");
        assert_eq!(key.long_label(), "Enero 2024");
    }

    #[test]
    fn orders_by_calendar_not_alphabet() {
        let mut keys = vec![
            MonthKey::from_date(date!(2024 - 04 - 02)),
            MonthKey::from_date(date!(2024 - 01 - 31)),
            MonthKey::from_date(date!(2023 - 12 - 15)),
        ];

        keys.sort();

        let labels: Vec<String> = keys.iter().map(MonthKey::label).collect();
        assert_eq!(labels, vec!["dic 2023", "ene 2024", "abr 2024"]);
    }
}
