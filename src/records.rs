//! Normalisation of spreadsheet rows returned by the report backend.
//!
//! The backend echoes Excel rows as loose JSON objects and the column names
//! change casing from one file to the next (`fecha`, `Fecha`, `FECHA`, ...).
//! Each row is resolved once into a [ServiceRecord] so that the aggregation
//! code only ever deals with a single schema.

use serde_json::{Map, Value};
use time::{Date, Duration, Month, OffsetDateTime, format_description::well_known::Rfc2822};

/// A raw row as returned by the backend.
pub type Row = Map<String, Value>;

/// Column names for the service date, in priority order.
pub const FECHA_KEYS: &[&str] = &["fecha", "Fecha", "FECHA"];
/// Column names for the service price, in priority order.
pub const PRECIO_KEYS: &[&str] = &["precio", "Precio", "PRECIO", "valor", "Valor", "VALOR"];
/// Column names for the service status, in priority order.
pub const ESTADO_KEYS: &[&str] = &["estado", "Estado", "ESTADO"];
/// Column names for the payment method or payment status, in priority order.
pub const PAGO_KEYS: &[&str] = &["pago", "Pago", "PAGO", "forma_pago", "FORMA_PAGO"];
/// Column names for the service name, in priority order.
pub const SERVICIO_KEYS: &[&str] = &["servicio", "Servicio", "SERVICIO", "tipo_servicio"];
/// Column names for the free-text description, in priority order.
pub const DESCRIPCION_KEYS: &[&str] = &[
    "descripcion",
    "Descripcion",
    "DESCRIPCION",
    "descripción",
    "Descripción",
];
/// Column names for the client name, in priority order.
pub const CLIENTE_KEYS: &[&str] = &["cliente", "Cliente", "CLIENTE"];

/// Excel stores dates as the number of days since this date.
const EXCEL_EPOCH: Date = time::macros::date!(1899 - 12 - 30);

/// Serial numbers outside this range are not treated as Excel dates.
const EXCEL_SERIAL_RANGE: std::ops::RangeInclusive<f64> = 1.0..=2_958_465.0;

/// A service row resolved into the canonical schema.
///
/// Missing fields default to zero or the empty string, mirroring how the
/// spreadsheet is read: nothing is rejected at ingestion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceRecord {
    /// `None` when the row has no date or the date could not be parsed.
    pub fecha: Option<Date>,
    pub precio: f64,
    pub estado: String,
    pub pago: String,
    pub servicio: String,
    pub descripcion: String,
    pub cliente: String,
}

impl ServiceRecord {
    /// Resolve a raw backend row into a [ServiceRecord].
    pub fn from_row(row: &Row) -> Self {
        Self {
            fecha: resolve_field(row, FECHA_KEYS).and_then(value_as_date),
            precio: resolve_amount(row, PRECIO_KEYS),
            estado: resolve_text(row, ESTADO_KEYS),
            pago: resolve_text(row, PAGO_KEYS),
            servicio: resolve_text(row, SERVICIO_KEYS),
            descripcion: resolve_text(row, DESCRIPCION_KEYS),
            cliente: resolve_text(row, CLIENTE_KEYS),
        }
    }

    /// The status and payment columns, lowercased. The status keyword rules
    /// match each column on its own.
    pub fn status_fields(&self) -> [String; 2] {
        [self.estado.to_lowercase(), self.pago.to_lowercase()]
    }
}

/// Resolve every row in `rows`.
pub fn normalize_rows(rows: &[Row]) -> Vec<ServiceRecord> {
    rows.iter().map(ServiceRecord::from_row).collect()
}

/// Returns the value of the first key in `keys` that holds a non-empty value.
///
/// `null` and strings that are empty after trimming count as empty, so a blank
/// `fecha` column does not hide a filled `Fecha` column.
pub fn resolve_field<'a>(row: &'a Row, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find(|value| !is_blank(value))
}

/// Like [resolve_field] but renders the value as trimmed text.
pub fn resolve_text(row: &Row, keys: &[&str]) -> String {
    match resolve_field(row, keys) {
        Some(Value::String(text)) => text.trim().to_owned(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Like [resolve_field] but reads the value as an amount, defaulting to zero.
pub fn resolve_amount(row: &Row, keys: &[&str]) -> f64 {
    resolve_field(row, keys).map(value_as_amount).unwrap_or(0.0)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

/// Read a JSON value as an amount. Anything that is not a number or a string
/// starting with a number is zero.
pub fn value_as_amount(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => parse_float(text),
        _ => 0.0,
    }
}

/// Parse the longest numeric prefix of `text`, returning zero if there is none.
///
/// Leading whitespace is skipped and trailing garbage is ignored, so
/// `"100000 COP"` is `100000.0` while `"$100"` is `0.0`.
pub fn parse_float(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let len = bytes.len();
    let is_digit = |index: usize| index < len && bytes[index].is_ascii_digit();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let integer_start = end;
    while is_digit(end) {
        end += 1;
    }
    let mut mantissa_digits = end - integer_start;

    if end < len && bytes[end] == b'.' {
        let mut fraction_end = end + 1;
        while is_digit(fraction_end) {
            fraction_end += 1;
        }
        mantissa_digits += fraction_end - (end + 1);
        if mantissa_digits > 0 {
            end = fraction_end;
        }
    }

    if mantissa_digits == 0 {
        return 0.0;
    }

    if end < len && matches!(bytes[end], b'e' | b'E') {
        let mut exponent_end = end + 1;
        if exponent_end < len && matches!(bytes[exponent_end], b'+' | b'-') {
            exponent_end += 1;
        }
        let exponent_digits_start = exponent_end;
        while is_digit(exponent_end) {
            exponent_end += 1;
        }
        if exponent_end > exponent_digits_start {
            end = exponent_end;
        }
    }

    text[..end]
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .unwrap_or(0.0)
}

/// Read a JSON value as a calendar date.
///
/// Accepts ISO dates (optionally followed by a time), `DD/MM/YYYY`, RFC 2822
/// timestamps (what Flask serialises `datetime` values as) and Excel serial
/// numbers.
pub fn value_as_date(value: &Value) -> Option<Date> {
    match value {
        Value::String(text) => parse_date(text),
        Value::Number(number) => number.as_f64().and_then(excel_serial_to_date),
        _ => None,
    }
}

/// Parse a date string in any of the formats the backend produces.
pub fn parse_date(text: &str) -> Option<Date> {
    let text = text.trim();

    if let Ok(date_time) = OffsetDateTime::parse(text, &Rfc2822) {
        return Some(date_time.date());
    }

    let date_part = text.split(['T', ' ']).next()?;
    let parts: Vec<&str> = date_part.split(['-', '/']).collect();
    let [first, second, third] = parts.as_slice() else {
        return None;
    };

    if first.len() == 4 {
        build_date(first.parse().ok()?, second.parse().ok()?, third.parse().ok()?)
    } else if third.len() == 4 {
        build_date(third.parse().ok()?, second.parse().ok()?, first.parse().ok()?)
    } else {
        None
    }
}

fn build_date(year: i32, month: u8, day: u8) -> Option<Date> {
    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}

fn excel_serial_to_date(serial: f64) -> Option<Date> {
    if !EXCEL_SERIAL_RANGE.contains(&serial) {
        return None;
    }

    EXCEL_EPOCH.checked_add(Duration::days(serial.trunc() as i64))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::date;

    use super::{
        PRECIO_KEYS, Row, ServiceRecord, parse_date, parse_float, resolve_field, resolve_text,
        value_as_date,
    };

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().expect("test rows must be objects")
    }

    #[test]
    fn resolve_field_uses_priority_order() {
        let row = row(json!({"PRECIO": 3, "Precio": 2, "precio": 1}));

        assert_eq!(resolve_field(&row, PRECIO_KEYS), Some(&json!(1)));
    }

    #[test]
    fn resolve_field_skips_blank_values() {
        let row = row(json!({"precio": "  ", "Precio": null, "PRECIO": 50000}));

        assert_eq!(resolve_field(&row, PRECIO_KEYS), Some(&json!(50000)));
    }

    #[test]
    fn resolve_text_defaults_to_empty_string() {
        let row = row(json!({"otro": "x"}));

        assert_eq!(resolve_text(&row, &["estado", "Estado"]), "");
    }

    #[test]
    fn parse_float_reads_numeric_prefix() {
        assert_eq!(parse_float("100000"), 100000.0);
        assert_eq!(parse_float("  42.5kg"), 42.5);
        assert_eq!(parse_float("-3e2x"), -300.0);
        assert_eq!(parse_float("7e"), 7.0);
        assert_eq!(parse_float(".5"), 0.5);
        assert_eq!(parse_float("5."), 5.0);
    }

    #[test]
    fn parse_float_defaults_to_zero() {
        assert_eq!(parse_float(""), 0.0);
        assert_eq!(parse_float("$150.000"), 0.0);
        assert_eq!(parse_float("abc"), 0.0);
        assert_eq!(parse_float("-"), 0.0);
        assert_eq!(parse_float("."), 0.0);
    }

    #[test]
    fn parse_date_accepts_backend_formats() {
        assert_eq!(parse_date("2024-01-05"), Some(date!(2024 - 01 - 05)));
        assert_eq!(parse_date("2024-01-05T10:30:00"), Some(date!(2024 - 01 - 05)));
        assert_eq!(parse_date("2024-01-05 10:30:00"), Some(date!(2024 - 01 - 05)));
        assert_eq!(parse_date("20/01/2024"), Some(date!(2024 - 01 - 20)));
        assert_eq!(
            parse_date("Fri, 05 Jan 2024 00:00:00 GMT"),
            Some(date!(2024 - 01 - 05))
        );
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert_eq!(parse_date("mañana"), None);
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date("05-01-24"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn excel_serial_numbers_become_dates() {
        assert_eq!(value_as_date(&json!(45296)), Some(date!(2024 - 01 - 05)));
        assert_eq!(value_as_date(&json!(-4)), None);
    }

    #[test]
    fn from_row_reads_mixed_casing() {
        let row = row(json!({
            "Fecha": "2024-01-05",
            "PRECIO": "100000",
            "estado": "Pendiente",
            "Servicio": "Mantenimiento puerta",
            "CLIENTE": "Edificio Central",
        }));

        let record = ServiceRecord::from_row(&row);

        assert_eq!(
            record,
            ServiceRecord {
                fecha: Some(date!(2024 - 01 - 05)),
                precio: 100000.0,
                estado: "Pendiente".to_owned(),
                pago: String::new(),
                servicio: "Mantenimiento puerta".to_owned(),
                descripcion: String::new(),
                cliente: "Edificio Central".to_owned(),
            }
        );
    }

    #[test]
    fn from_row_defaults_missing_fields() {
        let record = ServiceRecord::from_row(&Row::new());

        assert_eq!(record, ServiceRecord::default());
    }
}
