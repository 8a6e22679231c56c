//! Request and response bodies exchanged with the report backend.

use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    expenses::models::{ConsignmentEntry, ExpenseEntry},
    records::{Row, value_as_amount},
};

/// A spreadsheet uploaded by the user, forwarded as-is to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The `{data: [...]}` body of the row endpoints.
#[derive(Debug, Default, Deserialize)]
pub(super) struct DataResponse {
    #[serde(default)]
    pub data: Vec<Row>,
}

/// The body of `/api/analytics`.
///
/// The backend does not pin down the shape of the chart fields, so they are
/// kept as raw JSON and read through the accessor methods.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyticsSummary {
    pub resumen: Map<String, Value>,
    pub estados_grafico: Value,
    pub totales_estados_especiales: Map<String, Value>,
    pub estados_especiales_por_mes: Value,
    pub clientes_recurrentes: Vec<Row>,
    pub total_pendientes_relacionar: Value,
    pub total_pendientes_cobrar: Value,
}

impl AnalyticsSummary {
    /// Label and count pairs for the state chart.
    ///
    /// Accepts an object of counts, an array of `{estado, cantidad}` objects,
    /// or `{labels: [...], data: [...]}`.
    pub fn estado_counts(&self) -> Vec<(String, f64)> {
        labelled_counts(&self.estados_grafico)
    }

    /// Counts per special state per month, in the order the backend sent them.
    pub fn special_states_by_month(&self) -> Vec<(String, Vec<(String, f64)>)> {
        match &self.estados_especiales_por_mes {
            Value::Object(months) => months
                .iter()
                .map(|(mes, counts)| (mes.clone(), labelled_counts(counts)))
                .collect(),
            Value::Array(rows) => rows
                .iter()
                .filter_map(Value::as_object)
                .map(|row| {
                    let mes = ["mes", "Mes", "month"]
                        .iter()
                        .find_map(|key| row.get(*key))
                        .map(value_text)
                        .unwrap_or_default();
                    let counts = row
                        .iter()
                        .filter(|(key, _)| !matches!(key.as_str(), "mes" | "Mes" | "month"))
                        .map(|(key, value)| (key.clone(), value_as_amount(value)))
                        .collect();
                    (mes, counts)
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn pendientes_relacionar(&self) -> f64 {
        value_as_amount(&self.total_pendientes_relacionar)
    }

    pub fn pendientes_cobrar(&self) -> f64 {
        value_as_amount(&self.total_pendientes_cobrar)
    }
}

/// The body of the pending-payment analytics endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PendingAnalytics {
    pub success: bool,
    pub resumen: Map<String, Value>,
    pub detalle: Vec<Row>,
}

/// The JSON body of `/api/gastos/generar-pdf`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePdfRequest<'a> {
    pub gastos: &'a [ExpenseEntry],
    pub consignaciones: &'a [ConsignmentEntry],
    pub imagenes_gastos: &'a [String],
    pub imagenes_consignaciones: &'a [String],
    pub imagenes_devoluciones: &'a [String],
    #[serde(rename = "nombrePDF")]
    pub nombre_pdf: &'a str,
}

fn labelled_counts(value: &Value) -> Vec<(String, f64)> {
    match value {
        Value::Object(object) => {
            let labels = object.get("labels").and_then(Value::as_array);
            let data = ["data", "values"]
                .iter()
                .find_map(|key| object.get(*key))
                .and_then(Value::as_array);

            match (labels, data) {
                (Some(labels), Some(data)) => labels
                    .iter()
                    .zip(data)
                    .map(|(label, count)| (value_text(label), value_as_amount(count)))
                    .collect(),
                _ => object
                    .iter()
                    .map(|(label, count)| (label.clone(), value_as_amount(count)))
                    .collect(),
            }
        }
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .map(|item| {
                let label = ["estado", "name", "label"]
                    .iter()
                    .find_map(|key| item.get(*key))
                    .map(value_text)
                    .unwrap_or_default();
                let count = ["cantidad", "value", "count", "total"]
                    .iter()
                    .find_map(|key| item.get(*key))
                    .map(value_as_amount)
                    .unwrap_or(0.0);
                (label, count)
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
