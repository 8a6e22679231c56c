//! Expense and consignment line items entered on the expenses page.

use serde::{Deserialize, Serialize};

use crate::records::parse_float;

/// Categories offered in the expense form.
pub const EXPENSE_CATEGORIES: [&str; 8] = [
    "Combustible",
    "Materiales",
    "Herramientas",
    "Transporte",
    "Alimentación",
    "Peajes",
    "Parqueadero",
    "Otros",
];

/// A single expense paid by the technician.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    /// The date as entered, `YYYY-MM-DD`.
    pub fecha: String,
    pub categoria: String,
    pub monto: f64,
    pub descripcion: String,
}

/// Money handed to the technician to cover expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsignmentEntry {
    /// The date as entered, `YYYY-MM-DD`.
    pub fecha: String,
    pub entregado_por: String,
    pub monto: f64,
    pub descripcion: String,
}

/// Form data for adding an expense.
///
/// The amount arrives as text and is read with [parse_float], so malformed
/// input becomes zero rather than an error.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseForm {
    pub fecha: String,
    pub categoria: String,
    pub monto: String,
    #[serde(default)]
    pub descripcion: String,
}

impl From<ExpenseForm> for ExpenseEntry {
    fn from(form: ExpenseForm) -> Self {
        Self {
            fecha: form.fecha.trim().to_owned(),
            categoria: form.categoria.trim().to_owned(),
            monto: parse_float(&form.monto),
            descripcion: form.descripcion.trim().to_owned(),
        }
    }
}

/// Form data for adding a consignment.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsignmentForm {
    pub fecha: String,
    pub entregado_por: String,
    pub monto: String,
    #[serde(default)]
    pub descripcion: String,
}

impl From<ConsignmentForm> for ConsignmentEntry {
    fn from(form: ConsignmentForm) -> Self {
        Self {
            fecha: form.fecha.trim().to_owned(),
            entregado_por: form.entregado_por.trim().to_owned(),
            monto: parse_float(&form.monto),
            descripcion: form.descripcion.trim().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConsignmentEntry, ConsignmentForm, ExpenseEntry, ExpenseForm};

    #[test]
    fn expense_form_defaults_bad_amount_to_zero() {
        let form: ExpenseForm =
            serde_html_form::from_str("fecha=2024-05-01&categoria=Peajes&monto=abc").unwrap();

        let entry = ExpenseEntry::from(form);

        assert_eq!(entry.monto, 0.0);
        assert_eq!(entry.descripcion, "");
    }

    #[test]
    fn consignment_form_reads_amount_prefix() {
        let form: ConsignmentForm = serde_html_form::from_str(
            "fecha=2024-05-01&entregado_por=Oficina&monto=250000&descripcion=+Anticipo+",
        )
        .unwrap();

        let entry = ConsignmentEntry::from(form);

        assert_eq!(entry.monto, 250000.0);
        assert_eq!(entry.entregado_por, "Oficina");
        assert_eq!(entry.descripcion, "Anticipo");
    }
}
