//! The per-session state of the expenses page.
//!
//! Entries and support images live in memory for as long as the browser
//! session does. They are never written to disk. All changes go through
//! [ExpenseWorkflow::apply] so the handlers stay thin.

use serde::{Deserialize, Serialize};

use crate::expenses::{
    calculator::{ExpenseSummary, calculate_expenses},
    models::{ConsignmentEntry, ExpenseEntry},
};

/// Which attachment section a support image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Gastos,
    Consignaciones,
    Devoluciones,
}

impl ImageKind {
    pub const ALL: [ImageKind; 3] = [
        ImageKind::Gastos,
        ImageKind::Consignaciones,
        ImageKind::Devoluciones,
    ];

    /// The heading used for this section on the page and in the PDF.
    pub fn title(&self) -> &'static str {
        match self {
            ImageKind::Gastos => "Soportes de gastos",
            ImageKind::Consignaciones => "Soportes de consignaciones",
            ImageKind::Devoluciones => "Soportes de devoluciones",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Gastos => "gastos",
            ImageKind::Consignaciones => "consignaciones",
            ImageKind::Devoluciones => "devoluciones",
        }
    }
}

/// Support images as data URIs, grouped by section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachedImages {
    pub gastos: Vec<String>,
    pub consignaciones: Vec<String>,
    pub devoluciones: Vec<String>,
}

impl AttachedImages {
    pub fn get(&self, kind: ImageKind) -> &[String] {
        match kind {
            ImageKind::Gastos => &self.gastos,
            ImageKind::Consignaciones => &self.consignaciones,
            ImageKind::Devoluciones => &self.devoluciones,
        }
    }

    fn get_mut(&mut self, kind: ImageKind) -> &mut Vec<String> {
        match kind {
            ImageKind::Gastos => &mut self.gastos,
            ImageKind::Consignaciones => &mut self.consignaciones,
            ImageKind::Devoluciones => &mut self.devoluciones,
        }
    }

    pub fn len(&self) -> usize {
        self.gastos.len() + self.consignaciones.len() + self.devoluciones.len()
    }
}

/// Something the user did on the expenses page.
#[derive(Debug, Clone)]
pub enum ExpenseEvent {
    ExpenseAdded(ExpenseEntry),
    ExpenseRemoved(usize),
    ConsignmentAdded(ConsignmentEntry),
    ConsignmentRemoved(usize),
    ImageAttached { kind: ImageKind, data_uri: String },
    ImageRemoved { kind: ImageKind, index: usize },
    Cleared,
}

/// The expenses page view-model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseWorkflow {
    pub gastos: Vec<ExpenseEntry>,
    pub consignaciones: Vec<ConsignmentEntry>,
    pub imagenes: AttachedImages,
}

impl ExpenseWorkflow {
    /// Apply `event` and report whether anything changed.
    ///
    /// Removing an index that does not exist is a no-op, which happens when a
    /// stale page submits a delete twice.
    pub fn apply(&mut self, event: ExpenseEvent) -> bool {
        match event {
            ExpenseEvent::ExpenseAdded(entry) => {
                self.gastos.push(entry);
                true
            }
            ExpenseEvent::ExpenseRemoved(index) => remove_at(&mut self.gastos, index),
            ExpenseEvent::ConsignmentAdded(entry) => {
                self.consignaciones.push(entry);
                true
            }
            ExpenseEvent::ConsignmentRemoved(index) => remove_at(&mut self.consignaciones, index),
            ExpenseEvent::ImageAttached { kind, data_uri } => {
                self.imagenes.get_mut(kind).push(data_uri);
                true
            }
            ExpenseEvent::ImageRemoved { kind, index } => {
                remove_at(self.imagenes.get_mut(kind), index)
            }
            ExpenseEvent::Cleared => {
                let changed = *self != Self::default();
                *self = Self::default();
                changed
            }
        }
    }

    pub fn summary(&self) -> ExpenseSummary {
        calculate_expenses(&self.gastos, &self.consignaciones)
    }

    pub fn is_empty(&self) -> bool {
        self.gastos.is_empty() && self.consignaciones.is_empty()
    }
}

fn remove_at<T>(items: &mut Vec<T>, index: usize) -> bool {
    if index < items.len() {
        items.remove(index);
        true
    } else {
        false
    }
}
