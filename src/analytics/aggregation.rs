//! Service record aggregation for the analytics views.
//!
//! Buckets normalised service records by month, category and status, and
//! derives the KPI and trend figures shown at the top of the analytics page.
//! Every function here is pure; the handlers fetch the rows and the views
//! render whatever these functions return.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    analytics::month::MonthKey,
    records::{
        FECHA_KEYS, PAGO_KEYS, PRECIO_KEYS, Row, ServiceRecord, resolve_amount, resolve_field,
        resolve_text, value_as_amount, value_as_date,
    },
};

const PENDING_KEYWORDS: [&str; 2] = ["pendiente", "no pagado"];
const CANCELLED_KEYWORDS: [&str; 2] = ["cancel", "anulad"];
const QUOTED_KEYWORDS: [&str; 1] = ["cotiz"];
const COMPLETED_KEYWORDS: [&str; 4] = ["completad", "pagado", "finalizad", "terminad"];

const EFECTIVO_KEYS: &[&str] = &["efectivo", "Efectivo", "EFECTIVO"];
const TRANSFERENCIA_KEYS: &[&str] = &["transferencia", "Transferencia", "TRANSFERENCIA"];
const TOTAL_KEYS: &[&str] = &["total", "Total", "TOTAL"];

/// Services, revenue and payment split for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket {
    pub mes: MonthKey,
    pub servicios: usize,
    pub ingresos: f64,
    pub pendientes: usize,
    pub completados: usize,
}

impl MonthlyBucket {
    fn new(mes: MonthKey) -> Self {
        Self {
            mes,
            servicios: 0,
            ingresos: 0.0,
            pendientes: 0,
            completados: 0,
        }
    }
}

/// The fixed service categories, in the order their keyword rules are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    Mantenimientos,
    PuertasVidrio,
    Automatismos,
    Cerrajeria,
    Reparaciones,
    Instalaciones,
    OtrosServicios,
}

impl Category {
    /// Categories with keyword rules, in matching order. [Category::OtrosServicios]
    /// is the fallback and has no rule.
    const RULES: [(Category, &'static [&'static str]); 6] = [
        (Category::Mantenimientos, &["mantenimiento", "mantto"]),
        (Category::PuertasVidrio, &["vidrio", "cristal"]),
        (
            Category::Automatismos,
            &["automat", "motor", "control remoto", "sensor"],
        ),
        (
            Category::Cerrajeria,
            &["cerradura", "cerrajer", "chapa", "llave", "candado"],
        ),
        (Category::Reparaciones, &["reparaci", "arreglo", "ajuste"]),
        (Category::Instalaciones, &["instalaci", "montaje"]),
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Mantenimientos => "Mantenimientos",
            Category::PuertasVidrio => "Puertas Vidrio",
            Category::Automatismos => "Automatismos",
            Category::Cerrajeria => "Cerrajería",
            Category::Reparaciones => "Reparaciones",
            Category::Instalaciones => "Instalaciones",
            Category::OtrosServicios => "Otros Servicios",
        }
    }

    /// Classify free text. The first category whose keyword appears in the
    /// lowercased text wins.
    pub fn classify(text: &str) -> Category {
        let text = text.to_lowercase();

        Self::RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|keyword| text.contains(keyword)))
            .map(|(category, _)| *category)
            .unwrap_or(Category::OtrosServicios)
    }
}

/// Which text columns feed the category classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkMode {
    /// Classify on the service name, falling back to the description when the
    /// service column is empty.
    #[default]
    Servicios,
    /// Classify on the service name and description together.
    Detallado,
}

impl WorkMode {
    fn classification_text(&self, record: &ServiceRecord) -> String {
        match self {
            WorkMode::Servicios if record.servicio.is_empty() => record.descripcion.clone(),
            WorkMode::Servicios => record.servicio.clone(),
            WorkMode::Detallado => format!("{} {}", record.servicio, record.descripcion),
        }
    }
}

/// Row count, revenue and share of rows for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBucket {
    pub categoria: Category,
    pub cantidad: usize,
    pub ingresos: f64,
    /// Share of the total row count, rounded to a whole percent.
    pub porcentaje: u32,
}

/// The four status buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ServiceStatus {
    Completados,
    Pendientes,
    Cotizados,
    Cancelados,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 4] = [
        ServiceStatus::Completados,
        ServiceStatus::Pendientes,
        ServiceStatus::Cotizados,
        ServiceStatus::Cancelados,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ServiceStatus::Completados => "Completados",
            ServiceStatus::Pendientes => "Pendientes",
            ServiceStatus::Cotizados => "Cotizados",
            ServiceStatus::Cancelados => "Cancelados",
        }
    }

    /// Classify a record by its status and payment text. Rows that match no
    /// rule are pending.
    pub fn classify(record: &ServiceRecord) -> ServiceStatus {
        let fields = record.status_fields();
        let matches = |keywords: &[&str]| mentions_any(&fields, keywords);

        if matches(&CANCELLED_KEYWORDS) {
            ServiceStatus::Cancelados
        } else if matches(&QUOTED_KEYWORDS) {
            ServiceStatus::Cotizados
        } else if matches(&PENDING_KEYWORDS) {
            ServiceStatus::Pendientes
        } else if matches(&COMPLETED_KEYWORDS) {
            ServiceStatus::Completados
        } else {
            ServiceStatus::Pendientes
        }
    }
}

/// Row count and share of rows for one status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBucket {
    pub estado: ServiceStatus,
    pub cantidad: usize,
    pub porcentaje: u32,
}

/// Headline figures for the analytics page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_servicios: usize,
    pub ingresos_totales: f64,
    pub completados: usize,
    pub pendientes: usize,
    /// Completed rows as a whole percent of all rows.
    pub tasa_completado: u32,
    pub ingreso_promedio: f64,
}

/// Month-over-month growth between the two most recent months.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trends {
    pub mes_actual: Option<MonthKey>,
    pub mes_anterior: Option<MonthKey>,
    /// Percent change in services, rounded to one decimal.
    pub crecimiento_servicios: f64,
    /// Percent change in revenue, rounded to one decimal.
    pub crecimiento_ingresos: f64,
}

/// Pending-payment totals for one month, keyed "YYYY-MM" in the views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingMonthBucket {
    pub mes: MonthKey,
    pub cantidad_general: usize,
    pub efectivo_total: f64,
    pub transferencia_total: f64,
    pub total_general: f64,
}

/// Whether a record counts as pending under the binary pending/completed rule.
pub fn is_pending(record: &ServiceRecord) -> bool {
    mentions_any(&record.status_fields(), &PENDING_KEYWORDS)
}

/// Whether any single field contains one of `keywords`. A keyword never
/// matches across the boundary between two fields.
fn mentions_any(fields: &[String], keywords: &[&str]) -> bool {
    fields
        .iter()
        .any(|field| keywords.iter().any(|keyword| field.contains(keyword)))
}

/// `count` as a whole percent of `total`, or zero when `total` is zero.
pub fn percentage_of(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }

    (count as f64 / total as f64 * 100.0).round() as u32
}

/// Groups records by month.
///
/// Records without a usable date are left out. The result is sorted
/// chronologically and does not depend on the order of `records`.
pub fn calculate_services_by_month(records: &[ServiceRecord]) -> Vec<MonthlyBucket> {
    let mut buckets: BTreeMap<MonthKey, MonthlyBucket> = BTreeMap::new();

    for record in records {
        let Some(fecha) = record.fecha else {
            continue;
        };

        let key = MonthKey::from_date(fecha);
        let bucket = buckets
            .entry(key)
            .or_insert_with(|| MonthlyBucket::new(key));

        bucket.servicios += 1;
        bucket.ingresos += record.precio;

        if is_pending(record) {
            bucket.pendientes += 1;
        } else {
            bucket.completados += 1;
        }
    }

    buckets.into_values().collect()
}

/// Counts records whose date is missing or could not be parsed.
pub fn count_undated(records: &[ServiceRecord]) -> usize {
    records.iter().filter(|record| record.fecha.is_none()).count()
}

/// Classifies every record into exactly one [Category].
///
/// Only categories with at least one record are returned, largest first, ties
/// broken by the category order. Percentages are rounded individually so they
/// may not add up to exactly 100.
pub fn calculate_services_by_category(
    records: &[ServiceRecord],
    work_mode: WorkMode,
) -> Vec<CategoryBucket> {
    let mut totals: BTreeMap<Category, (usize, f64)> = BTreeMap::new();

    for record in records {
        let category = Category::classify(&work_mode.classification_text(record));
        let entry = totals.entry(category).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += record.precio;
    }

    let total = records.len();
    let mut buckets: Vec<CategoryBucket> = totals
        .into_iter()
        .map(|(categoria, (cantidad, ingresos))| CategoryBucket {
            categoria,
            cantidad,
            ingresos,
            porcentaje: percentage_of(cantidad, total),
        })
        .collect();

    buckets.sort_by(|a, b| {
        b.cantidad
            .cmp(&a.cantidad)
            .then_with(|| a.categoria.cmp(&b.categoria))
    });

    buckets
}

/// Classifies every record into one of the four [ServiceStatus] buckets.
///
/// All four buckets are always returned, in [ServiceStatus::ALL] order.
pub fn calculate_services_by_status(records: &[ServiceRecord]) -> Vec<StatusBucket> {
    let mut counts: BTreeMap<ServiceStatus, usize> = BTreeMap::new();

    for record in records {
        *counts.entry(ServiceStatus::classify(record)).or_insert(0) += 1;
    }

    ServiceStatus::ALL
        .iter()
        .map(|estado| {
            let cantidad = counts.get(estado).copied().unwrap_or(0);
            StatusBucket {
                estado: *estado,
                cantidad,
                porcentaje: percentage_of(cantidad, records.len()),
            }
        })
        .collect()
}

/// Computes the headline figures.
///
/// Pending and completed use the same binary rule as
/// [calculate_services_by_month], so the KPI cards always agree with the
/// monthly chart. The four-way split of [calculate_services_by_status] can
/// differ for quoted or cancelled rows.
pub fn calculate_kpis(records: &[ServiceRecord]) -> Kpis {
    let total_servicios = records.len();
    let ingresos_totales: f64 = records.iter().map(|record| record.precio).sum();
    let pendientes = records.iter().filter(|record| is_pending(record)).count();
    let completados = total_servicios - pendientes;

    let ingreso_promedio = if total_servicios == 0 {
        0.0
    } else {
        ingresos_totales / total_servicios as f64
    };

    Kpis {
        total_servicios,
        ingresos_totales,
        completados,
        pendientes,
        tasa_completado: percentage_of(completados, total_servicios),
        ingreso_promedio,
    }
}

/// Compares the last two months of `monthly`.
///
/// `monthly` is sorted before comparing, so callers may pass buckets in any
/// order. Growth is zero when the previous month's value is zero.
pub fn calculate_trends(monthly: &[MonthlyBucket]) -> Trends {
    let mut sorted: Vec<&MonthlyBucket> = monthly.iter().collect();
    sorted.sort_by_key(|bucket| bucket.mes);

    match sorted.as_slice() {
        [.., previous, current] => Trends {
            mes_actual: Some(current.mes),
            mes_anterior: Some(previous.mes),
            crecimiento_servicios: growth(current.servicios as f64, previous.servicios as f64),
            crecimiento_ingresos: growth(current.ingresos, previous.ingresos),
        },
        [only] => Trends {
            mes_actual: Some(only.mes),
            mes_anterior: None,
            crecimiento_servicios: 0.0,
            crecimiento_ingresos: 0.0,
        },
        [] => Trends {
            mes_actual: None,
            mes_anterior: None,
            crecimiento_servicios: 0.0,
            crecimiento_ingresos: 0.0,
        },
    }
}

fn growth(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }

    ((current - previous) / previous * 1000.0).round() / 10.0
}

/// Buckets the pending-payment detail rows by month.
///
/// When a row has neither an `efectivo` nor a `transferencia` column, its
/// price is assigned to one of the two by looking at the payment column.
/// A missing `total` column is the sum of both. Rows without a usable date are
/// left out.
pub fn summarize_pending_by_month(detalle: &[Row]) -> Vec<PendingMonthBucket> {
    let mut buckets: BTreeMap<MonthKey, PendingMonthBucket> = BTreeMap::new();

    for row in detalle {
        let Some(fecha) = resolve_field(row, FECHA_KEYS).and_then(value_as_date) else {
            continue;
        };

        let (efectivo, transferencia) = payment_split(row);
        let total = resolve_field(row, TOTAL_KEYS)
            .map(value_as_amount)
            .unwrap_or(efectivo + transferencia);

        let key = MonthKey::from_date(fecha);
        let bucket = buckets.entry(key).or_insert_with(|| PendingMonthBucket {
            mes: key,
            cantidad_general: 0,
            efectivo_total: 0.0,
            transferencia_total: 0.0,
            total_general: 0.0,
        });

        bucket.cantidad_general += 1;
        bucket.efectivo_total += efectivo;
        bucket.transferencia_total += transferencia;
        bucket.total_general += total;
    }

    buckets.into_values().collect()
}

fn payment_split(row: &Row) -> (f64, f64) {
    let efectivo = resolve_field(row, EFECTIVO_KEYS);
    let transferencia = resolve_field(row, TRANSFERENCIA_KEYS);

    if efectivo.is_some() || transferencia.is_some() {
        return (
            efectivo.map(value_as_amount).unwrap_or(0.0),
            transferencia.map(value_as_amount).unwrap_or(0.0),
        );
    }

    let amount = resolve_amount(row, PRECIO_KEYS);
    let method = resolve_text(row, PAGO_KEYS).to_lowercase();

    if method.contains("transfer") {
        (0.0, amount)
    } else {
        (amount, 0.0)
    }
}
