//! Builds the expense and consignment report.

use printpdf::image_crate::{DynamicImage, GenericImageView};
use time::{OffsetDateTime, macros::format_description};

use crate::{
    expenses::{
        ExpenseSummary, ExpenseWorkflow, ImageKind,
        models::{ConsignmentEntry, ExpenseEntry},
    },
    html::format_money,
    pdf::{
        PdfError,
        images::decode_data_uri,
        layout::{Align, Column, ImageSlot, LayoutOp, PageLayout, Table},
        render::render,
    },
};

const REPORT_TITLE: &str = "Reporte de Gastos";

/// Everything needed to build the report.
#[derive(Debug, Clone, Copy)]
pub struct ExpenseReportInput<'a> {
    pub workflow: &'a ExpenseWorkflow,
    /// Shown in the header bar, in the server's local time.
    pub generated_at: OffsetDateTime,
}

/// The laid-out report before rendering.
#[derive(Debug)]
pub struct ComposedReport {
    pub ops: Vec<LayoutOp>,
    pub images: Vec<DynamicImage>,
    pub skipped_images: usize,
    pub page_count: usize,
    pub summary: ExpenseSummary,
}

/// A rendered report.
#[derive(Debug)]
pub struct ExpensePdf {
    pub bytes: Vec<u8>,
    pub summary: ExpenseSummary,
    pub skipped_images: usize,
}

/// Lay out the expense report.
///
/// Images that fail to decode are logged and left out of the report.
///
/// # Errors
/// Returns a [PdfError::Table] if a table cannot be laid out.
pub fn compose_expense_report(input: ExpenseReportInput<'_>) -> Result<ComposedReport, PdfError> {
    let workflow = input.workflow;
    let summary = workflow.summary();
    let mut layout = PageLayout::new();

    let generated = input
        .generated_at
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_default();
    layout.header_bar(REPORT_TITLE, &format!("Generado el {generated}"));

    layout.heading("Gastos");
    if workflow.gastos.is_empty() {
        layout.note("Sin gastos registrados");
    } else {
        layout.table(&expense_table(&workflow.gastos, summary.total_gastos))?;
    }
    layout.gap();

    layout.heading("Balance");
    layout.table(&balance_table(&summary))?;
    layout.gap();

    layout.heading("Consignaciones");
    if workflow.consignaciones.is_empty() {
        layout.note("Sin consignaciones registradas");
    } else {
        layout.table(&consignment_table(
            &workflow.consignaciones,
            summary.total_consignado,
        ))?;
    }
    layout.gap();

    let mut images = Vec::new();
    let mut skipped_images = 0;

    for kind in ImageKind::ALL {
        let mut slots = Vec::new();

        for (position, data_uri) in workflow.imagenes.get(kind).iter().enumerate() {
            match decode_data_uri(data_uri) {
                Ok(image) => {
                    let (width_px, height_px) = image.dimensions();
                    slots.push(ImageSlot {
                        index: images.len(),
                        width_px,
                        height_px,
                    });
                    images.push(image);
                }
                Err(error) => {
                    tracing::warn!(
                        "Skipping image {} of section {}: {error}",
                        position + 1,
                        kind.as_str()
                    );
                    skipped_images += 1;
                }
            }
        }

        layout.image_section(kind.title(), &slots);
    }

    let page_count = layout.page_count();

    Ok(ComposedReport {
        ops: layout.into_ops(),
        images,
        skipped_images,
        page_count,
        summary,
    })
}

/// Lay out and render the expense report.
pub fn generate_expense_pdf(input: ExpenseReportInput<'_>) -> Result<ExpensePdf, PdfError> {
    let composed = compose_expense_report(input)?;
    tracing::debug!(
        "Rendering expense report with {} pages and {} images",
        composed.page_count,
        composed.images.len()
    );

    let bytes = render(REPORT_TITLE, &composed.ops, &composed.images)?;

    Ok(ExpensePdf {
        bytes,
        summary: composed.summary,
        skipped_images: composed.skipped_images,
    })
}

fn expense_table(gastos: &[ExpenseEntry], total: f64) -> Table {
    Table {
        columns: vec![
            Column::new("Fecha", 0.16, Align::Left),
            Column::new("Categoría", 0.2, Align::Left),
            Column::new("Descripción", 0.44, Align::Left),
            Column::new("Monto", 0.2, Align::Right),
        ],
        rows: gastos
            .iter()
            .map(|gasto| {
                vec![
                    gasto.fecha.clone(),
                    gasto.categoria.clone(),
                    gasto.descripcion.clone(),
                    format_money(gasto.monto),
                ]
            })
            .collect(),
        footer: Some(vec![
            String::new(),
            String::new(),
            "Total gastos".to_owned(),
            format_money(total),
        ]),
    }
}

fn balance_table(summary: &ExpenseSummary) -> Table {
    let row = |concepto: &str, valor: f64| vec![concepto.to_owned(), format_money(valor)];

    Table {
        columns: vec![
            Column::new("Concepto", 0.7, Align::Left),
            Column::new("Valor", 0.3, Align::Right),
        ],
        rows: vec![
            row("Total consignado", summary.total_consignado),
            row("Total gastos", summary.total_gastos),
            row(
                "Vueltas a favor de Abrecar",
                summary.vueltas_a_favor_de_abrecar,
            ),
            row("Excedente a favor de JG", summary.excedente_a_favor_de_jg),
        ],
        footer: None,
    }
}

fn consignment_table(consignaciones: &[ConsignmentEntry], total: f64) -> Table {
    Table {
        columns: vec![
            Column::new("Fecha", 0.16, Align::Left),
            Column::new("Entregado por", 0.24, Align::Left),
            Column::new("Descripción", 0.4, Align::Left),
            Column::new("Monto", 0.2, Align::Right),
        ],
        rows: consignaciones
            .iter()
            .map(|consignacion| {
                vec![
                    consignacion.fecha.clone(),
                    consignacion.entregado_por.clone(),
                    consignacion.descripcion.clone(),
                    format_money(consignacion.monto),
                ]
            })
            .collect(),
        footer: Some(vec![
            String::new(),
            String::new(),
            "Total consignado".to_owned(),
            format_money(total),
        ]),
    }
}
