//! Table views for the analytics results.

use maud::{Markup, html};
use serde_json::{Map, Value};

use crate::{
    analytics::aggregation::{CategoryBucket, MonthlyBucket, PendingMonthBucket},
    html::{
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_money, format_money_or_zero,
    },
    records::{CLIENTE_KEYS, Row, resolve_field, resolve_text, value_as_amount},
};

const NUMBER_CELL_STYLE: &str = "px-6 py-4 text-right whitespace-nowrap";
const TOTAL_ROW_STYLE: &str = "font-semibold text-gray-900 bg-gray-50 dark:text-white dark:bg-gray-700";

const CLIENT_COUNT_KEYS: &[&str] = &["cantidad", "servicios", "total_servicios", "count"];
const CLIENT_AMOUNT_KEYS: &[&str] = &["total", "ingresos", "valor", "monto", "total_facturado"];

/// Summary keys whose values are amounts of money rather than counts.
const MONEY_KEY_HINTS: [&str; 5] = ["total", "valor", "monto", "efectivo", "transferencia"];

fn table_section(id: &str, title: &str, table: Markup) -> Markup {
    html! {
        section id=(id) class="w-full mx-auto mb-8"
        {
            h3 class="text-xl font-semibold mb-4" { (title) }

            div class="overflow-x-auto rounded-lg shadow"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    (table)
                }
            }
        }
    }
}

pub(super) fn category_table(categories: &[CategoryBucket]) -> Markup {
    if categories.is_empty() {
        return html! {};
    }

    table_section(
        "category-table",
        "Servicios por categoría",
        html! {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Categoría" }
                    th scope="col" class=(NUMBER_CELL_STYLE) { "Cantidad" }
                    th scope="col" class=(NUMBER_CELL_STYLE) { "Ingresos" }
                    th scope="col" class=(NUMBER_CELL_STYLE) { "Porcentaje" }
                }
            }

            tbody
            {
                @for bucket in categories {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        th scope="row" class=(TABLE_CELL_STYLE) { (bucket.categoria.label()) }
                        td class=(NUMBER_CELL_STYLE) { (bucket.cantidad) }
                        td class=(NUMBER_CELL_STYLE) { (format_money(bucket.ingresos)) }
                        td class=(NUMBER_CELL_STYLE) { (bucket.porcentaje) "%" }
                    }
                }
            }
        },
    )
}

pub(super) fn monthly_table(monthly: &[MonthlyBucket]) -> Markup {
    if monthly.is_empty() {
        return html! {};
    }

    let servicios: usize = monthly.iter().map(|bucket| bucket.servicios).sum();
    let ingresos: f64 = monthly.iter().map(|bucket| bucket.ingresos).sum();
    let completados: usize = monthly.iter().map(|bucket| bucket.completados).sum();
    let pendientes: usize = monthly.iter().map(|bucket| bucket.pendientes).sum();

    table_section(
        "monthly-table",
        "Resumen mensual",
        html! {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Mes" }
                    th scope="col" class=(NUMBER_CELL_STYLE) { "Servicios" }
                    th scope="col" class=(NUMBER_CELL_STYLE) { "Completados" }
                    th scope="col" class=(NUMBER_CELL_STYLE) { "Pendientes" }
                    th scope="col" class=(NUMBER_CELL_STYLE) { "Ingresos" }
                }
            }

            tbody
            {
                @for bucket in monthly {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        th scope="row" class=(TABLE_CELL_STYLE) { (bucket.mes.long_label()) }
                        td class=(NUMBER_CELL_STYLE) { (bucket.servicios) }
                        td class=(NUMBER_CELL_STYLE) { (bucket.completados) }
                        td class=(NUMBER_CELL_STYLE) { (bucket.pendientes) }
                        td class=(NUMBER_CELL_STYLE) { (format_money(bucket.ingresos)) }
                    }
                }

                tr class=(TOTAL_ROW_STYLE)
                {
                    th scope="row" class=(TABLE_CELL_STYLE) { "Total" }
                    td class=(NUMBER_CELL_STYLE) { (servicios) }
                    td class=(NUMBER_CELL_STYLE) { (completados) }
                    td class=(NUMBER_CELL_STYLE) { (pendientes) }
                    td class=(NUMBER_CELL_STYLE) { (format_money(ingresos)) }
                }
            }
        },
    )
}

/// Clients with more than one service, as reported by the backend.
pub(super) fn recurring_clients_table(clients: &[Row]) -> Markup {
    if clients.is_empty() {
        return html! {};
    }

    table_section(
        "recurring-clients-table",
        "Clientes recurrentes",
        html! {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Cliente" }
                    th scope="col" class=(NUMBER_CELL_STYLE) { "Servicios" }
                    th scope="col" class=(NUMBER_CELL_STYLE) { "Total" }
                }
            }

            tbody
            {
                @for client in clients {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        th scope="row" class=(TABLE_CELL_STYLE) { (resolve_text(client, CLIENTE_KEYS)) }
                        td class=(NUMBER_CELL_STYLE)
                        {
                            (resolve_field(client, CLIENT_COUNT_KEYS).map(value_as_amount).unwrap_or(0.0))
                        }
                        td class=(NUMBER_CELL_STYLE)
                        {
                            (format_money_or_zero(resolve_field(client, CLIENT_AMOUNT_KEYS).map(value_as_amount)))
                        }
                    }
                }
            }
        },
    )
}

/// One pending-payment summary: the backend's `resumen` figures followed by
/// the detail rows bucketed by month.
pub(super) fn pending_summary_table(
    id: &str,
    title: &str,
    resumen: &Map<String, Value>,
    buckets: &[PendingMonthBucket],
) -> Markup {
    html! {
        section id=(id) class="w-full mx-auto mb-8"
        {
            h3 class="text-xl font-semibold mb-4" { (title) }

            @if !resumen.is_empty() {
                dl class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-4 gap-4 mb-4"
                {
                    @for (key, value) in resumen {
                        div
                        {
                            dt class="text-sm text-gray-600 dark:text-gray-400" { (summary_label(key)) }
                            dd class="text-lg font-semibold" { (summary_value(key, value)) }
                        }
                    }
                }
            }

            @if buckets.is_empty() {
                p class="text-sm text-gray-600 dark:text-gray-400" { "Sin pagos pendientes." }
            } @else {
                div class="overflow-x-auto rounded-lg shadow"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Mes" }
                                th scope="col" class=(NUMBER_CELL_STYLE) { "Cantidad" }
                                th scope="col" class=(NUMBER_CELL_STYLE) { "Efectivo" }
                                th scope="col" class=(NUMBER_CELL_STYLE) { "Transferencia" }
                                th scope="col" class=(NUMBER_CELL_STYLE) { "Total" }
                            }
                        }

                        tbody
                        {
                            @for bucket in buckets {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    th scope="row" class=(TABLE_CELL_STYLE) { (bucket.mes.iso()) }
                                    td class=(NUMBER_CELL_STYLE) { (bucket.cantidad_general) }
                                    td class=(NUMBER_CELL_STYLE) { (format_money(bucket.efectivo_total)) }
                                    td class=(NUMBER_CELL_STYLE) { (format_money(bucket.transferencia_total)) }
                                    td class=(NUMBER_CELL_STYLE) { (format_money(bucket.total_general)) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// "total_efectivo" becomes "Total efectivo".
fn summary_label(key: &str) -> String {
    let text = key.replace('_', " ");
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn summary_value(key: &str, value: &Value) -> String {
    match value {
        Value::Number(_) | Value::String(_) => {
            let key = key.to_lowercase();
            if MONEY_KEY_HINTS.iter().any(|hint| key.contains(hint)) {
                format_money(value_as_amount(value))
            } else {
                match value {
                    Value::String(text) => text.clone(),
                    _ => format!("{}", value_as_amount(value)),
                }
            }
        }
        Value::Bool(true) => "Sí".to_owned(),
        Value::Bool(false) => "No".to_owned(),
        Value::Null => "-".to_owned(),
        other => other.to_string(),
    }
}
