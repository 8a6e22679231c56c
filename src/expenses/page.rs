//! Views for the expenses page.
//!
//! Every change on the page swaps the whole `#expenses-workspace` element, so
//! the tables, the running balance and the attachment lists never disagree.

use maud::{Markup, html};

use crate::{
    alert::Alert,
    endpoints::{self, format_endpoint},
    expenses::{
        calculator::ExpenseSummary,
        models::EXPENSE_CATEGORIES,
        workflow::{ExpenseWorkflow, ImageKind},
    },
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, CARD_STYLE,
        FORM_FILE_INPUT_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_money,
    },
    navigation::NavBar,
};

const WORKSPACE_ID: &str = "expenses-workspace";
const WORKSPACE_TARGET: &str = "#expenses-workspace";
const NUMBER_CELL_STYLE: &str = "px-6 py-4 text-right whitespace-nowrap";

/// The full expenses page. `alert` is shown above the workspace, which is how
/// a failed PDF download reports back since it is not an htmx request.
pub(super) fn expenses_view(workflow: &ExpenseWorkflow, alert: Option<Alert>) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl"
            {
                h1 class="text-2xl font-bold mb-2" { "Gastos y consignaciones" }
                p class="mb-6 text-gray-600 dark:text-gray-400"
                {
                    "Registre los gastos del técnico y el dinero consignado, adjunte los soportes y genere el reporte."
                }

                @if let Some(alert) = alert {
                    div id="inline-alert" { (alert.into_html()) }
                }

                (workspace_view(workflow))
            }
        }
    };

    base("Gastos", &[], &content)
}

/// The part of the page that changes as entries are added and removed.
pub(super) fn workspace_view(workflow: &ExpenseWorkflow) -> Markup {
    let summary = workflow.summary();

    html! {
        div id=(WORKSPACE_ID) class="w-full"
        {
            (balance_view(&summary))

            div class="grid grid-cols-1 xl:grid-cols-2 gap-8 mb-8"
            {
                section id="gastos"
                {
                    h2 class="text-xl font-semibold mb-4" { "Gastos" }
                    (expense_form_view())
                    (expense_table_view(workflow))
                }

                section id="consignaciones"
                {
                    h2 class="text-xl font-semibold mb-4" { "Consignaciones" }
                    (consignment_form_view())
                    (consignment_table_view(workflow))
                }
            }

            (images_view(workflow))
            (pdf_form_view(workflow))
        }
    }
}

fn balance_view(summary: &ExpenseSummary) -> Markup {
    let balance_card = |id: &str, title: &str, amount: f64| {
        html! {
            div id=(id) class=(CARD_STYLE)
            {
                h4 class="text-sm font-medium text-gray-600 dark:text-gray-400" { (title) }
                p class="text-2xl font-bold mt-2" data-value { (format_money(amount)) }
            }
        }
    };

    html! {
        section id="balance" class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-4 gap-4 mb-8"
        {
            (balance_card("total-consignado", "Total consignado", summary.total_consignado))
            (balance_card("total-gastos", "Total gastos", summary.total_gastos))
            (balance_card("vueltas-abrecar", "Vueltas a favor de Abrecar", summary.vueltas_a_favor_de_abrecar))
            (balance_card("excedente-jg", "Excedente a favor de JG", summary.excedente_a_favor_de_jg))
        }
    }
}

fn expense_form_view() -> Markup {
    html! {
        form
            id="expense-form"
            hx-post=(endpoints::EXPENSES_API)
            hx-target=(WORKSPACE_TARGET)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="grid grid-cols-1 sm:grid-cols-2 gap-4 mb-4"
        {
            div
            {
                label for="gasto-fecha" class=(FORM_LABEL_STYLE) { "Fecha" }
                input id="gasto-fecha" type="date" name="fecha" required class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="gasto-categoria" class=(FORM_LABEL_STYLE) { "Categoría" }
                select id="gasto-categoria" name="categoria" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for categoria in EXPENSE_CATEGORIES {
                        option value=(categoria) { (categoria) }
                    }
                }
            }

            div
            {
                label for="gasto-monto" class=(FORM_LABEL_STYLE) { "Monto" }
                input
                    id="gasto-monto"
                    type="number"
                    name="monto"
                    min="0"
                    step="1"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="gasto-descripcion" class=(FORM_LABEL_STYLE) { "Descripción" }
                input id="gasto-descripcion" type="text" name="descripcion" class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="sm:col-span-2"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Agregar gasto" }
            }
        }
    }
}

fn consignment_form_view() -> Markup {
    html! {
        form
            id="consignment-form"
            hx-post=(endpoints::CONSIGNMENTS_API)
            hx-target=(WORKSPACE_TARGET)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="grid grid-cols-1 sm:grid-cols-2 gap-4 mb-4"
        {
            div
            {
                label for="consignacion-fecha" class=(FORM_LABEL_STYLE) { "Fecha" }
                input id="consignacion-fecha" type="date" name="fecha" required class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="consignacion-entregado-por" class=(FORM_LABEL_STYLE) { "Entregado por" }
                input
                    id="consignacion-entregado-por"
                    type="text"
                    name="entregado_por"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="consignacion-monto" class=(FORM_LABEL_STYLE) { "Monto" }
                input
                    id="consignacion-monto"
                    type="number"
                    name="monto"
                    min="0"
                    step="1"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="consignacion-descripcion" class=(FORM_LABEL_STYLE) { "Descripción" }
                input id="consignacion-descripcion" type="text" name="descripcion" class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="sm:col-span-2"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Agregar consignación" }
            }
        }
    }
}

fn delete_button(url: &str, confirm: &str) -> Markup {
    html! {
        button
            type="button"
            hx-delete=(url)
            hx-confirm=(confirm)
            hx-target=(WORKSPACE_TARGET)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class=(BUTTON_DELETE_STYLE)
        {
            "Eliminar"
        }
    }
}

fn expense_table_view(workflow: &ExpenseWorkflow) -> Markup {
    if workflow.gastos.is_empty() {
        return html! {
            p class="text-sm text-gray-600 dark:text-gray-400" { "No hay gastos registrados." }
        };
    }

    html! {
        div class="overflow-x-auto rounded-lg shadow"
        {
            table id="expense-table" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Fecha" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Categoría" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Descripción" }
                        th scope="col" class=(NUMBER_CELL_STYLE) { "Monto" }
                        th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Acciones" } }
                    }
                }

                tbody
                {
                    @for (index, gasto) in workflow.gastos.iter().enumerate() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (gasto.fecha) }
                            td class=(TABLE_CELL_STYLE) { (gasto.categoria) }
                            td class=(TABLE_CELL_STYLE) { (gasto.descripcion) }
                            td class=(NUMBER_CELL_STYLE) { (format_money(gasto.monto)) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                (delete_button(
                                    &format_endpoint(endpoints::DELETE_EXPENSE, &[&index.to_string()]),
                                    "¿Eliminar este gasto?",
                                ))
                            }
                        }
                    }
                }
            }
        }
    }
}

fn consignment_table_view(workflow: &ExpenseWorkflow) -> Markup {
    if workflow.consignaciones.is_empty() {
        return html! {
            p class="text-sm text-gray-600 dark:text-gray-400" { "No hay consignaciones registradas." }
        };
    }

    html! {
        div class="overflow-x-auto rounded-lg shadow"
        {
            table id="consignment-table" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Fecha" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Entregado por" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Descripción" }
                        th scope="col" class=(NUMBER_CELL_STYLE) { "Monto" }
                        th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Acciones" } }
                    }
                }

                tbody
                {
                    @for (index, consignacion) in workflow.consignaciones.iter().enumerate() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (consignacion.fecha) }
                            td class=(TABLE_CELL_STYLE) { (consignacion.entregado_por) }
                            td class=(TABLE_CELL_STYLE) { (consignacion.descripcion) }
                            td class=(NUMBER_CELL_STYLE) { (format_money(consignacion.monto)) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                (delete_button(
                                    &format_endpoint(endpoints::DELETE_CONSIGNMENT, &[&index.to_string()]),
                                    "¿Eliminar esta consignación?",
                                ))
                            }
                        }
                    }
                }
            }
        }
    }
}

fn images_view(workflow: &ExpenseWorkflow) -> Markup {
    html! {
        section id="soportes" class="mb-8"
        {
            h2 class="text-xl font-semibold mb-4" { "Soportes" }

            form
                id="image-form"
                hx-post=(endpoints::SUPPORT_IMAGES)
                hx-encoding="multipart/form-data"
                hx-target=(WORKSPACE_TARGET)
                hx-swap="outerHTML"
                hx-target-error="#alert-container"
                class="grid grid-cols-1 sm:grid-cols-3 gap-4 mb-4 items-end"
            {
                div
                {
                    label for="soporte-tipo" class=(FORM_LABEL_STYLE) { "Sección" }
                    select id="soporte-tipo" name="tipo" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for kind in ImageKind::ALL {
                            option value=(kind.as_str()) { (kind.title()) }
                        }
                    }
                }

                div
                {
                    label for="soporte-imagenes" class=(FORM_LABEL_STYLE) { "Imágenes" }
                    input
                        id="soporte-imagenes"
                        type="file"
                        name="imagenes"
                        accept="image/*"
                        multiple
                        required
                        class=(FORM_FILE_INPUT_STYLE);
                }

                div
                {
                    button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Adjuntar" }
                }
            }

            div class="grid grid-cols-1 md:grid-cols-3 gap-4"
            {
                @for kind in ImageKind::ALL {
                    (image_kind_view(workflow, kind))
                }
            }
        }
    }
}

fn image_kind_view(workflow: &ExpenseWorkflow, kind: ImageKind) -> Markup {
    let images = workflow.imagenes.get(kind);

    html! {
        div id={ "soportes-" (kind.as_str()) } class=(CARD_STYLE)
        {
            h3 class="font-semibold mb-2" { (kind.title()) " (" (images.len()) ")" }

            @if images.is_empty() {
                p class="text-sm text-gray-600 dark:text-gray-400" { "Sin imágenes." }
            } @else {
                ul class="grid grid-cols-2 gap-2"
                {
                    @for (index, data_uri) in images.iter().enumerate() {
                        li class="flex flex-col items-center gap-1"
                        {
                            img
                                src=(data_uri)
                                alt={ (kind.title()) " " (index + 1) }
                                class="h-24 w-full object-contain rounded border border-gray-200 dark:border-gray-700";
                            (delete_button(
                                &format_endpoint(
                                    endpoints::DELETE_SUPPORT_IMAGE,
                                    &[kind.as_str(), &index.to_string()],
                                ),
                                "¿Eliminar esta imagen?",
                            ))
                        }
                    }
                }
            }
        }
    }
}

/// A plain form post so the browser handles the file download.
fn pdf_form_view(workflow: &ExpenseWorkflow) -> Markup {
    let disabled = workflow.is_empty();

    html! {
        section id="reporte" class="mb-8"
        {
            h2 class="text-xl font-semibold mb-4" { "Reporte" }

            form
                id="pdf-form"
                action=(endpoints::EXPENSES_PDF)
                method="post"
                class="grid grid-cols-1 sm:grid-cols-3 gap-4 items-end"
            {
                div
                {
                    label for="nombre_pdf" class=(FORM_LABEL_STYLE) { "Nombre del PDF" }
                    input
                        id="nombre_pdf"
                        type="text"
                        name="nombre_pdf"
                        placeholder="Reporte_Gastos_AAAA-MM-DD_HH-MM-SS.pdf"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="origen" class=(FORM_LABEL_STYLE) { "Generar en" }
                    select id="origen" name="origen" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="local" selected { "Este servidor" }
                        option value="servidor" { "Servidor de reportes" }
                    }
                }

                div
                {
                    button
                        type="submit"
                        id="pdf-button"
                        disabled[disabled]
                        class=(BUTTON_PRIMARY_STYLE)
                    {
                        "Descargar PDF"
                    }
                }
            }

            form
                hx-post=(endpoints::CLEAR_EXPENSES)
                hx-confirm="¿Descartar todos los gastos, consignaciones e imágenes?"
                hx-target=(WORKSPACE_TARGET)
                hx-swap="outerHTML"
                class="mt-4"
            {
                button
                    type="submit"
                    id="clear-button"
                    disabled[disabled]
                    class=(BUTTON_SECONDARY_STYLE)
                {
                    "Limpiar todo"
                }
            }
        }
    }
}
