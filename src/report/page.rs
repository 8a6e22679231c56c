//! Views for the report pages.

use maud::{Markup, html};

use crate::{
    alert::Alert,
    html::{
        BUTTON_SECONDARY_STYLE, FORM_FILE_INPUT_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_money, loading_spinner,
    },
    navigation::NavBar,
    records::ServiceRecord,
    report::form::ReportKind,
};

const DATE_DISPLAY_FORMAT: &[time::format_description::BorrowedFormatItem] =
    time::macros::format_description!("[day]/[month]/[year]");

/// The full report page. `alert` is shown inline above the form, which is
/// how a failed PDF download reports back since it is not an htmx request.
pub(super) fn report_view(kind: ReportKind, alert: Option<Alert>) -> Markup {
    let nav_bar = NavBar::new(kind.view_endpoint()).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl"
            {
                h1 class="text-2xl font-bold mb-2" { (kind.title()) }
                p class="mb-6 text-gray-600 dark:text-gray-400" { (kind.description()) }

                @if let Some(alert) = alert {
                    div id="inline-alert" { (alert.into_html()) }
                }

                (report_form_view(kind))
            }

            div id="preview" class="w-full max-w-screen-xl mt-8" {}
        }
    };

    base(kind.title(), &[], &content)
}

fn report_form_view(kind: ReportKind) -> Markup {
    html! {
        form
            action=(kind.pdf_endpoint())
            method="post"
            enctype="multipart/form-data"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label for="file" class=(FORM_LABEL_STYLE) { "Archivo Excel" }
                input
                    id="file"
                    type="file"
                    name="file"
                    accept=".xlsx,.xls"
                    required
                    class=(FORM_FILE_INPUT_STYLE);
            }

            div class="grid grid-cols-1 sm:grid-cols-2 gap-4"
            {
                div
                {
                    label for="fecha_inicio" class=(FORM_LABEL_STYLE) { "Fecha de inicio" }
                    input
                        id="fecha_inicio"
                        type="date"
                        name="fecha_inicio"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="fecha_fin" class=(FORM_LABEL_STYLE) { "Fecha de fin" }
                    input
                        id="fecha_fin"
                        type="date"
                        name="fecha_fin"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            div
            {
                label for="notas" class=(FORM_LABEL_STYLE) { "Notas" }
                textarea
                    id="notas"
                    name="notas"
                    rows="3"
                    placeholder="Observaciones que aparecerán en el reporte"
                    class=(FORM_TEXT_INPUT_STYLE)
                {}
            }

            div
            {
                label for="imagenes" class=(FORM_LABEL_STYLE) { "Imágenes de soporte" }
                input
                    id="imagenes"
                    type="file"
                    name="imagenes"
                    accept="image/*"
                    multiple
                    class=(FORM_FILE_INPUT_STYLE);
            }

            div
            {
                label for="nombre_pdf" class=(FORM_LABEL_STYLE) { "Nombre del PDF" }
                input
                    id="nombre_pdf"
                    type="text"
                    name="nombre_pdf"
                    placeholder={ (kind.filename_prefix()) "_AAAA-MM-DD_HH-MM-SS.pdf" }
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="grid grid-cols-1 sm:grid-cols-2 gap-4"
            {
                button
                    type="button"
                    id="preview-button"
                    hx-post=(kind.preview_endpoint())
                    hx-encoding="multipart/form-data"
                    hx-target="#preview"
                    hx-target-error="#alert-container"
                    hx-indicator="#indicator"
                    hx-disabled-elt="this"
                    class=(BUTTON_SECONDARY_STYLE)
                {
                    span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                    " Vista previa"
                }

                button
                    type="submit"
                    id="submit-button"
                    class=(BUTTON_SECONDARY_STYLE)
                {
                    "Descargar PDF"
                }
            }
        }
    }
}

/// The rows returned by the backend for the chosen range.
pub(super) fn preview_view(kind: ReportKind, records: &[ServiceRecord]) -> Markup {
    let total: f64 = records.iter().map(|record| record.precio).sum();

    html! {
        section
        {
            div class="flex justify-between items-baseline mb-4"
            {
                h2 class="text-xl font-semibold" { (kind.title()) }
                span id="preview-summary" class="text-sm text-gray-600 dark:text-gray-400"
                {
                    (records.len()) " servicios · " (format_money(total))
                }
            }

            @if records.is_empty() {
                p class="text-center" { "No hay servicios en el rango seleccionado." }
            } @else {
                div class="overflow-x-auto rounded-lg shadow"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Fecha" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Cliente" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Servicio" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Estado" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Pago" }
                                th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Valor" }
                            }
                        }

                        tbody
                        {
                            @for record in records {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (display_date(record)) }
                                    td class=(TABLE_CELL_STYLE) { (record.cliente) }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        @if record.servicio.is_empty() {
                                            (record.descripcion)
                                        } @else {
                                            (record.servicio)
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE) { (record.estado) }
                                    td class=(TABLE_CELL_STYLE) { (record.pago) }
                                    td class={ (TABLE_CELL_STYLE) " text-right whitespace-nowrap" }
                                    {
                                        (format_money(record.precio))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn display_date(record: &ServiceRecord) -> String {
    record
        .fecha
        .and_then(|date| date.format(DATE_DISPLAY_FORMAT).ok())
        .unwrap_or_else(|| "Sin fecha".to_owned())
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};
    use serde_json::json;

    use crate::{
        alert::Alert,
        endpoints,
        records::normalize_rows,
        report::form::ReportKind,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form,
        },
    };

    use super::{preview_view, report_view};

    #[test]
    fn report_form_posts_pdf_and_previews_with_htmx() {
        let html = Html::parse_document(
            &report_view(ReportKind::RelacionServicios, None).into_string(),
        );
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_eq!(form.value().attr("action"), Some(endpoints::RELACION_PDF));
        assert_eq!(form.value().attr("enctype"), Some("multipart/form-data"));
        assert_form_input(&form, "file", "file");
        assert_form_input(&form, "fecha_inicio", "date");
        assert_form_input(&form, "fecha_fin", "date");

        let preview_button = form
            .select(&Selector::parse("#preview-button").unwrap())
            .next()
            .expect("preview button missing");
        assert_hx_endpoint(&preview_button, endpoints::RELACION_PREVIEW, "hx-post");
        assert_form_submit_button(&form);
    }

    #[test]
    fn pendientes_page_uses_its_endpoints() {
        let html = Html::parse_document(&report_view(ReportKind::Pendientes, None).into_string());
        let form = must_get_form(&html);

        assert_eq!(form.value().attr("action"), Some(endpoints::PENDIENTES_PDF));
    }

    #[test]
    fn shows_inline_alert() {
        let alert = Alert::ErrorSimple {
            message: "fecha inválida".to_owned(),
        };
        let html = Html::parse_document(
            &report_view(ReportKind::RelacionServicios, Some(alert)).into_string(),
        );

        let text = html
            .select(&Selector::parse("#inline-alert").unwrap())
            .next()
            .expect("inline alert missing")
            .text()
            .collect::<String>();
        assert!(text.contains("fecha inválida"));
    }

    #[test]
    fn preview_lists_rows_and_total() {
        let rows = json!([
            {"fecha": "2024-01-05", "cliente": "Edificio Sol", "servicio": "Mantenimiento", "precio": 100000, "estado": "pendiente"},
            {"Fecha": "20/01/2024", "Cliente": "Casa Luna", "Precio": "50000", "Estado": "completado"}
        ]);
        let rows: Vec<_> = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row.as_object().unwrap().clone())
            .collect();
        let records = normalize_rows(&rows);

        let html = Html::parse_fragment(
            &preview_view(ReportKind::RelacionServicios, &records).into_string(),
        );

        let body_rows = html.select(&Selector::parse("tbody tr").unwrap()).count();
        assert_eq!(body_rows, 2);
        let summary = html
            .select(&Selector::parse("#preview-summary").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert!(summary.contains("2 servicios"));
        assert!(summary.contains("$ 150.000"));
    }

    #[test]
    fn empty_preview_shows_message() {
        let html = Html::parse_fragment(&preview_view(ReportKind::Pendientes, &[]).into_string());

        assert!(
            html.root_element()
                .text()
                .collect::<String>()
                .contains("No hay servicios")
        );
    }
}
