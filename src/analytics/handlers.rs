//! The analytics page: an upload form whose results fragment holds the KPI
//! cards, charts and tables.

use axum::{
    extract::{FromRef, Multipart, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use maud::{Markup, html};
use serde_json::{Map, Value};
use time::{Date, macros::format_description};

use crate::{
    AppState, Error,
    analytics::{
        aggregation::{
            WorkMode, calculate_kpis, calculate_services_by_category,
            calculate_services_by_month, calculate_services_by_status, calculate_trends,
            count_undated, summarize_pending_by_month,
        },
        cards::{backend_totals_view, kpi_cards_view, trend_cards_view},
        charts::{
            AnalyticsChart, backend_states_chart, category_chart, charts_view,
            pending_by_month_chart, revenue_by_month_chart, services_by_month_chart,
            special_states_chart, status_chart,
        },
        tables::{category_table, monthly_table, pending_summary_table, recurring_clients_table},
    },
    backend::{AnalyticsSummary, BackendClient, BackendError, PendingAnalytics},
    endpoints,
    html::{
        FORM_FILE_INPUT_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement,
        PAGE_CONTAINER_STYLE, base, submit_button,
    },
    navigation::NavBar,
    records::{Row, normalize_rows, value_as_amount},
    report::{ReportForm, ReportFormEvent, ReportRequest},
    requests::{LatestRequests, RequestKind},
    session::{SessionId, get_or_create_session},
    timezone::local_now,
    upload::{next_field, read_file_field, read_text_field},
};

/// The start of the range when the user leaves "Desde" empty.
const DEFAULT_START_DATE: &str = "2000-01-01";

/// The state needed by the analytics page.
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    pub backend: BackendClient,
    pub latest_requests: LatestRequests,
    /// The local timezone as a canonical timezone name, e.g. "America/Bogota".
    pub local_timezone: String,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            backend: state.backend.clone(),
            latest_requests: state.latest_requests.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

pub async fn get_analytics_page() -> Response {
    analytics_view().into_response()
}

fn analytics_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::ANALYTICS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl"
            {
                h1 class="text-2xl font-bold mb-2" { "Analíticas" }
                p class="mb-6 text-gray-600 dark:text-gray-400"
                {
                    "Indicadores, gráficos y tablas calculados a partir del archivo de servicios."
                }

                (upload_form_view())
            }

            div id="analytics-results" class="w-full max-w-screen-xl mt-8" {}
        }
    };

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        HeadElement::ScriptLink("/static/echarts-gl.2.0.9.min.js".to_owned()),
    ];

    base("Analíticas", &scripts, &content)
}

fn upload_form_view() -> Markup {
    html! {
        form
            hx-post=(endpoints::ANALYTICS_API)
            hx-encoding="multipart/form-data"
            hx-target="#analytics-results"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
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

            div class="grid grid-cols-1 sm:grid-cols-3 gap-4"
            {
                div
                {
                    label for="fecha_inicio" class=(FORM_LABEL_STYLE) { "Desde" }
                    input id="fecha_inicio" type="date" name="fecha_inicio" class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="fecha_fin" class=(FORM_LABEL_STYLE) { "Hasta" }
                    input id="fecha_fin" type="date" name="fecha_fin" class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="modo" class=(FORM_LABEL_STYLE) { "Clasificación" }
                    select id="modo" name="modo" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="servicios" selected { "Por servicio" }
                        option value="detallado" { "Servicio y descripción" }
                    }
                }
            }

            (submit_button("submit-button", "Analizar"))
        }
    }
}

/// What the user sent with the analytics form.
struct AnalyticsForm {
    request: ReportRequest,
    work_mode: WorkMode,
}

/// Everything fetched from the backend for one analytics run.
#[derive(Debug)]
struct AnalyticsData {
    rows: Vec<Row>,
    summary: AnalyticsSummary,
    efectivo: Option<PendingAnalytics>,
    cobrar: Option<PendingAnalytics>,
}

pub async fn post_analytics(
    State(state): State<AnalyticsState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let (jar, session_id) = get_or_create_session(jar);

    match run_analytics(&state, session_id, &mut multipart).await {
        Ok(markup) => (jar, markup).into_response(),
        Err(error) => (jar, error.into_alert_response()).into_response(),
    }
}

async fn run_analytics(
    state: &AnalyticsState,
    session_id: SessionId,
    multipart: &mut Multipart,
) -> Result<Markup, Error> {
    let AnalyticsForm { request, work_mode } = read_analytics_form(state, multipart).await?;
    let backend = state.backend.clone();

    let data = state
        .latest_requests
        .run(session_id, RequestKind::Analytics, async move {
            fetch_analytics(&backend, &request).await
        })
        .await??;

    tracing::info!(
        "analyzing {} rows in {:?} mode",
        data.rows.len(),
        work_mode
    );

    Ok(results_view(&data, work_mode))
}

/// Read the form into a [ReportRequest] covering the chosen range.
///
/// Empty dates widen the range: from [DEFAULT_START_DATE] and up to today.
async fn read_analytics_form(
    state: &AnalyticsState,
    multipart: &mut Multipart,
) -> Result<AnalyticsForm, Error> {
    let mut form = ReportForm::new();
    let mut fecha_inicio = String::new();
    let mut fecha_fin = String::new();
    let mut work_mode = WorkMode::default();

    while let Some(field) = next_field(multipart).await? {
        let name = field.name().unwrap_or_default().to_owned();

        match name.as_str() {
            "file" => {
                form.apply(ReportFormEvent::FileSelected(read_file_field(field).await?))?;
            }
            "fecha_inicio" => fecha_inicio = read_text_field(field).await?,
            "fecha_fin" => fecha_fin = read_text_field(field).await?,
            "modo" => work_mode = parse_work_mode(&read_text_field(field).await?),
            other => tracing::debug!("ignoring unknown analytics form field {other:?}"),
        }
    }

    let today = local_now(&state.local_timezone)?.date();

    if fecha_inicio.trim().is_empty() {
        fecha_inicio = DEFAULT_START_DATE.to_owned();
    }
    if fecha_fin.trim().is_empty() {
        fecha_fin = format_date(today);
    }

    form.apply(ReportFormEvent::StartDateChosen(fecha_inicio))?;
    form.apply(ReportFormEvent::EndDateChosen(fecha_fin))?;

    // Nothing is downloaded, so the filename is never used.
    let request = form.submit(String::new())?;

    Ok(AnalyticsForm { request, work_mode })
}

fn parse_work_mode(text: &str) -> WorkMode {
    match text.trim() {
        "detallado" => WorkMode::Detallado,
        _ => WorkMode::Servicios,
    }
}

fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| DEFAULT_START_DATE.to_owned())
}

/// The rows and the backend summary are required. The pending-payment
/// summaries are optional extras; when one fails the page renders without it.
async fn fetch_analytics(
    backend: &BackendClient,
    request: &ReportRequest,
) -> Result<AnalyticsData, BackendError> {
    let (rows, summary, efectivo, cobrar) = tokio::join!(
        backend.procesar_excel(request),
        backend.analytics(&request.file),
        backend.pendientes_efectivo(&request.file),
        backend.pendientes_cobrar(&request.file),
    );

    Ok(AnalyticsData {
        rows: rows?,
        summary: summary?,
        efectivo: efectivo
            .inspect_err(|error| tracing::warn!("could not fetch pending cash summary: {error}"))
            .ok(),
        cobrar: cobrar
            .inspect_err(|error| {
                tracing::warn!("could not fetch pending receivables summary: {error}")
            })
            .ok(),
    })
}

fn results_view(data: &AnalyticsData, work_mode: WorkMode) -> Markup {
    let records = normalize_rows(&data.rows);

    if records.is_empty() {
        return html! {
            p id="analytics-empty" class="text-center"
            {
                "No hay servicios en el rango seleccionado."
            }
        };
    }

    let monthly = calculate_services_by_month(&records);
    let categories = calculate_services_by_category(&records, work_mode);
    let statuses = calculate_services_by_status(&records);
    let kpis = calculate_kpis(&records);
    let trends = calculate_trends(&monthly);

    let estado_counts = data.summary.estado_counts();
    let special_by_month = data.summary.special_states_by_month();

    let efectivo_buckets = data
        .efectivo
        .as_ref()
        .map(|pending| summarize_pending_by_month(&pending.detalle))
        .unwrap_or_default();
    let cobrar_buckets = data
        .cobrar
        .as_ref()
        .map(|pending| summarize_pending_by_month(&pending.detalle))
        .unwrap_or_default();

    let mut charts = vec![
        AnalyticsChart::new("servicios-mes-chart", services_by_month_chart(&monthly)),
        AnalyticsChart::new("ingresos-mes-chart", revenue_by_month_chart(&monthly)),
        AnalyticsChart::new("categorias-chart", category_chart(&categories)),
        AnalyticsChart::new("estados-chart", status_chart(&statuses)),
    ];

    if !estado_counts.is_empty() {
        charts.push(AnalyticsChart::new(
            "estados-backend-chart",
            backend_states_chart(&estado_counts),
        ));
    }
    if !special_by_month.is_empty() {
        charts.push(AnalyticsChart::new(
            "estados-especiales-chart",
            special_states_chart(&special_by_month),
        ));
    }
    if !efectivo_buckets.is_empty() {
        charts.push(AnalyticsChart::new(
            "pendientes-efectivo-chart",
            pending_by_month_chart("Pendientes en efectivo", &efectivo_buckets),
        ));
    }
    if !cobrar_buckets.is_empty() {
        charts.push(AnalyticsChart::new(
            "pendientes-cobrar-chart",
            pending_by_month_chart("Pendientes por cobrar", &cobrar_buckets),
        ));
    }

    let especiales = special_state_totals(&data.summary.totales_estados_especiales);
    let empty = Map::new();

    html! {
        (kpi_cards_view(&kpis, count_undated(&records)))
        (trend_cards_view(&trends))
        (backend_totals_view(
            data.summary.pendientes_relacionar(),
            data.summary.pendientes_cobrar(),
            &especiales,
        ))
        (charts_view(&charts))
        (category_table(&categories))
        (monthly_table(&monthly))
        (recurring_clients_table(&data.summary.clientes_recurrentes))

        @if let Some(efectivo) = &data.efectivo {
            (pending_summary_table("pendientes-efectivo", "Pendientes en efectivo", &efectivo.resumen, &efectivo_buckets))
        }
        @if let Some(cobrar) = &data.cobrar {
            (pending_summary_table("pendientes-cobrar", "Pendientes por cobrar", &cobrar.resumen, &cobrar_buckets))
        }
        @if data.efectivo.is_none() && data.cobrar.is_none() {
            (pending_summary_table("pendientes-sin-datos", "Pagos pendientes", &empty, &[]))
        }
    }
}

fn special_state_totals(totals: &Map<String, Value>) -> Vec<(String, f64)> {
    totals
        .iter()
        .map(|(estado, value)| (estado.clone(), value_as_amount(value)))
        .collect()
}
