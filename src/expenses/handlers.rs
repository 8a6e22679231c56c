//! Route handlers for the expenses page.

use axum::{
    Form,
    extract::{FromRef, Multipart, Path, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use axum_htmx::HxRequest;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    backend::{BackendClient, ExpensePdfRequest},
    download::pdf_attachment,
    endpoints,
    expenses::{
        models::{ConsignmentForm, ExpenseForm},
        page::{expenses_view, workspace_view},
        workflow::{ExpenseEvent, ExpenseWorkflow, ImageKind},
    },
    pdf::{ExpenseReportInput, generate_expense_pdf},
    report::{default_filename, normalize_filename},
    requests::{LatestRequests, RequestKind},
    session::{SessionId, SessionStore, get_or_create_session},
    timezone::local_now,
    upload::{next_field, read_image_field, read_text_field},
};

const FILENAME_PREFIX: &str = "Reporte_Gastos";

/// The state needed by the expenses page.
#[derive(Debug, Clone)]
pub struct ExpensesState {
    pub sessions: SessionStore,
    pub backend: BackendClient,
    pub latest_requests: LatestRequests,
    /// The local timezone as a canonical timezone name, e.g. "America/Bogota".
    pub local_timezone: String,
}

impl FromRef<AppState> for ExpensesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            sessions: state.sessions.clone(),
            backend: state.backend.clone(),
            latest_requests: state.latest_requests.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

pub async fn get_expenses_page(State(state): State<ExpensesState>, jar: CookieJar) -> Response {
    let (jar, session_id) = get_or_create_session(jar);

    match state.sessions.snapshot(session_id) {
        Ok(workflow) => (jar, expenses_view(&workflow, None)).into_response(),
        Err(error) => (jar, error).into_response(),
    }
}

/// Apply `event` to the session's workflow and render the updated workspace.
fn apply_event(state: &ExpensesState, jar: CookieJar, event: ExpenseEvent) -> Response {
    let (jar, session_id) = get_or_create_session(jar);

    let result = state.sessions.update(session_id, |workflow| {
        if !workflow.apply(event) {
            tracing::debug!("ignoring stale change for session {session_id}");
        }
        workflow.clone()
    });

    match result {
        Ok(workflow) => (jar, workspace_view(&workflow)).into_response(),
        Err(error) => (jar, error.into_alert_response()).into_response(),
    }
}

pub async fn add_expense(
    State(state): State<ExpensesState>,
    jar: CookieJar,
    Form(form): Form<ExpenseForm>,
) -> Response {
    apply_event(&state, jar, ExpenseEvent::ExpenseAdded(form.into()))
}

pub async fn delete_expense(
    State(state): State<ExpensesState>,
    jar: CookieJar,
    Path(index): Path<usize>,
) -> Response {
    apply_event(&state, jar, ExpenseEvent::ExpenseRemoved(index))
}

pub async fn add_consignment(
    State(state): State<ExpensesState>,
    jar: CookieJar,
    Form(form): Form<ConsignmentForm>,
) -> Response {
    apply_event(&state, jar, ExpenseEvent::ConsignmentAdded(form.into()))
}

pub async fn delete_consignment(
    State(state): State<ExpensesState>,
    jar: CookieJar,
    Path(index): Path<usize>,
) -> Response {
    apply_event(&state, jar, ExpenseEvent::ConsignmentRemoved(index))
}

pub async fn delete_support_image(
    State(state): State<ExpensesState>,
    jar: CookieJar,
    Path((kind, index)): Path<(ImageKind, usize)>,
) -> Response {
    apply_event(&state, jar, ExpenseEvent::ImageRemoved { kind, index })
}

/// Discard the session's expenses, consignments and images.
///
/// Without htmx the form posts normally, so the browser is sent back to the
/// expenses page instead of receiving a bare fragment.
pub async fn clear_expenses(
    State(state): State<ExpensesState>,
    HxRequest(is_htmx): HxRequest,
    jar: CookieJar,
) -> Response {
    let response = apply_event(&state, jar, ExpenseEvent::Cleared);

    if is_htmx || !response.status().is_success() {
        return response;
    }

    let (parts, _) = response.into_parts();
    let mut redirect = Redirect::to(endpoints::EXPENSES_VIEW).into_response();
    if let Some(cookie) = parts.headers.get(SET_COOKIE) {
        redirect.headers_mut().insert(SET_COOKIE, cookie.clone());
    }
    redirect
}

/// Attach every image in the form to the section named by the `tipo` field.
///
/// The whole upload is rejected if any file is not an image.
pub async fn upload_support_images(
    State(state): State<ExpensesState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let (jar, session_id) = get_or_create_session(jar);

    let result = match read_support_images(&mut multipart).await {
        Ok((kind, images)) => state.sessions.update(session_id, |workflow| {
            for data_uri in images {
                workflow.apply(ExpenseEvent::ImageAttached { kind, data_uri });
            }
            workflow.clone()
        }),
        Err(error) => Err(error),
    };

    match result {
        Ok(workflow) => (jar, workspace_view(&workflow)).into_response(),
        Err(error) => (jar, error.into_alert_response()).into_response(),
    }
}

async fn read_support_images(
    multipart: &mut Multipart,
) -> Result<(ImageKind, Vec<String>), Error> {
    let mut kind = ImageKind::Gastos;
    let mut images = Vec::new();

    while let Some(field) = next_field(multipart).await? {
        let name = field.name().unwrap_or_default().to_owned();

        match name.as_str() {
            "tipo" => {
                let text = read_text_field(field).await?;
                kind = ImageKind::ALL
                    .into_iter()
                    .find(|candidate| candidate.as_str() == text.trim())
                    .ok_or(Error::UnknownImageKind(text))?;
            }
            "imagenes" => {
                if let Some(data_uri) = read_image_field(field).await? {
                    images.push(data_uri);
                }
            }
            other => tracing::debug!("ignoring unknown support image field {other:?}"),
        }
    }

    tracing::debug!("attaching {} images to {}", images.len(), kind.as_str());

    Ok((kind, images))
}

/// Where the expense PDF is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfOrigin {
    /// Composed in this process.
    #[default]
    Local,
    /// Rendered by the report backend.
    Servidor,
}

/// Form data for downloading the expense report.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpensePdfForm {
    #[serde(default)]
    pub nombre_pdf: String,
    #[serde(default)]
    pub origen: PdfOrigin,
}

pub async fn download_expenses_pdf(
    State(state): State<ExpensesState>,
    jar: CookieJar,
    Form(form): Form<ExpensePdfForm>,
) -> Response {
    let (jar, session_id) = get_or_create_session(jar);

    match build_pdf(&state, session_id, form).await {
        Ok((filename, bytes)) => (jar, pdf_attachment(&filename, bytes)).into_response(),
        Err(error) => {
            let workflow = state.sessions.snapshot(session_id).unwrap_or_default();
            (
                jar,
                error.into_page_response(|alert| expenses_view(&workflow, Some(alert))),
            )
                .into_response()
        }
    }
}

async fn build_pdf(
    state: &ExpensesState,
    session_id: SessionId,
    form: ExpensePdfForm,
) -> Result<(String, Vec<u8>), Error> {
    let workflow = state.sessions.snapshot(session_id)?;

    if workflow.is_empty() {
        return Err(Error::NothingToReport);
    }

    let now = local_now(&state.local_timezone)?;
    let filename = normalize_filename(&form.nombre_pdf)
        .unwrap_or_else(|| default_filename(FILENAME_PREFIX, now));

    let bytes = match form.origen {
        PdfOrigin::Local => {
            state
                .latest_requests
                .run(session_id, RequestKind::ExpensesPdf, render_locally(workflow, now))
                .await??
        }
        PdfOrigin::Servidor => {
            let backend = state.backend.clone();
            let nombre_pdf = filename.clone();

            state
                .latest_requests
                .run(session_id, RequestKind::ExpensesPdf, async move {
                    backend
                        .generar_pdf_gastos(&ExpensePdfRequest {
                            gastos: &workflow.gastos,
                            consignaciones: &workflow.consignaciones,
                            imagenes_gastos: &workflow.imagenes.gastos,
                            imagenes_consignaciones: &workflow.imagenes.consignaciones,
                            imagenes_devoluciones: &workflow.imagenes.devoluciones,
                            nombre_pdf: &nombre_pdf,
                        })
                        .await
                })
                .await??
        }
    };

    tracing::info!("generated {filename} ({} bytes)", bytes.len());

    Ok((filename, bytes))
}

/// Compose and render the report on the blocking pool.
async fn render_locally(workflow: ExpenseWorkflow, now: OffsetDateTime) -> Result<Vec<u8>, Error> {
    let pdf = tokio::task::spawn_blocking(move || {
        generate_expense_pdf(ExpenseReportInput {
            workflow: &workflow,
            generated_at: now,
        })
    })
    .await
    .map_err(|error| Error::TaskFailed(error.to_string()))??;

    if pdf.skipped_images > 0 {
        tracing::warn!("{} support images could not be embedded", pdf.skipped_images);
    }
    tracing::debug!(
        "expense report totals: {} consigned, {} spent",
        pdf.summary.total_consignado,
        pdf.summary.total_gastos
    );

    Ok(pdf.bytes)
}
