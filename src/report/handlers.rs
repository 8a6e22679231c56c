//! Route handlers for the "Relación de Servicios" and "Pendientes de Pago"
//! pages.

use axum::{
    extract::{FromRef, Multipart, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use crate::{
    AppState, Error,
    analytics::is_pending,
    backend::BackendClient,
    download::pdf_attachment,
    records::{ServiceRecord, normalize_rows},
    report::{
        filename::default_filename,
        form::{ReportForm, ReportKind, ReportRequest},
        multipart::read_report_events,
        page::{preview_view, report_view},
    },
    requests::LatestRequests,
    session::{SessionId, get_or_create_session},
    timezone::local_now,
};

/// The state needed by the report pages.
#[derive(Debug, Clone)]
pub struct ReportState {
    pub backend: BackendClient,
    pub latest_requests: LatestRequests,
    /// The local timezone as a canonical timezone name, e.g. "America/Bogota".
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            backend: state.backend.clone(),
            latest_requests: state.latest_requests.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

pub async fn get_relacion_page() -> Response {
    report_view(ReportKind::RelacionServicios, None).into_response()
}

pub async fn get_pendientes_page() -> Response {
    report_view(ReportKind::Pendientes, None).into_response()
}

pub async fn preview_relacion(
    State(state): State<ReportState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Response {
    preview_report(ReportKind::RelacionServicios, state, jar, multipart).await
}

pub async fn preview_pendientes(
    State(state): State<ReportState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Response {
    preview_report(ReportKind::Pendientes, state, jar, multipart).await
}

pub async fn download_relacion_pdf(
    State(state): State<ReportState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Response {
    download_report(ReportKind::RelacionServicios, state, jar, multipart).await
}

pub async fn download_pendientes_pdf(
    State(state): State<ReportState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Response {
    download_report(ReportKind::Pendientes, state, jar, multipart).await
}

async fn preview_report(
    kind: ReportKind,
    state: ReportState,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let (jar, session_id) = get_or_create_session(jar);

    match fetch_preview(kind, &state, session_id, &mut multipart).await {
        Ok(records) => (jar, preview_view(kind, &records)).into_response(),
        Err(error) => (jar, error.into_alert_response()).into_response(),
    }
}

async fn download_report(
    kind: ReportKind,
    state: ReportState,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let (jar, session_id) = get_or_create_session(jar);

    match fetch_pdf(kind, &state, session_id, &mut multipart).await {
        Ok((filename, bytes)) => (jar, pdf_attachment(&filename, bytes)).into_response(),
        Err(error) => (jar, error.into_page_response(|alert| report_view(kind, Some(alert))))
            .into_response(),
    }
}

/// Build the request from the submitted form.
async fn submit_form(
    kind: ReportKind,
    state: &ReportState,
    multipart: &mut Multipart,
) -> Result<ReportRequest, Error> {
    let mut form = ReportForm::new();

    for event in read_report_events(multipart).await? {
        form.apply(event)?;
    }

    let now = local_now(&state.local_timezone)?;

    Ok(form.submit(default_filename(kind.filename_prefix(), now))?)
}

async fn fetch_preview(
    kind: ReportKind,
    state: &ReportState,
    session_id: SessionId,
    multipart: &mut Multipart,
) -> Result<Vec<ServiceRecord>, Error> {
    let request = submit_form(kind, state, multipart).await?;
    let backend = state.backend.clone();

    let rows = state
        .latest_requests
        .run(session_id, kind.preview_request(), async move {
            match kind {
                ReportKind::RelacionServicios => backend.relacion_servicios(&request).await,
                ReportKind::Pendientes => backend.procesar_excel(&request).await,
            }
        })
        .await??;

    let records = normalize_rows(&rows);
    let records: Vec<ServiceRecord> = match kind {
        ReportKind::RelacionServicios => records,
        ReportKind::Pendientes => records.into_iter().filter(is_pending).collect(),
    };

    tracing::info!("previewing {} rows for {}", records.len(), kind.title());

    Ok(records)
}

async fn fetch_pdf(
    kind: ReportKind,
    state: &ReportState,
    session_id: SessionId,
    multipart: &mut Multipart,
) -> Result<(String, Vec<u8>), Error> {
    let request = submit_form(kind, state, multipart).await?;
    let filename = request.nombre_pdf.clone();
    let backend = state.backend.clone();

    let bytes = state
        .latest_requests
        .run(session_id, kind.pdf_request(), async move {
            match kind {
                ReportKind::RelacionServicios => backend.pdf_relacion_servicios(&request).await,
                ReportKind::Pendientes => backend.pdf_pendientes(&request).await,
            }
        })
        .await??;

    tracing::info!("generated {filename} ({} bytes)", bytes.len());

    Ok((filename, bytes))
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use axum::{
        Json, Router,
        body::Bytes,
        extract::Multipart,
        http::StatusCode,
        response::IntoResponse,
        routing::post,
    };
    use axum_extra::extract::{CookieJar, cookie::Cookie};
    use scraper::Selector;
    use serde_json::json;
    use tokio::sync::oneshot;

    use crate::{
        backend::{BackendClient, paths},
        requests::LatestRequests,
        session::{COOKIE_SESSION_ID, SessionId},
        test_utils::{
            MultipartPart, assert_content_type, get_header, must_make_multipart,
            parse_html_document, parse_html_fragment, spawn_fake_backend,
        },
    };

    use super::{
        ReportState, download_relacion_pdf, preview_pendientes, preview_relacion,
    };

    async fn report_state(router: Router) -> ReportState {
        let address = spawn_fake_backend(router).await;

        ReportState {
            backend: BackendClient::new(&format!("http://{address}"), Duration::from_secs(5))
                .unwrap(),
            latest_requests: LatestRequests::new(),
            local_timezone: "America/Bogota".to_owned(),
        }
    }

    async fn valid_form() -> Multipart {
        must_make_multipart(&[
            MultipartPart::file("file", "servicios.xlsx", "application/octet-stream", b"xlsx"),
            MultipartPart::text("fecha_inicio", "2024-01-01"),
            MultipartPart::text("fecha_fin", "2024-01-31"),
            MultipartPart::text("notas", ""),
            MultipartPart::text("nombre_pdf", ""),
        ])
        .await
    }

    fn rows() -> serde_json::Value {
        json!({"data": [
            {"fecha": "2024-01-05", "cliente": "Edificio Sol", "precio": 100000, "estado": "pendiente"},
            {"fecha": "2024-01-20", "cliente": "Casa Luna", "precio": 50000, "estado": "completado"}
        ]})
    }

    #[tokio::test]
    async fn preview_shows_backend_rows_and_sets_session() {
        let state = report_state(Router::new().route(
            paths::RELACION_SERVICIOS,
            post(|_: Bytes| async { Json(rows()) }),
        ))
        .await;

        let response = preview_relacion(
            axum::extract::State(state),
            CookieJar::new(),
            valid_form().await,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(get_header(&response, "set-cookie").starts_with(COOKIE_SESSION_ID));
        let html = parse_html_fragment(response).await;
        assert_eq!(
            html.select(&Selector::parse("tbody tr").unwrap()).count(),
            2
        );
    }

    #[tokio::test]
    async fn pendientes_preview_keeps_only_pending_rows() {
        let state = report_state(
            Router::new().route(paths::PROCESAR_EXCEL, post(|_: Bytes| async { Json(rows()) })),
        )
        .await;

        let response = preview_pendientes(
            axum::extract::State(state),
            CookieJar::new(),
            valid_form().await,
        )
        .await;

        let html = parse_html_fragment(response).await;
        let cells: Vec<String> = html
            .select(&Selector::parse("tbody tr td:nth-child(2)").unwrap())
            .map(|cell| cell.text().collect())
            .collect();
        assert_eq!(cells, ["Edificio Sol"]);
    }

    #[tokio::test]
    async fn missing_dates_render_validation_alert() {
        let state = report_state(Router::new()).await;
        let multipart = must_make_multipart(&[MultipartPart::file(
            "file",
            "servicios.xlsx",
            "application/octet-stream",
            b"xlsx",
        )])
        .await;

        let response =
            preview_relacion(axum::extract::State(state), CookieJar::new(), multipart).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        let text: String = html.root_element().text().collect();
        assert!(text.contains("Seleccione la fecha de inicio"));
    }

    #[tokio::test]
    async fn backend_error_message_is_shown() {
        let state = report_state(Router::new().route(
            paths::RELACION_SERVICIOS,
            post(|_: Bytes| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "fecha inválida"})),
                )
                    .into_response()
            }),
        ))
        .await;

        let response = preview_relacion(
            axum::extract::State(state),
            CookieJar::new(),
            valid_form().await,
        )
        .await;

        let html = parse_html_fragment(response).await;
        let text: String = html.root_element().text().collect();
        assert!(text.contains("fecha inválida"));
    }

    #[tokio::test]
    async fn pdf_download_is_an_attachment_with_default_name() {
        let state = report_state(Router::new().route(
            paths::PDF_RELACION_SERVICIOS,
            post(|_: Bytes| async {
                ([("content-type", "application/pdf")], b"%PDF-1.4".to_vec())
            }),
        ))
        .await;

        let response = download_relacion_pdf(
            axum::extract::State(state),
            CookieJar::new(),
            valid_form().await,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "application/pdf");
        let disposition = get_header(&response, "content-disposition");
        assert!(disposition.starts_with("attachment; filename=\"Relacion_Servicios_"));
        assert!(disposition.ends_with(".pdf\""));
    }

    #[tokio::test]
    async fn failed_pdf_download_rerenders_page_with_alert() {
        let state = report_state(Router::new().route(
            paths::PDF_RELACION_SERVICIOS,
            post(|_: Bytes| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "No hay datos en el rango"})),
                )
                    .into_response()
            }),
        ))
        .await;

        let response = download_relacion_pdf(
            axum::extract::State(state),
            CookieJar::new(),
            valid_form().await,
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_document(response).await;
        let alert: String = html
            .select(&Selector::parse("#inline-alert").unwrap())
            .next()
            .expect("inline alert missing")
            .text()
            .collect();
        assert!(alert.contains("No hay datos en el rango"));
    }

    #[tokio::test]
    async fn resubmitted_preview_replaces_the_one_in_flight() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (started_tx, started_rx) = oneshot::channel::<()>();
        let started_tx = Arc::new(Mutex::new(Some(started_tx)));
        let state = report_state(Router::new().route(
            paths::RELACION_SERVICIOS,
            post(move |_: Bytes| {
                let calls = calls.clone();
                let started_tx = started_tx.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        let sender = started_tx.lock().unwrap().take();
                        if let Some(sender) = sender {
                            let _ = sender.send(());
                        }
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                    Json(rows())
                }
            }),
        ))
        .await;
        let session_id = SessionId::new();
        let jar = CookieJar::new().add(Cookie::new(COOKIE_SESSION_ID, session_id.to_string()));

        let first = tokio::spawn(preview_relacion(
            axum::extract::State(state.clone()),
            jar.clone(),
            valid_form().await,
        ));
        started_rx.await.expect("first preview never reached the backend");
        let second =
            preview_relacion(axum::extract::State(state), jar, valid_form().await).await;

        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(first.await.unwrap().status(), StatusCode::NO_CONTENT);
    }
}
