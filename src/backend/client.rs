//! HTTP client for the report backend.

use std::time::Duration;

use reqwest::{
    RequestBuilder, Response,
    header::CONTENT_TYPE,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::{Date, macros::format_description};

use crate::{
    backend::{
        error::{BackendError, error_field},
        models::{
            AnalyticsSummary, DataResponse, ExpensePdfRequest, PendingAnalytics, UploadedFile,
        },
    },
    records::Row,
    report::ReportRequest,
};

/// Backend endpoint paths, relative to the base URL.
pub mod paths {
    pub const RELACION_SERVICIOS: &str = "/api/relacion_servicios";
    pub const PROCESAR_EXCEL: &str = "/api/procesar_excel";
    pub const ANALYTICS: &str = "/api/analytics";
    pub const PENDIENTES_EFECTIVO: &str = "/api/analytics_pendientes_efectivo";
    pub const PENDIENTES_COBRAR: &str = "/api/analytics_pendientes_cobrar";
    pub const PDF_RELACION_SERVICIOS: &str = "/api/pdf_relacion_servicios";
    pub const PDF_PENDIENTES: &str = "/api/pdf_pendientes";
    pub const GASTOS_PDF: &str = "/api/gastos/generar-pdf";
}

/// A client for the report backend.
///
/// Cloning is cheap, the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client for the backend at `base_url`.
    ///
    /// # Errors
    /// Returns [BackendError::Unreachable] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| BackendError::Unreachable(error.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Rows of the service report for the requested date range.
    pub async fn relacion_servicios(
        &self,
        request: &ReportRequest,
    ) -> Result<Vec<Row>, BackendError> {
        self.fetch_rows(paths::RELACION_SERVICIOS, request).await
    }

    /// All rows of the spreadsheet in the requested date range.
    pub async fn procesar_excel(&self, request: &ReportRequest) -> Result<Vec<Row>, BackendError> {
        self.fetch_rows(paths::PROCESAR_EXCEL, request).await
    }

    pub async fn analytics(&self, file: &UploadedFile) -> Result<AnalyticsSummary, BackendError> {
        let form = Form::new().part("file", file_part(file));
        self.post_multipart_json(paths::ANALYTICS, form).await
    }

    pub async fn pendientes_efectivo(
        &self,
        file: &UploadedFile,
    ) -> Result<PendingAnalytics, BackendError> {
        let form = Form::new().part("file", file_part(file));
        self.post_multipart_json(paths::PENDIENTES_EFECTIVO, form).await
    }

    pub async fn pendientes_cobrar(
        &self,
        file: &UploadedFile,
    ) -> Result<PendingAnalytics, BackendError> {
        let form = Form::new().part("file", file_part(file));
        self.post_multipart_json(paths::PENDIENTES_COBRAR, form).await
    }

    /// The "Relación de Servicios" PDF.
    pub async fn pdf_relacion_servicios(
        &self,
        request: &ReportRequest,
    ) -> Result<Vec<u8>, BackendError> {
        let form = report_form(request, true)?;
        self.post_for_pdf(
            paths::PDF_RELACION_SERVICIOS,
            self.http
                .post(self.url(paths::PDF_RELACION_SERVICIOS))
                .multipart(form),
        )
        .await
    }

    /// The "Pendientes de Pago" PDF.
    pub async fn pdf_pendientes(&self, request: &ReportRequest) -> Result<Vec<u8>, BackendError> {
        let form = report_form(request, true)?;
        self.post_for_pdf(
            paths::PDF_PENDIENTES,
            self.http.post(self.url(paths::PDF_PENDIENTES)).multipart(form),
        )
        .await
    }

    /// The expense report rendered by the backend.
    pub async fn generar_pdf_gastos(
        &self,
        body: &ExpensePdfRequest<'_>,
    ) -> Result<Vec<u8>, BackendError> {
        self.post_for_pdf(
            paths::GASTOS_PDF,
            self.http.post(self.url(paths::GASTOS_PDF)).json(body),
        )
        .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn fetch_rows(
        &self,
        path: &str,
        request: &ReportRequest,
    ) -> Result<Vec<Row>, BackendError> {
        let form = report_form(request, false)?;
        let response: DataResponse = self.post_multipart_json(path, form).await?;
        tracing::debug!("{path} returned {} rows", response.data.len());

        Ok(response.data)
    }

    async fn post_multipart_json<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, BackendError> {
        let response = self
            .send(path, self.http.post(self.url(path)).multipart(form))
            .await?;
        let body = response
            .bytes()
            .await
            .map_err(BackendError::from_transport)?;

        // A success status can still carry a business error.
        if let Some(message) = error_field(&body) {
            tracing::warn!("{path} reported an error: {message}");
            return Err(BackendError::Business(message));
        }

        let value: Value = serde_json::from_slice(&body).map_err(|error| {
            tracing::error!("Could not parse JSON from {path}: {error}");
            BackendError::InvalidResponse(error.to_string())
        })?;

        serde_json::from_value(value).map_err(|error| {
            tracing::error!("Unexpected JSON shape from {path}: {error}");
            BackendError::InvalidResponse(error.to_string())
        })
    }

    async fn post_for_pdf(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, BackendError> {
        let response = self.send(path, request).await?;
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));
        let body = response
            .bytes()
            .await
            .map_err(BackendError::from_transport)?;

        if is_json {
            let message = error_field(&body)
                .unwrap_or_else(|| "El servidor no devolvió un PDF".to_owned());
            tracing::warn!("{path} returned JSON instead of a PDF: {message}");
            return Err(BackendError::Business(message));
        }

        tracing::info!("{path} returned a PDF of {} bytes", body.len());
        Ok(body.to_vec())
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(|error| {
            tracing::error!("Request to {path} failed: {error}");
            BackendError::from_transport(error)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let error = BackendError::from_status(status, &body);
        tracing::warn!("{path} responded with {status}: {error}");

        Err(error)
    }
}

/// The uploaded file as a multipart part.
///
/// A content type the browser sent that is not a valid MIME type is dropped,
/// the backend identifies spreadsheets by their file name.
fn file_part(file: &UploadedFile) -> Part {
    let part = || Part::stream(file.bytes.clone()).file_name(file.file_name.clone());

    match &file.content_type {
        Some(content_type) => part().mime_str(content_type).unwrap_or_else(|error| {
            tracing::warn!(
                "Ignoring content type {content_type:?} of {}: {error}",
                file.file_name
            );
            part()
        }),
        None => part(),
    }
}

fn report_form(request: &ReportRequest, with_pdf_fields: bool) -> Result<Form, BackendError> {
    let form = Form::new()
        .part("file", file_part(&request.file))
        .text("fecha_inicio", iso_date(request.fecha_inicio))
        .text("fecha_fin", iso_date(request.fecha_fin));

    if !with_pdf_fields {
        return Ok(form);
    }

    let imagenes = serde_json::to_string(&request.imagenes)
        .map_err(|error| BackendError::InvalidResponse(error.to_string()))?;

    Ok(form
        .text("notas", request.notas.clone())
        .text("nombre_pdf", request.nombre_pdf.clone())
        .text("imagenes", imagenes))
}

fn iso_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::{net::SocketAddr, time::Duration};

    use axum::{
        Json, Router,
        body::Bytes,
        extract::Multipart,
        http::{StatusCode, header::CONTENT_TYPE},
        response::IntoResponse,
        routing::post,
    };
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::{
        backend::{BackendError, ExpensePdfRequest, UploadedFile},
        report::ReportRequest,
        test_utils::spawn_fake_backend,
    };

    use super::{BackendClient, paths};

    fn client_for(address: SocketAddr) -> BackendClient {
        BackendClient::new(&format!("http://{address}/"), Duration::from_secs(5)).unwrap()
    }

    fn request() -> ReportRequest {
        ReportRequest {
            file: UploadedFile {
                file_name: "servicios.xlsx".to_owned(),
                content_type: Some(
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_owned(),
                ),
                bytes: Bytes::from_static(b"PK\x03\x04"),
            },
            fecha_inicio: date!(2024 - 01 - 01),
            fecha_fin: date!(2024 - 01 - 31),
            notas: "Sin novedad".to_owned(),
            imagenes: vec!["data:image/png;base64,AA".to_owned()],
            nombre_pdf: "Relacion.pdf".to_owned(),
        }
    }

    /// Echo every text field back as a single row, and the file name under
    /// `file`.
    async fn echo_fields(mut multipart: Multipart) -> Json<Value> {
        let mut row = serde_json::Map::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_owned();
            if name == "file" {
                row.insert(name, json!(field.file_name().unwrap_or_default()));
            } else {
                row.insert(name, json!(field.text().await.unwrap()));
            }
        }
        Json(json!({ "data": [row] }))
    }

    #[tokio::test]
    async fn row_endpoints_send_file_and_dates() {
        let address = spawn_fake_backend(
            Router::new().route(paths::RELACION_SERVICIOS, post(echo_fields)),
        )
        .await;

        let rows = client_for(address)
            .relacion_servicios(&request())
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["file"], "servicios.xlsx");
        assert_eq!(rows[0]["fecha_inicio"], "2024-01-01");
        assert_eq!(rows[0]["fecha_fin"], "2024-01-31");
        assert!(rows[0].get("notas").is_none());
    }

    #[tokio::test]
    async fn pdf_error_body_becomes_message() {
        let address = spawn_fake_backend(Router::new().route(
            paths::PDF_RELACION_SERVICIOS,
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "fecha inválida"})),
                )
            }),
        ))
        .await;

        let error = client_for(address)
            .pdf_relacion_servicios(&request())
            .await
            .unwrap_err();

        assert_eq!(error, BackendError::Business("fecha inválida".to_owned()));
        assert_eq!(error.to_string(), "fecha inválida");
    }

    #[tokio::test]
    async fn pdf_endpoint_returns_bytes() {
        let address = spawn_fake_backend(Router::new().route(
            paths::PDF_PENDIENTES,
            post(|mut multipart: Multipart| async move {
                let mut names = Vec::new();
                while let Some(field) = multipart.next_field().await.unwrap() {
                    names.push(field.name().unwrap_or_default().to_owned());
                }
                assert_eq!(
                    names,
                    ["file", "fecha_inicio", "fecha_fin", "notas", "nombre_pdf", "imagenes"]
                );
                ([(CONTENT_TYPE, "application/pdf")], "%PDF-1.4 fake").into_response()
            }),
        ))
        .await;

        let bytes = client_for(address)
            .pdf_pendientes(&request())
            .await
            .unwrap();

        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn success_status_with_error_field_is_business_error() {
        let address = spawn_fake_backend(Router::new().route(
            paths::PROCESAR_EXCEL,
            post(|| async { Json(json!({"error": "No hay datos en el rango"})) }),
        ))
        .await;

        let error = client_for(address)
            .procesar_excel(&request())
            .await
            .unwrap_err();

        assert_eq!(
            error,
            BackendError::Business("No hay datos en el rango".to_owned())
        );
    }

    #[tokio::test]
    async fn analytics_parses_summary() {
        let address = spawn_fake_backend(Router::new().route(
            paths::ANALYTICS,
            post(|| async {
                Json(json!({
                    "resumen": {"total_servicios": 12},
                    "estados_grafico": {"Pagado": 10, "Pendiente": 2},
                    "total_pendientes_cobrar": 350000
                }))
            }),
        ))
        .await;

        let summary = client_for(address)
            .analytics(&request().file)
            .await
            .unwrap();

        assert_eq!(summary.resumen["total_servicios"], 12);
        assert_eq!(summary.pendientes_cobrar(), 350000.0);
    }

    #[tokio::test]
    async fn expense_pdf_posts_json() {
        let address = spawn_fake_backend(Router::new().route(
            paths::GASTOS_PDF,
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["nombrePDF"], "Gastos.pdf");
                ([(CONTENT_TYPE, "application/pdf")], "%PDF-1.7").into_response()
            }),
        ))
        .await;

        let bytes = client_for(address)
            .generar_pdf_gastos(&ExpensePdfRequest {
                gastos: &[],
                consignaciones: &[],
                imagenes_gastos: &[],
                imagenes_consignaciones: &[],
                imagenes_devoluciones: &[],
                nombre_pdf: "Gastos.pdf",
            })
            .await
            .unwrap();

        assert_eq!(bytes, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let error = client_for(address)
            .analytics(&request().file)
            .await
            .unwrap_err();

        assert!(matches!(error, BackendError::Unreachable(_)));
        assert_eq!(error.to_string(), "No se pudo conectar con el servidor");
    }

    #[tokio::test]
    async fn malformed_content_type_still_sends_file() {
        let address = spawn_fake_backend(
            Router::new().route(paths::RELACION_SERVICIOS, post(echo_fields)),
        )
        .await;
        let mut request = request();
        request.file.content_type = Some("hoja de cálculo".to_owned());

        let rows = client_for(address)
            .relacion_servicios(&request)
            .await
            .unwrap();

        assert_eq!(rows[0]["file"], "servicios.xlsx");
    }
}
