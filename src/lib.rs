//! Servicios is a web dashboard for a service company.
//!
//! Upload the spreadsheet of service records to get the "Relación de
//! Servicios" and "Pendientes de Pago" PDF reports, an analytics page with
//! KPIs, charts and tables, and an expense report for work trips.
//!
//! This library serves the HTML pages directly. Spreadsheet parsing and the
//! official reports are delegated to an external report backend over HTTP.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use maud::Markup;
use tokio::signal;

mod alert;
mod analytics;
mod app_state;
mod backend;
mod config;
mod download;
mod endpoints;
mod expenses;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod pdf;
mod records;
mod report;
mod requests;
mod routing;
mod session;
mod timezone;
mod upload;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use config::Config;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

use crate::{
    alert::Alert,
    backend::{BackendError, UNREACHABLE_MESSAGE},
    internal_server_error::InternalServerError,
    pdf::PdfError,
    report::ValidationError,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The report backend failed or rejected the request.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A report form was incomplete or malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The expense report could not be composed or rendered.
    #[error(transparent)]
    Pdf(#[from] PdfError),

    /// The multipart form could not be read.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// A support image upload contained a file that is not an image.
    #[error("\"{0}\" is not an image")]
    NotAnImage(String),

    /// A support image upload named a section that does not exist.
    #[error("unknown support image section \"{0}\"")]
    UnknownImageKind(String),

    /// The expense report was requested with no entries and no images.
    #[error("there is nothing to put in the expense report")]
    NothingToReport,

    /// A newer request of the same kind replaced this one.
    ///
    /// The client has already moved on, so this is not shown to the user.
    #[error("the request was superseded by a newer one")]
    Superseded,

    /// A spawned request task panicked.
    #[error("the request task failed: {0}")]
    TaskFailed(String),

    /// Could not acquire the session store lock.
    #[error("could not acquire the session lock")]
    SessionLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Backend(BackendError::Business(_))
            | Error::Validation(_)
            | Error::MultipartError(_)
            | Error::NotAnImage(_)
            | Error::UnknownImageKind(_)
            | Error::NothingToReport => StatusCode::BAD_REQUEST,
            Error::Backend(BackendError::Unreachable(_) | BackendError::InvalidResponse(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Error::Superseded => StatusCode::NO_CONTENT,
            Error::Pdf(_)
            | Error::TaskFailed(_)
            | Error::SessionLockError
            | Error::InvalidTimezoneError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the user. Internal details only go to the logs.
    fn into_alert(self) -> Alert {
        match self {
            Error::Backend(BackendError::Business(details)) => Alert::Error {
                message: "El servidor de reportes rechazó la solicitud".to_owned(),
                details,
            },
            Error::Backend(BackendError::Unreachable(detail)) => {
                tracing::error!("report backend unreachable: {detail}");
                Alert::Error {
                    message: UNREACHABLE_MESSAGE.to_owned(),
                    details: "Verifique que el servidor de reportes esté en ejecución.".to_owned(),
                }
            }
            Error::Backend(BackendError::InvalidResponse(detail)) => {
                tracing::error!("invalid response from report backend: {detail}");
                Alert::Error {
                    message: "Respuesta inválida del servidor de reportes".to_owned(),
                    details: "Intente de nuevo. Si el problema continúa, revise los registros."
                        .to_owned(),
                }
            }
            Error::Validation(error) => Alert::ErrorSimple {
                message: error.to_string(),
            },
            Error::Pdf(error) => {
                tracing::error!("could not generate expense report: {error}");
                Alert::Error {
                    message: "No se pudo generar el PDF".to_owned(),
                    details: error.to_string(),
                }
            }
            Error::MultipartError(detail) => Alert::Error {
                message: "No se pudo leer el formulario".to_owned(),
                details: detail,
            },
            Error::NotAnImage(file_name) => Alert::Error {
                message: "Archivo no válido".to_owned(),
                details: format!("\"{file_name}\" no es una imagen."),
            },
            Error::UnknownImageKind(kind) => Alert::Error {
                message: "Sección no válida".to_owned(),
                details: format!("La sección de soportes \"{kind}\" no existe."),
            },
            Error::NothingToReport => Alert::Error {
                message: "No hay nada para reportar".to_owned(),
                details: "Agregue al menos un gasto, una consignación o un soporte.".to_owned(),
            },
            Error::InvalidTimezoneError(timezone) => Alert::Error {
                message: "Zona horaria inválida".to_owned(),
                details: format!(
                    "No se pudo obtener la zona horaria \"{timezone}\". Revise la configuración del servidor."
                ),
            },
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                Alert::Error {
                    message: "Algo salió mal".to_owned(),
                    details: "Ocurrió un error inesperado, revise los registros del servidor."
                        .to_owned(),
                }
            }
        }
    }

    /// The alert fragment for an htmx request.
    ///
    /// A superseded request gets an empty 204 response, which htmx does not
    /// swap, so the newer request's result stays on screen.
    fn into_alert_response(self) -> Response {
        if self == Error::Superseded {
            return StatusCode::NO_CONTENT.into_response();
        }

        let status_code = self.status_code();
        (status_code, self.into_alert()).into_response()
    }

    /// The full page rendered by `page` with the error as an inline alert.
    ///
    /// Used for plain form posts such as PDF downloads, where there is no
    /// htmx target to swap an alert into.
    pub(crate) fn into_page_response(self, page: impl FnOnce(Alert) -> Markup) -> Response {
        if self == Error::Superseded {
            return StatusCode::NO_CONTENT.into_response();
        }

        let status_code = self.status_code();
        (status_code, page(self.into_alert())).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Zona horaria inválida",
                fix: &format!(
                    "No se pudo obtener la zona horaria \"{timezone}\". Revise la configuración \
                    del servidor y use un nombre de zona horaria canónico, por ejemplo America/Bogota."
                ),
            }
            .into_response(),
            Error::SessionLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use maud::html;

    use crate::{
        Error,
        alert::Alert,
        backend::BackendError,
        report::ValidationError,
        test_utils::parse_html_fragment,
    };

    #[test]
    fn business_errors_are_client_errors() {
        assert_eq!(
            Error::from(BackendError::Business("sin datos".to_owned())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::from(BackendError::Unreachable("refused".to_owned())).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn business_error_message_reaches_the_user() {
        let alert = Error::from(BackendError::Business("fecha inválida".to_owned())).into_alert();

        assert!(matches!(alert, Alert::Error { details, .. } if details == "fecha inválida"));
    }

    #[test]
    fn unreachable_backend_uses_fixed_message() {
        let alert = Error::from(BackendError::Unreachable("connection refused".to_owned()))
            .into_alert();

        assert!(
            matches!(alert, Alert::Error { message, .. } if message == "No se pudo conectar con el servidor")
        );
    }

    #[tokio::test]
    async fn superseded_request_is_not_swapped() {
        let response = Error::Superseded.into_alert_response();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn validation_alert_has_message() {
        let response = Error::from(ValidationError::EndBeforeStart).into_alert_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        let text: String = html.root_element().text().collect();
        assert!(text.contains("La fecha de fin no puede ser anterior a la fecha de inicio"));
    }

    #[test]
    fn page_response_embeds_alert() {
        let response = Error::NothingToReport.into_page_response(|alert| {
            html! { div id="inline-alert" { (alert.into_html()) } }
        });

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
