use axum::http::StatusCode;
use serde::Deserialize;

/// Shown to the user whenever the report backend cannot be reached.
pub const UNREACHABLE_MESSAGE: &str = "No se pudo conectar con el servidor";

/// The errors that may occur when talking to the report backend.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum BackendError {
    /// The backend rejected the request. The message comes from the `error`
    /// field of its response and is meant for the user.
    #[error("{0}")]
    Business(String),

    /// The backend could not be reached or did not answer in time.
    ///
    /// The detail is for the logs only.
    #[error("{UNREACHABLE_MESSAGE}")]
    Unreachable(String),

    /// The backend answered with a success status but the body could not be
    /// read.
    #[error("Respuesta inválida del servidor: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl BackendError {
    /// Build the error for a non-2xx response from its raw body.
    pub(super) fn from_status(status: StatusCode, body: &[u8]) -> Self {
        match error_field(body) {
            Some(message) => BackendError::Business(message),
            None => BackendError::Business(format!(
                "Error del servidor ({})",
                status.as_u16()
            )),
        }
    }

    pub(super) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() || error.is_request() {
            BackendError::Unreachable(error.to_string())
        } else {
            BackendError::InvalidResponse(error.to_string())
        }
    }
}

/// The non-empty `error` field of a JSON body, if there is one.
pub(super) fn error_field(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .filter(|message| !message.trim().is_empty())
}
