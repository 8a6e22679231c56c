//! Middleware for logging requests and responses.

use axum::{
    body::{Body, HttpBody},
    extract::Request,
    http::{
        HeaderMap, StatusCode,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

/// The number of bytes of a body that are logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Multipart requests carry spreadsheets and images, and PDF responses are
/// binary, so those bodies are passed through untouched and only their length
/// is logged.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request = if is_binary(request.headers(), &["multipart/form-data"]) {
        let (parts, body) = request.into_parts();
        let length = body_length(&parts.headers, &body);
        tracing::info!("Received request: {parts:#?}\nbody: <multipart form, {length} bytes>");
        Request::from_parts(parts, body)
    } else {
        let (parts, body) = request.into_parts();
        let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::error!("Could not read request body: {error}");
                return StatusCode::BAD_REQUEST.into_response();
            }
        };
        log_request(&parts, &String::from_utf8_lossy(&body_bytes));
        Request::from_parts(parts, Body::from(body_bytes))
    };

    let response = next.run(request).await;

    if is_binary(response.headers(), &["application/pdf"]) {
        let (parts, body) = response.into_parts();
        let length = body_length(&parts.headers, &body);
        tracing::info!("Sending response: {parts:#?}\nbody: <pdf document, {length} bytes>");
        return Response::from_parts(parts, body);
    }

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&parts, &String::from_utf8_lossy(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

fn is_binary(headers: &HeaderMap, content_types: &[&str]) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| content_types.iter().any(|prefix| value.starts_with(prefix)))
}

/// The body length from the `Content-Length` header, or from the body itself
/// when it knows its exact size. Streamed bodies of unknown size log as "?".
fn body_length(headers: &HeaderMap, body: &Body) -> String {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .or_else(|| body.size_hint().exact().map(|length| length.to_string()))
        .unwrap_or_else(|| "?".to_owned())
}

/// The first [LOG_BODY_LENGTH_LIMIT] bytes of `body`, backed off to a char boundary.
fn truncate_body(body: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(body.len());
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {headers:#?}\nbody: {:}...",
            truncate_body(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {headers:#?}\nbody: {body:?}");
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {headers:#?}\nbody: {:}...",
            truncate_body(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {headers:#?}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{
            HeaderMap, HeaderValue, StatusCode,
            header::{CONTENT_LENGTH, CONTENT_TYPE},
        },
        middleware,
        response::IntoResponse,
        routing::post,
    };
    use axum_test::TestServer;

    use super::{LOG_BODY_LENGTH_LIMIT, body_length, is_binary, logging_middleware, truncate_body};

    #[test]
    fn truncation_respects_char_boundaries() {
        let body = "ñ".repeat(LOG_BODY_LENGTH_LIMIT);

        let truncated = truncate_body(&body);

        assert!(truncated.len() <= LOG_BODY_LENGTH_LIMIT);
        assert!(truncated.chars().all(|c| c == 'ñ'));
    }

    #[test]
    fn detects_multipart_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=abc"),
        );

        assert!(is_binary(&headers, &["multipart/form-data"]));
        assert!(!is_binary(&headers, &["application/pdf"]));
    }

    #[test]
    fn body_length_falls_back_to_body_size() {
        let body = Body::from(vec![0u8; 1200]);

        assert_eq!(body_length(&HeaderMap::new(), &body), "1200");
    }

    #[test]
    fn body_length_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("42"));

        assert_eq!(body_length(&headers, &Body::empty()), "42");
    }

    #[tokio::test]
    async fn passes_bodies_through_unchanged() {
        async fn echo(body: String) -> impl IntoResponse {
            (StatusCode::OK, body)
        }
        let app = Router::new()
            .route("/eco", post(echo))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let body = "monto=150000&descripcion=".to_owned() + &"x".repeat(200);

        let response = server.post("/eco").text(body.clone()).await;

        response.assert_status_ok();
        assert_eq!(response.text(), body);
    }
}
