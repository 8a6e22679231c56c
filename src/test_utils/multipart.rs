use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};

const BOUNDARY: &str = "MY_BOUNDARY123456789";

/// One part of a multipart form built with [must_make_multipart].
pub(crate) struct MultipartPart<'a> {
    name: &'a str,
    file: Option<(&'a str, &'a str)>,
    data: &'a [u8],
}

impl<'a> MultipartPart<'a> {
    pub(crate) fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file: None,
            data: value.as_bytes(),
        }
    }

    pub(crate) fn file(
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    ) -> Self {
        Self {
            name,
            file: Some((file_name, content_type)),
            data,
        }
    }
}

pub(crate) fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// The raw body of a multipart form.
pub(crate) fn multipart_body(parts: &[MultipartPart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());

        match part.file {
            Some((file_name, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\n\
                        Content-Type: {content_type}\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                );
            }
        }

        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub(crate) async fn must_make_multipart(parts: &[MultipartPart<'_>]) -> Multipart {
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(CONTENT_TYPE, multipart_content_type())
        .body(multipart_body(parts).into())
        .unwrap();

    Multipart::from_request(request, &()).await.unwrap()
}
