//! Reading uploaded files out of multipart form fields.

use axum::extract::multipart::{Field, Multipart, MultipartError};

use crate::{Error, backend::UploadedFile, pdf::encode_data_uri};

/// Read a file field into memory.
///
/// # Errors
/// Returns [Error::MultipartError] if the field body cannot be read.
pub async fn read_file_field(field: Field<'_>) -> Result<UploadedFile, Error> {
    let file_name = field.file_name().unwrap_or_default().to_owned();
    let content_type = field.content_type().map(str::to_owned);

    let bytes = field
        .bytes()
        .await
        .inspect_err(|error| tracing::error!("Could not read file from multipart form: {error}"))
        .map_err(|error| Error::MultipartError(error.body_text()))?;

    tracing::debug!("received file {file_name:?} with {} bytes", bytes.len());

    Ok(UploadedFile {
        file_name,
        content_type,
        bytes,
    })
}

/// Read an image field as a data URI.
///
/// Returns `None` for an empty field, which is what browsers send when no
/// file was picked.
///
/// # Errors
/// Returns [Error::NotAnImage] if the field is not an image, or
/// [Error::MultipartError] if the field body cannot be read.
pub async fn read_image_field(field: Field<'_>) -> Result<Option<String>, Error> {
    let file = read_file_field(field).await?;

    if file.is_empty() {
        return Ok(None);
    }

    let content_type = file.content_type.as_deref().unwrap_or_default();
    if !content_type.starts_with("image/") {
        tracing::debug!("rejected support image with content type {content_type:?}");
        return Err(Error::NotAnImage(file.file_name));
    }

    Ok(Some(encode_data_uri(content_type, &file.bytes)))
}

/// Read a text field.
///
/// # Errors
/// Returns [Error::MultipartError] if the field body cannot be read.
pub async fn read_text_field(field: Field<'_>) -> Result<String, Error> {
    field
        .text()
        .await
        .inspect_err(|error| tracing::error!("Could not read text from multipart form: {error}"))
        .map_err(|error| Error::MultipartError(error.body_text()))
}

/// Get the next field of `multipart`.
///
/// # Errors
/// Returns [Error::MultipartError] if the form is malformed.
pub async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>, Error> {
    multipart
        .next_field()
        .await
        .inspect_err(|error: &MultipartError| {
            tracing::error!("Could not parse multipart form: {error}")
        })
        .map_err(|error| Error::MultipartError(error.body_text()))
}
