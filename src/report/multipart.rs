//! Turns a submitted report form into [ReportFormEvent]s.

use axum::extract::Multipart;

use crate::{
    Error,
    report::form::ReportFormEvent,
    upload::{next_field, read_file_field, read_image_field, read_text_field},
};

/// Read the report form fields in the order they were sent.
///
/// Unknown fields are ignored.
///
/// # Errors
/// Returns an error if the form is malformed or a support image is not an
/// image.
pub(super) async fn read_report_events(
    multipart: &mut Multipart,
) -> Result<Vec<ReportFormEvent>, Error> {
    let mut events = Vec::new();

    while let Some(field) = next_field(multipart).await? {
        let name = field.name().unwrap_or_default().to_owned();

        let event = match name.as_str() {
            "file" => ReportFormEvent::FileSelected(read_file_field(field).await?),
            "fecha_inicio" => ReportFormEvent::StartDateChosen(read_text_field(field).await?),
            "fecha_fin" => ReportFormEvent::EndDateChosen(read_text_field(field).await?),
            "notas" => ReportFormEvent::NotesEdited(read_text_field(field).await?),
            "nombre_pdf" => ReportFormEvent::FilenameSet(read_text_field(field).await?),
            "imagenes" => match read_image_field(field).await? {
                Some(data_uri) => ReportFormEvent::ImageAttached(data_uri),
                None => continue,
            },
            other => {
                tracing::debug!("ignoring unknown report form field {other:?}");
                continue;
            }
        };

        events.push(event);
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use crate::{
        report::form::ReportFormEvent,
        test_utils::{MultipartPart, must_make_multipart},
    };

    use super::read_report_events;

    #[tokio::test]
    async fn reads_all_report_fields() {
        let mut multipart = must_make_multipart(&[
            MultipartPart::file("file", "servicios.xlsx", "application/octet-stream", b"xlsx"),
            MultipartPart::text("fecha_inicio", "2024-01-01"),
            MultipartPart::text("fecha_fin", "2024-01-31"),
            MultipartPart::text("notas", "Enero"),
            MultipartPart::file("imagenes", "a.png", "image/png", b"abc"),
            MultipartPart::file("imagenes", "", "application/octet-stream", b""),
            MultipartPart::text("nombre_pdf", "enero"),
            MultipartPart::text("otro", "x"),
        ])
        .await;

        let events = read_report_events(&mut multipart).await.unwrap();

        assert_eq!(events.len(), 6);
        assert!(matches!(&events[0], ReportFormEvent::FileSelected(file) if file.file_name == "servicios.xlsx"));
        assert!(matches!(&events[1], ReportFormEvent::StartDateChosen(date) if date == "2024-01-01"));
        assert!(matches!(&events[2], ReportFormEvent::EndDateChosen(date) if date == "2024-01-31"));
        assert!(matches!(&events[3], ReportFormEvent::NotesEdited(notes) if notes == "Enero"));
        assert!(
            matches!(&events[4], ReportFormEvent::ImageAttached(uri) if uri == "data:image/png;base64,YWJj")
        );
        assert!(matches!(&events[5], ReportFormEvent::FilenameSet(name) if name == "enero"));
    }
}
