//! The view-model behind the report pages.
//!
//! A [ReportForm] is only changed through [ReportForm::apply]. Submitting a
//! valid form yields the [ReportRequest] to send to the backend. A form
//! submitted again while the first request is still running supersedes it,
//! see [crate::requests::LatestRequests].

use time::{Date, macros::format_description};

use crate::{
    backend::UploadedFile,
    endpoints,
    report::filename::normalize_filename,
    requests::RequestKind,
};

/// The two backend generated reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    RelacionServicios,
    Pendientes,
}

impl ReportKind {
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::RelacionServicios => "Relación de Servicios",
            ReportKind::Pendientes => "Pendientes de Pago",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReportKind::RelacionServicios => {
                "Genere la relación de los servicios realizados en un rango de fechas."
            }
            ReportKind::Pendientes => {
                "Genere el reporte de servicios con pago pendiente en un rango de fechas."
            }
        }
    }

    pub fn view_endpoint(&self) -> &'static str {
        match self {
            ReportKind::RelacionServicios => endpoints::RELACION_VIEW,
            ReportKind::Pendientes => endpoints::PENDIENTES_VIEW,
        }
    }

    pub fn preview_endpoint(&self) -> &'static str {
        match self {
            ReportKind::RelacionServicios => endpoints::RELACION_PREVIEW,
            ReportKind::Pendientes => endpoints::PENDIENTES_PREVIEW,
        }
    }

    pub fn pdf_endpoint(&self) -> &'static str {
        match self {
            ReportKind::RelacionServicios => endpoints::RELACION_PDF,
            ReportKind::Pendientes => endpoints::PENDIENTES_PDF,
        }
    }

    /// The start of generated filenames, see [crate::report::default_filename].
    pub fn filename_prefix(&self) -> &'static str {
        match self {
            ReportKind::RelacionServicios => "Relacion_Servicios",
            ReportKind::Pendientes => "Pendientes_de_Pago",
        }
    }

    pub(crate) fn preview_request(&self) -> RequestKind {
        match self {
            ReportKind::RelacionServicios => RequestKind::RelacionPreview,
            ReportKind::Pendientes => RequestKind::PendientesPreview,
        }
    }

    pub(crate) fn pdf_request(&self) -> RequestKind {
        match self {
            ReportKind::RelacionServicios => RequestKind::RelacionPdf,
            ReportKind::Pendientes => RequestKind::PendientesPdf,
        }
    }
}

/// Everything the backend needs to build a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub file: UploadedFile,
    pub fecha_inicio: Date,
    pub fecha_fin: Date,
    pub notas: String,
    /// Support images as data URIs.
    pub imagenes: Vec<String>,
    pub nombre_pdf: String,
}

/// Something the user did on a report page.
#[derive(Debug, Clone)]
pub enum ReportFormEvent {
    FileSelected(UploadedFile),
    /// A date as typed, `YYYY-MM-DD`. An empty string clears the date.
    StartDateChosen(String),
    EndDateChosen(String),
    NotesEdited(String),
    ImageAttached(String),
    FilenameSet(String),
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Seleccione un archivo Excel")]
    MissingFile,

    #[error("Seleccione la fecha de inicio")]
    MissingStartDate,

    #[error("Seleccione la fecha de fin")]
    MissingEndDate,

    #[error("Fecha inválida: \"{0}\"")]
    InvalidDate(String),

    #[error("La fecha de fin no puede ser anterior a la fecha de inicio")]
    EndBeforeStart,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportForm {
    pub file: Option<UploadedFile>,
    pub fecha_inicio: Option<Date>,
    pub fecha_fin: Option<Date>,
    pub notas: String,
    pub imagenes: Vec<String>,
    pub nombre_pdf: String,
}

impl ReportForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `event` to the form.
    ///
    /// # Errors
    /// Returns a [ValidationError] if a date cannot be parsed. A rejected
    /// event leaves the form unchanged.
    pub fn apply(&mut self, event: ReportFormEvent) -> Result<(), ValidationError> {
        match event {
            ReportFormEvent::FileSelected(file) => self.file = (!file.is_empty()).then_some(file),
            ReportFormEvent::StartDateChosen(text) => self.fecha_inicio = parse_form_date(&text)?,
            ReportFormEvent::EndDateChosen(text) => self.fecha_fin = parse_form_date(&text)?,
            ReportFormEvent::NotesEdited(notas) => self.notas = notas,
            ReportFormEvent::ImageAttached(data_uri) => self.imagenes.push(data_uri),
            ReportFormEvent::FilenameSet(name) => self.nombre_pdf = name,
        }

        Ok(())
    }

    /// Validate the form and build the request to send.
    ///
    /// `default_filename` is used when the user did not name the PDF.
    ///
    /// # Errors
    /// Returns a [ValidationError] if the form is incomplete.
    pub fn submit(&self, default_filename: String) -> Result<ReportRequest, ValidationError> {
        let file = self.file.clone().ok_or(ValidationError::MissingFile)?;
        let fecha_inicio = self.fecha_inicio.ok_or(ValidationError::MissingStartDate)?;
        let fecha_fin = self.fecha_fin.ok_or(ValidationError::MissingEndDate)?;

        if fecha_fin < fecha_inicio {
            return Err(ValidationError::EndBeforeStart);
        }

        Ok(ReportRequest {
            file,
            fecha_inicio,
            fecha_fin,
            notas: self.notas.trim().to_owned(),
            imagenes: self.imagenes.clone(),
            nombre_pdf: normalize_filename(&self.nombre_pdf).unwrap_or(default_filename),
        })
    }
}

fn parse_form_date(text: &str) -> Result<Option<Date>, ValidationError> {
    let text = text.trim();

    if text.is_empty() {
        return Ok(None);
    }

    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate(text.to_owned()))
}

#[cfg(test)]
mod tests {
    use axum::body::Bytes;
    use time::macros::date;

    use crate::backend::UploadedFile;

    use super::{ReportForm, ReportFormEvent, ReportRequest, ValidationError};

    fn excel_file() -> UploadedFile {
        UploadedFile {
            file_name: "servicios.xlsx".to_owned(),
            content_type: None,
            bytes: Bytes::from_static(b"PK\x03\x04"),
        }
    }

    fn filled_form() -> ReportForm {
        let mut form = ReportForm::new();
        form.apply(ReportFormEvent::FileSelected(excel_file())).unwrap();
        form.apply(ReportFormEvent::StartDateChosen("2024-01-01".to_owned()))
            .unwrap();
        form.apply(ReportFormEvent::EndDateChosen("2024-01-31".to_owned()))
            .unwrap();
        form
    }

    fn submit(form: &ReportForm) -> Result<ReportRequest, ValidationError> {
        form.submit("Relacion_Servicios_2024-02-01_09-00-00.pdf".to_owned())
    }

    #[test]
    fn valid_submission_yields_request() {
        let mut form = filled_form();
        form.apply(ReportFormEvent::NotesEdited("  Enero  ".to_owned()))
            .unwrap();

        let request = submit(&form).unwrap();

        assert_eq!(request.fecha_inicio, date!(2024 - 01 - 01));
        assert_eq!(request.fecha_fin, date!(2024 - 01 - 31));
        assert_eq!(request.notas, "Enero");
        assert_eq!(request.nombre_pdf, "Relacion_Servicios_2024-02-01_09-00-00.pdf");
    }

    #[test]
    fn user_filename_overrides_default() {
        let mut form = filled_form();
        form.apply(ReportFormEvent::FilenameSet("enero".to_owned()))
            .unwrap();

        let request = submit(&form).unwrap();

        assert_eq!(request.nombre_pdf, "enero.pdf");
    }

    #[test]
    fn missing_file_is_rejected() {
        let mut form = ReportForm::new();
        form.apply(ReportFormEvent::StartDateChosen("2024-01-01".to_owned()))
            .unwrap();
        form.apply(ReportFormEvent::EndDateChosen("2024-01-31".to_owned()))
            .unwrap();

        assert_eq!(submit(&form), Err(ValidationError::MissingFile));
    }

    #[test]
    fn empty_file_counts_as_missing() {
        let mut form = filled_form();
        form.apply(ReportFormEvent::FileSelected(UploadedFile {
            file_name: String::new(),
            content_type: None,
            bytes: Default::default(),
        }))
        .unwrap();

        assert_eq!(submit(&form), Err(ValidationError::MissingFile));
    }

    #[test]
    fn missing_dates_are_rejected() {
        let mut form = ReportForm::new();
        form.apply(ReportFormEvent::FileSelected(excel_file())).unwrap();

        assert_eq!(submit(&form), Err(ValidationError::MissingStartDate));

        form.apply(ReportFormEvent::StartDateChosen("2024-01-01".to_owned()))
            .unwrap();
        assert_eq!(submit(&form), Err(ValidationError::MissingEndDate));
    }

    #[test]
    fn invalid_date_is_rejected_and_form_unchanged() {
        let mut form = filled_form();

        let result = form.apply(ReportFormEvent::StartDateChosen("31/01/2024".to_owned()));

        assert_eq!(result, Err(ValidationError::InvalidDate("31/01/2024".to_owned())));
        assert_eq!(form.fecha_inicio, Some(date!(2024 - 01 - 01)));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut form = filled_form();
        form.apply(ReportFormEvent::EndDateChosen("2023-12-31".to_owned()))
            .unwrap();

        assert_eq!(submit(&form), Err(ValidationError::EndBeforeStart));
    }

    #[test]
    fn same_day_range_is_allowed() {
        let mut form = filled_form();
        form.apply(ReportFormEvent::EndDateChosen("2024-01-01".to_owned()))
            .unwrap();

        assert!(submit(&form).is_ok());
    }

    #[test]
    fn submitting_leaves_the_form_usable() {
        let form = filled_form();

        let first = submit(&form).unwrap();
        let second = submit(&form).unwrap();

        assert_eq!(first, second);
    }
}
