//! The API endpoints URIs.
//!
//! For endpoints that take parameters, e.g., '/api/gastos/{index}', use [format_endpoint].

/// The root route which redirects to the service report page.
pub const ROOT: &str = "/";
/// The page for the "Relación de Servicios" report.
pub const RELACION_VIEW: &str = "/relacion-servicios";
/// The page for the "Pendientes de Pago" report.
pub const PENDIENTES_VIEW: &str = "/pendientes";
/// The analytics page.
pub const ANALYTICS_VIEW: &str = "/analiticas";
/// The page for entering expenses and consignments.
pub const EXPENSES_VIEW: &str = "/gastos";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for previewing the rows of the service report.
pub const RELACION_PREVIEW: &str = "/api/relacion-servicios/vista-previa";
/// The route for downloading the service report PDF.
pub const RELACION_PDF: &str = "/api/relacion-servicios/pdf";
/// The route for previewing the rows of the pending payments report.
pub const PENDIENTES_PREVIEW: &str = "/api/pendientes/vista-previa";
/// The route for downloading the pending payments report PDF.
pub const PENDIENTES_PDF: &str = "/api/pendientes/pdf";
/// The route to upload a spreadsheet for analysis.
pub const ANALYTICS_API: &str = "/api/analiticas";
/// The route to add an expense.
pub const EXPENSES_API: &str = "/api/gastos";
/// The route to delete an expense.
pub const DELETE_EXPENSE: &str = "/api/gastos/{index}";
/// The route to add a consignment.
pub const CONSIGNMENTS_API: &str = "/api/consignaciones";
/// The route to delete a consignment.
pub const DELETE_CONSIGNMENT: &str = "/api/consignaciones/{index}";
/// The route to upload support images.
pub const SUPPORT_IMAGES: &str = "/api/soportes";
/// The route to delete a support image.
pub const DELETE_SUPPORT_IMAGE: &str = "/api/soportes/{kind}/{index}";
/// The route to discard all expenses, consignments and images.
pub const CLEAR_EXPENSES: &str = "/api/gastos/limpiar";
/// The route for downloading the expense report PDF.
pub const EXPENSES_PDF: &str = "/api/gastos/pdf";

/// Replace the parameters in `endpoint_path` with `values`, in order.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/gastos/{index}', '{index}' is the
/// parameter.
///
/// Parameters without a matching value are left as they are, as are extra
/// values.
pub fn format_endpoint(endpoint_path: &str, values: &[&str]) -> String {
    let mut formatted = String::with_capacity(endpoint_path.len());
    let mut values = values.iter();
    let mut rest = endpoint_path;

    while let Some(start) = rest.find('{') {
        let Some(length) = rest[start..].find('}') else {
            break;
        };
        let end = start + length + 1;

        formatted.push_str(&rest[..start]);
        match values.next() {
            Some(value) => formatted.push_str(value),
            None => formatted.push_str(&rest[start..end]),
        }
        rest = &rest[end..];
    }

    formatted.push_str(rest);
    formatted
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::RELACION_VIEW);
        assert_endpoint_is_valid_uri(endpoints::PENDIENTES_VIEW);
        assert_endpoint_is_valid_uri(endpoints::ANALYTICS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EXPENSES_VIEW);
        assert_endpoint_is_valid_uri(endpoints::INTERNAL_ERROR_VIEW);
        assert_endpoint_is_valid_uri(endpoints::STATIC);

        assert_endpoint_is_valid_uri(endpoints::RELACION_PREVIEW);
        assert_endpoint_is_valid_uri(endpoints::RELACION_PDF);
        assert_endpoint_is_valid_uri(endpoints::PENDIENTES_PREVIEW);
        assert_endpoint_is_valid_uri(endpoints::PENDIENTES_PDF);
        assert_endpoint_is_valid_uri(endpoints::ANALYTICS_API);
        assert_endpoint_is_valid_uri(endpoints::EXPENSES_API);
        assert_endpoint_is_valid_uri(endpoints::DELETE_EXPENSE);
        assert_endpoint_is_valid_uri(endpoints::CONSIGNMENTS_API);
        assert_endpoint_is_valid_uri(endpoints::DELETE_CONSIGNMENT);
        assert_endpoint_is_valid_uri(endpoints::SUPPORT_IMAGES);
        assert_endpoint_is_valid_uri(endpoints::DELETE_SUPPORT_IMAGE);
        assert_endpoint_is_valid_uri(endpoints::CLEAR_EXPENSES);
        assert_endpoint_is_valid_uri(endpoints::EXPENSES_PDF);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/api/gastos/{index}", &["1"]);

        assert_eq!(formatted_path, "/api/gastos/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn replaces_parameters_in_order() {
        let formatted_path = format_endpoint(endpoints::DELETE_SUPPORT_IMAGE, &["gastos", "2"]);

        assert_eq!(formatted_path, "/api/soportes/gastos/2");
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", &["1"]);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn missing_values_leave_parameter() {
        let formatted_path = format_endpoint("/hello/{a}/{b}", &["1"]);

        assert_eq!(formatted_path, "/hello/1/{b}");
    }
}
