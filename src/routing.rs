//! Application router configuration.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    analytics::{get_analytics_page, post_analytics},
    endpoints,
    expenses::{
        add_consignment, add_expense, clear_expenses, delete_consignment, delete_expense,
        delete_support_image, download_expenses_pdf, get_expenses_page, upload_support_images,
    },
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    report::{
        download_pendientes_pdf, download_relacion_pdf, get_pendientes_page, get_relacion_page,
        preview_pendientes, preview_relacion,
    },
};

/// Return a router with all the app's routes.
///
/// Request bodies may be up to [AppState::max_upload_bytes] long.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::RELACION_VIEW, get(get_relacion_page))
        .route(endpoints::PENDIENTES_VIEW, get(get_pendientes_page))
        .route(endpoints::ANALYTICS_VIEW, get(get_analytics_page))
        .route(endpoints::EXPENSES_VIEW, get(get_expenses_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let report_routes = Router::new()
        .route(endpoints::RELACION_PREVIEW, post(preview_relacion))
        .route(endpoints::RELACION_PDF, post(download_relacion_pdf))
        .route(endpoints::PENDIENTES_PREVIEW, post(preview_pendientes))
        .route(endpoints::PENDIENTES_PDF, post(download_pendientes_pdf))
        .route(endpoints::ANALYTICS_API, post(post_analytics));

    let expense_routes = Router::new()
        .route(endpoints::EXPENSES_API, post(add_expense))
        .route(endpoints::DELETE_EXPENSE, delete(delete_expense))
        .route(endpoints::CONSIGNMENTS_API, post(add_consignment))
        .route(endpoints::DELETE_CONSIGNMENT, delete(delete_consignment))
        .route(endpoints::SUPPORT_IMAGES, post(upload_support_images))
        .route(endpoints::DELETE_SUPPORT_IMAGE, delete(delete_support_image))
        .route(endpoints::CLEAR_EXPENSES, post(clear_expenses))
        .route(endpoints::EXPENSES_PDF, post(download_expenses_pdf));

    page_routes
        .merge(report_routes)
        .merge(expense_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// The root path '/' redirects to the service report page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::RELACION_VIEW)
}
