//! Alert messages swapped into the page's alert container.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

const ALERT_STYLE: &str = "flex items-start p-4 mb-4 rounded-lg border text-red-800 \
    border-red-300 bg-red-50 dark:bg-gray-800 dark:text-red-400 dark:border-red-800";

/// A dismissable error message.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    Error { message: String, details: String },
    ErrorSimple { message: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (message, details) = match self {
            Alert::Error { message, details } => (message, details),
            Alert::ErrorSimple { message } => (message, String::new()),
        };

        html! {
            div
                role="alert"
                class=(ALERT_STYLE)
                data-alert-kind="error"
            {
                div class="flex-1"
                {
                    p class="text-sm font-medium" { (message) }

                    @if !details.is_empty() {
                        p class="mt-1 text-sm opacity-80" { (details) }
                    }
                }

                button
                    type="button"
                    class="ms-3 text-sm font-semibold opacity-70 hover:opacity-100"
                    aria-label="Cerrar"
                    onclick="this.closest('[role=alert]').remove()"
                {
                    "×"
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        Html(self.into_html().into_string()).into_response()
    }
}
