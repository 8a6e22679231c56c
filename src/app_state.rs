//! Implements a struct that holds the state of the dashboard server.

use crate::{
    Error, backend::BackendClient, config::Config, requests::LatestRequests,
    session::SessionStore, timezone::get_local_offset,
};

/// The state of the dashboard server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The client for the report backend.
    pub backend: BackendClient,

    /// The most recent request of each kind, used to drop superseded results.
    pub latest_requests: LatestRequests,

    /// The expense workflows, one per browser session.
    pub sessions: SessionStore,

    /// The local timezone as a canonical timezone name, e.g. "America/Bogota".
    pub local_timezone: String,

    /// The largest request body accepted, in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create a new [AppState] from the server `config`.
    ///
    /// # Errors
    /// Returns an error if the timezone in `config` is not a canonical
    /// timezone name or the backend client cannot be built.
    pub fn new(config: &Config) -> Result<Self, Error> {
        if get_local_offset(&config.timezone).is_none() {
            return Err(Error::InvalidTimezoneError(config.timezone.clone()));
        }

        let backend = BackendClient::new(&config.api_base_url, config.request_timeout())?;
        tracing::info!("Using report backend at {}", backend.base_url());

        Ok(Self {
            backend,
            latest_requests: LatestRequests::new(),
            sessions: SessionStore::new(),
            local_timezone: config.timezone.clone(),
            max_upload_bytes: config.max_upload_bytes(),
        })
    }
}
