//! Browser sessions and the per-session expense workflow store.
//!
//! A session is identified by a random `session_id` cookie. Nothing is
//! persisted: restarting the server discards every session, and sessions
//! left idle for [SESSION_TTL] are dropped.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use uuid::Uuid;

use crate::{Error, expenses::ExpenseWorkflow};

pub(crate) const COOKIE_SESSION_ID: &str = "session_id";

/// How long a session may go without a request before its expenses are
/// discarded.
pub const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Identifies one browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Get the session ID from `jar`, starting a new session if the cookie is
/// missing or malformed.
///
/// Returns the jar that must be sent back with the response so that a new
/// session cookie reaches the browser.
pub fn get_or_create_session(jar: CookieJar) -> (CookieJar, SessionId) {
    if let Some(session_id) = jar
        .get(COOKIE_SESSION_ID)
        .and_then(|cookie| SessionId::parse(cookie.value()))
    {
        return (jar, session_id);
    }

    let session_id = SessionId::new();
    tracing::debug!("starting new session {session_id}");

    let jar = jar.add(
        Cookie::build((COOKIE_SESSION_ID, session_id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict),
    );

    (jar, session_id)
}

#[derive(Debug)]
struct Session {
    workflow: ExpenseWorkflow,
    last_seen: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            workflow: ExpenseWorkflow::default(),
            last_seen: Instant::now(),
        }
    }
}

/// In-memory expense workflows keyed by session.
///
/// Idle sessions are swept whenever a workflow is updated.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, Session>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that drops sessions idle for longer than `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            ttl,
        }
    }

    /// Run `f` on the session's workflow, creating an empty one if needed.
    ///
    /// The lock is released before this function returns, so `f` must not
    /// block.
    ///
    /// # Errors
    /// Returns [Error::SessionLockError] if the store's lock is poisoned.
    pub fn update<R>(
        &self,
        session_id: SessionId,
        f: impl FnOnce(&mut ExpenseWorkflow) -> R,
    ) -> Result<R, Error> {
        let mut sessions = self.lock()?;
        self.sweep(&mut sessions);

        let session = sessions.entry(session_id).or_insert_with(Session::new);
        session.last_seen = Instant::now();

        Ok(f(&mut session.workflow))
    }

    /// A copy of the session's workflow, empty if the session has none yet
    /// or it has expired.
    ///
    /// # Errors
    /// Returns [Error::SessionLockError] if the store's lock is poisoned.
    pub fn snapshot(&self, session_id: SessionId) -> Result<ExpenseWorkflow, Error> {
        let mut sessions = self.lock()?;

        match sessions.get_mut(&session_id) {
            Some(session) if session.last_seen.elapsed() < self.ttl => {
                session.last_seen = Instant::now();
                Ok(session.workflow.clone())
            }
            _ => Ok(ExpenseWorkflow::default()),
        }
    }

    /// Number of sessions currently held.
    #[cfg(test)]
    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|sessions| sessions.len()).unwrap_or_default()
    }

    fn sweep(&self, sessions: &mut HashMap<SessionId, Session>) {
        let before = sessions.len();
        sessions.retain(|_, session| session.last_seen.elapsed() < self.ttl);

        let swept = before - sessions.len();
        if swept > 0 {
            tracing::debug!("dropped {swept} idle sessions");
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, Session>>, Error> {
        self.sessions
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire session lock: {error}"))
            .map_err(|_| Error::SessionLockError)
    }
}
