//! Keeps only the latest backend request per session and request kind.
//!
//! Each backend call runs as a spawned task. Starting a new call of the same
//! kind for the same session aborts the previous task, and the caller that is
//! still waiting on it gets [Error::Superseded] instead of a stale result.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::task::AbortHandle;

use crate::{Error, session::SessionId};

/// The kinds of backend calls that supersede each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    RelacionPreview,
    RelacionPdf,
    PendientesPreview,
    PendientesPdf,
    Analytics,
    ExpensesPdf,
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    abort_handle: AbortHandle,
}

#[derive(Debug, Default)]
struct Registry {
    next_generation: u64,
    in_flight: HashMap<(SessionId, RequestKind), InFlight>,
}

/// Registry of in-flight backend requests.
#[derive(Debug, Clone, Default)]
pub struct LatestRequests {
    registry: Arc<Mutex<Registry>>,
}

impl LatestRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `future` as the latest request of `kind` for `session_id`.
    ///
    /// # Errors
    /// - [Error::Superseded] if a newer request of the same kind started
    ///   before this one finished. The result is dropped even when the task
    ///   managed to complete.
    /// - [Error::TaskFailed] if the task panicked.
    ///
    /// Dropping the returned future, e.g. when the client disconnects, aborts
    /// the task.
    pub async fn run<F, T>(
        &self,
        session_id: SessionId,
        kind: RequestKind,
        future: F,
    ) -> Result<T, Error>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let key = (session_id, kind);
        let handle = tokio::spawn(future);
        let abort_handle = handle.abort_handle();
        let generation = self.register(key, abort_handle.clone());
        let _guard = AbortOnDrop {
            requests: self,
            key,
            generation,
            abort_handle,
        };

        let result = handle.await;
        let is_latest = self.finish(key, generation);

        match result {
            Ok(value) if is_latest => Ok(value),
            Ok(_) => {
                tracing::debug!("discarding superseded {kind:?} result for session {session_id}");
                Err(Error::Superseded)
            }
            Err(error) if error.is_cancelled() => {
                tracing::debug!("{kind:?} request for session {session_id} was superseded");
                Err(Error::Superseded)
            }
            Err(error) => {
                tracing::error!("{kind:?} request for session {session_id} failed: {error}");
                Err(Error::TaskFailed(error.to_string()))
            }
        }
    }

    /// Number of requests currently in flight.
    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    fn register(&self, key: (SessionId, RequestKind), abort_handle: AbortHandle) -> u64 {
        let mut registry = self.lock();
        registry.next_generation += 1;
        let generation = registry.next_generation;

        if let Some(previous) = registry.in_flight.insert(
            key,
            InFlight {
                generation,
                abort_handle,
            },
        ) {
            previous.abort_handle.abort();
        }

        generation
    }

    /// Remove the entry for `key` if it still belongs to `generation`.
    ///
    /// Returns whether `generation` was still the latest request.
    fn finish(&self, key: (SessionId, RequestKind), generation: u64) -> bool {
        let mut registry = self.lock();

        match registry.in_flight.get(&key) {
            Some(in_flight) if in_flight.generation == generation => {
                registry.in_flight.remove(&key);
                true
            }
            _ => false,
        }
    }

    // The registry only holds abort handles, so a poisoned lock leaves it usable.
    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Aborts the task and releases its registry entry if [LatestRequests::run]
/// is dropped before the task finishes.
struct AbortOnDrop<'a> {
    requests: &'a LatestRequests,
    key: (SessionId, RequestKind),
    generation: u64,
    abort_handle: AbortHandle,
}

impl Drop for AbortOnDrop<'_> {
    fn drop(&mut self) {
        if self.abort_handle.is_finished() {
            return;
        }

        self.abort_handle.abort();
        if self.requests.finish(self.key, self.generation) {
            tracing::debug!(
                "{:?} request for session {} was dropped before finishing",
                self.key.1,
                self.key.0
            );
        }
    }
}
