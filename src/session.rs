//! Session tracking for active relay connections.
//!
//! The registry is a passive index: streaming handlers insert a session at
//! start and remove it on teardown, and nothing else reads it back. It is
//! owned by the request-handling layer (via `AppState`) rather than living
//! in a module-global, so tests can inject a fresh one per server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

/// One active relay session.
///
/// Cloning shares the same underlying state; the closed flag guards
/// one-shot teardown across clones.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Identifier in `pin-name-timestamp` form.
    id: String,
    /// Session creation time.
    created_at: DateTime<Utc>,
    /// Set once the session's connection has been torn down.
    closed: AtomicBool,
}

impl Session {
    fn new(id: String) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id,
                created_at: Utc::now(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Get the session creation time.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// Mark the session closed. Returns `true` only for the caller that
    /// actually flipped the flag, so teardown runs exactly once.
    pub fn close(&self) -> bool {
        self.inner
            .closed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Whether the session has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

/// Thread-safe registry of active sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a session for `pin`/`name`.
    #[must_use]
    pub fn create(&self, pin: &str, name: &str) -> Session {
        let id = format!("{pin}-{name}-{}", Utc::now().timestamp_millis());
        let session = Session::new(id.clone());
        let mut guard = self.inner.write().unwrap();
        guard.insert(id, session.clone());
        session
    }

    /// Get a session by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Session> {
        let guard = self.inner.read().unwrap();
        guard.get(id).cloned()
    }

    /// Remove a session by ID.
    pub fn remove(&self, id: &str) -> Option<Session> {
        let mut guard = self.inner.write().unwrap();
        guard.remove(id)
    }

    /// Get the number of active sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    /// Check if there are no active sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// List all session IDs.
    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        self.inner.read().unwrap().keys().cloned().collect()
    }
}
