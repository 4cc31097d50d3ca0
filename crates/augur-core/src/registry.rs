//! Client session registry.
//!
//! Tracks the set of currently connected client sessions. The registry is
//! the only state shared across connection tasks: a mutex-guarded map is
//! sufficient since entries are independent and no transactional semantics
//! are needed.
//!
//! [`SessionRegistry::is_active`] is a cheap cancellation check consulted
//! by relay tasks before each write, not a hard lock — a client that
//! disconnects between the check and the write simply turns the write into
//! a no-op failure at the sink.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;
use uuid::Uuid;

/// Identity of one accepted client connection.
pub type SessionId = Uuid;

#[derive(Debug, Default)]
struct SessionState {
    /// True while a relay turn is in flight for this connection.
    turn_active: bool,
}

/// Concurrent-safe set of live client sessions, owned by the top-level
/// server component and passed to the dispatcher and relay by reference.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, SessionState>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a newly accepted connection and return its session id.
    pub fn register(&self) -> SessionId {
        let id = Uuid::new_v4();
        self.sessions
            .lock()
            .unwrap()
            .insert(id, SessionState::default());
        debug!(session = %id, "session registered");
        id
    }

    /// Remove a connection on disconnect or explicit close. Idempotent.
    pub fn unregister(&self, id: SessionId) {
        if self.sessions.lock().unwrap().remove(&id).is_some() {
            debug!(session = %id, "session unregistered");
        }
    }

    /// Whether the connection is still live.
    #[must_use]
    pub fn is_active(&self, id: SessionId) -> bool {
        self.sessions.lock().unwrap().contains_key(&id)
    }

    /// Claim the single relay turn for this connection.
    ///
    /// Returns false when the session is gone or a previous turn is still
    /// in flight; the protocol is single-turn-per-connection.
    pub fn begin_turn(&self, id: SessionId) -> bool {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(&id) {
            Some(state) if !state.turn_active => {
                state.turn_active = true;
                true
            }
            _ => false,
        }
    }

    /// Release the relay turn. Idempotent; a no-op once the session is
    /// unregistered.
    pub fn end_turn(&self, id: SessionId) {
        if let Some(state) = self.sessions.lock().unwrap().get_mut(&id) {
            state.turn_active = false;
        }
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
