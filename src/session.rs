use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::alert::AlertState;

struct SessionEntry {
    alert: AlertState,
    last_seen: DateTime<Utc>,
}

/// Per-session alert memory. Each browser session gets its own `AlertState`;
/// sessions never observe each other's transitions.
pub struct SessionStore {
    sessions: HashMap<Uuid, SessionEntry>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            idle_timeout,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Alert state for `id`, or a fresh one for sessions not seen before.
    pub fn alert_state(&self, id: Uuid) -> AlertState {
        self.sessions
            .get(&id)
            .map(|entry| entry.alert)
            .unwrap_or_default()
    }

    pub fn commit(&mut self, id: Uuid, alert: AlertState, now: DateTime<Utc>) {
        self.sessions.insert(
            id,
            SessionEntry {
                alert,
                last_seen: now,
            },
        );
    }

    pub fn end(&mut self, id: Uuid) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Drops sessions idle for longer than the timeout and returns how many.
    pub fn evict_idle(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        let timeout = self.idle_timeout;
        self.sessions
            .retain(|_, entry| now.signed_duration_since(entry.last_seen) <= timeout);
        before - self.sessions.len()
    }
}
