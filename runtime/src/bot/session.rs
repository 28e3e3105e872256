//! Per-user search results, consulted by download buttons.

use crate::search::SearchHit;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Idle time after which a user's results are forgotten.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// The hits behind one user's last `/search`.
#[derive(Debug, Clone)]
pub struct SearchSession {
    hits: Vec<SearchHit>,
    last_accessed: Instant,
}

impl SearchSession {
    fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            last_accessed: Instant::now(),
        }
    }

    fn is_expired(&self, timeout: Duration) -> bool {
        self.last_accessed.elapsed() > timeout
    }
}

/// Sessions keyed by Telegram user id.
pub struct SessionStore {
    sessions: DashMap<i64, SearchSession>,
    timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            timeout,
        }
    }

    /// Replace the user's results.
    pub fn store(&self, user_id: i64, hits: Vec<SearchHit>) {
        self.sessions.insert(user_id, SearchSession::new(hits));
    }

    /// The hit behind button `index`, if the session is live and the index in range.
    pub fn hit(&self, user_id: i64, index: usize) -> Option<SearchHit> {
        let mut entry = self.sessions.get_mut(&user_id)?;
        if entry.is_expired(self.timeout) {
            drop(entry);
            self.sessions.remove(&user_id);
            return None;
        }
        entry.last_accessed = Instant::now();
        entry.hits.get(index).cloned()
    }

    /// Drop every expired session.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(self.timeout));
        before - self.sessions.len()
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}
