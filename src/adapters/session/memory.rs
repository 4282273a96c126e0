use crate::adapters::session::{SessionError, SessionState, SessionStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry {
    state: SessionState,
    expires_at: Instant,
}

/// In-process session storage. Sessions vanish on restart.
#[derive(Debug)]
pub struct MemorySessionStore {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { entries: DashMap::new(), ttl }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired session and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionState>, SessionError> {
        let now = Instant::now();
        let state = self.entries.get(id).filter(|e| e.expires_at > now).map(|e| e.state.clone());

        if state.is_none() {
            self.entries.remove_if(id, |_, e| e.expires_at <= now);
        }

        Ok(state)
    }

    async fn save(&self, id: &str, state: &SessionState) -> Result<(), SessionError> {
        let entry = Entry { state: state.clone(), expires_at: Instant::now() + self.ttl };
        self.entries.insert(id.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), SessionError> {
        self.entries.remove(id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_remove() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        store.save("abc", &SessionState::default()).await.unwrap();

        assert_eq!(store.load("abc").await.unwrap(), Some(SessionState::default()));
        assert_eq!(store.load("other").await.unwrap(), None);

        store.remove("abc").await.unwrap();
        assert_eq!(store.load("abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_not_returned() {
        let store = MemorySessionStore::new(Duration::ZERO);
        store.save("abc", &SessionState::default()).await.unwrap();

        assert_eq!(store.load("abc").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemorySessionStore::new(Duration::ZERO);
        store.save("a", &SessionState::default()).await.unwrap();
        store.save("b", &SessionState::default()).await.unwrap();
        assert_eq!(store.len(), 2);

        assert_eq!(store.purge_expired(), 2);
        assert!(store.is_empty());
    }
}
