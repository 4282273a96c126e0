use crate::domain::token::TokenRecord;
use async_trait::async_trait;
use base64::Engine;
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub mod memory;
pub mod redis;

pub use memory::MemorySessionStore;
pub use redis::RedisSessionStore;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session backend error: {0}")]
    Backend(#[from] ::redis::RedisError),
    #[error("Session encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Everything kept server-side for one browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub tokens: Option<TokenRecord>,
}

/// Server-side session storage keyed by the session cookie value.
///
/// `save` replaces the whole state in one operation, so a reader never
/// observes a partially updated token record.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    async fn load(&self, id: &str) -> Result<Option<SessionState>, SessionError>;

    async fn save(&self, id: &str, state: &SessionState) -> Result<(), SessionError>;

    async fn remove(&self, id: &str) -> Result<(), SessionError>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<(), SessionError>;
}

/// Generates an unguessable session identifier (32 random bytes, URL-safe base64).
#[must_use]
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Request-scoped view of one session: its id, the state loaded at the start
/// of the request, and the store that persists changes.
#[derive(Debug, Clone)]
pub struct SessionContext {
    id: String,
    is_new: bool,
    state: SessionState,
    store: Arc<dyn SessionStore>,
}

impl SessionContext {
    /// Resolves the session named by the cookie, starting a fresh one when the
    /// cookie is absent or no longer known to the store.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub async fn load(store: Arc<dyn SessionStore>, id: Option<&str>) -> Result<Self, SessionError> {
        if let Some(id) = id
            && let Some(state) = store.load(id).await?
        {
            return Ok(Self { id: id.to_string(), is_new: false, state, store });
        }

        Ok(Self::fresh(store))
    }

    #[must_use]
    pub fn fresh(store: Arc<dyn SessionStore>) -> Self {
        Self { id: generate_session_id(), is_new: true, state: SessionState::default(), store }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.is_new
    }

    #[must_use]
    pub const fn tokens(&self) -> Option<&TokenRecord> {
        self.state.tokens.as_ref()
    }

    /// Persists `record` as the session's token record, replacing any previous one.
    /// The in-memory view is only updated once the store accepted the write.
    ///
    /// # Errors
    /// Returns an error if the store rejects the write.
    pub async fn store_tokens(&mut self, record: TokenRecord) -> Result<(), SessionError> {
        let next = SessionState { tokens: Some(record), ..self.state.clone() };
        self.store.save(&self.id, &next).await?;
        self.state = next;
        self.is_new = false;
        Ok(())
    }

    /// Removes the session from the store.
    ///
    /// # Errors
    /// Returns an error if the store cannot be reached.
    pub async fn destroy(self) -> Result<(), SessionError> {
        self.store.remove(&self.id).await
    }
}
