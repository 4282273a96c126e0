use crate::adapters::session::{SessionError, SessionState, SessionStore};
use async_trait::async_trait;
use redis::AsyncCommands;

const KEY_PREFIX: &str = "roomboard:session:";

/// Session storage in Redis. Each session is one JSON value written with
/// `SET EX`, so the token record is always replaced in a single command.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: redis::aio::ConnectionManager,
    ttl_secs: u64,
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore").field("ttl_secs", &self.ttl_secs).finish_non_exhaustive()
    }
}

impl RedisSessionStore {
    /// Connects to Redis at `url`.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the connection fails.
    pub async fn connect(url: &str, ttl_secs: u64) -> Result<Self, SessionError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn, ttl_secs })
    }

    fn key(id: &str) -> String {
        format!("{KEY_PREFIX}{id}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionState>, SessionError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::key(id)).await?;
        raw.map(|json| serde_json::from_str(&json)).transpose().map_err(SessionError::from)
    }

    async fn save(&self, id: &str, state: &SessionState) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(state)?;
        let _: () = conn.set_ex(Self::key(id), json, self.ttl_secs).await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(Self::key(id)).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}
