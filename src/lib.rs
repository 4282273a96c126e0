#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;
pub mod workers;

use crate::adapters::graph::GraphClient;
use crate::adapters::rooms::RoomDirectory;
use crate::adapters::session::{MemorySessionStore, RedisSessionStore, SessionStore};
use crate::api::{AppState, MgmtState};
use crate::config::{Config, SessionConfig};
use crate::services::calendar_service::CalendarService;
use crate::services::health_service::HealthService;
use crate::services::token_service::{TokenService, build_http_client};
use crate::workers::SessionCleanupWorker;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// The session backend chosen at startup. Only the in-memory store needs a
/// background sweeper.
#[derive(Debug, Clone)]
pub enum SessionBackend {
    Memory(Arc<MemorySessionStore>),
    Redis(Arc<RedisSessionStore>),
}

impl SessionBackend {
    #[must_use]
    pub fn store(&self) -> Arc<dyn SessionStore> {
        match self {
            Self::Memory(store) => Arc::clone(store) as Arc<dyn SessionStore>,
            Self::Redis(store) => Arc::clone(store) as Arc<dyn SessionStore>,
        }
    }
}

/// Connects to Redis when a URL is configured, otherwise keeps sessions in memory.
///
/// # Errors
/// Returns an error if the Redis connection cannot be established.
pub async fn connect_session_store(config: &SessionConfig) -> anyhow::Result<SessionBackend> {
    match &config.redis_url {
        Some(url) => {
            let store = RedisSessionStore::connect(url, config.ttl_secs).await?;
            tracing::info!("Using Redis session store");
            Ok(SessionBackend::Redis(Arc::new(store)))
        }
        None => {
            tracing::info!("Using in-memory session store");
            Ok(SessionBackend::Memory(Arc::new(MemorySessionStore::new(Duration::from_secs(config.ttl_secs)))))
        }
    }
}

#[derive(Debug, Default)]
pub struct Workers {
    pub session_cleanup: Option<SessionCleanupWorker>,
}

impl Workers {
    #[must_use]
    pub fn spawn_all(self, shutdown_rx: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::new();
        if let Some(worker) = self.session_cleanup {
            tasks.push(tokio::spawn(worker.run(shutdown_rx)));
        }
        tasks
    }
}

#[derive(Debug)]
pub struct App {
    pub state: AppState,
    pub mgmt: MgmtState,
    pub workers: Workers,
}

#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    sessions: Option<SessionBackend>,
    rooms: Option<RoomDirectory>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, sessions: None, rooms: None }
    }

    #[must_use]
    pub fn with_sessions(mut self, sessions: SessionBackend) -> Self {
        self.sessions = Some(sessions);
        self
    }

    #[must_use]
    pub fn with_rooms(mut self, rooms: RoomDirectory) -> Self {
        self.rooms = Some(rooms);
        self
    }

    /// Wires services together. Falls back to the configured session store and
    /// rooms file for anything not supplied explicitly.
    ///
    /// # Errors
    /// Returns an error if the rooms file cannot be read, the session store is
    /// unreachable, or the HTTP client cannot be built.
    pub async fn build(self) -> anyhow::Result<App> {
        let config = self.config;

        let rooms = match self.rooms {
            Some(rooms) => rooms,
            None => RoomDirectory::load(&config.calendar.rooms_file)?,
        };
        tracing::info!(count = rooms.rooms().len(), "Loaded room directory");

        let sessions = match self.sessions {
            Some(sessions) => sessions,
            None => connect_session_store(&config.session).await?,
        };

        let http = build_http_client(config.oauth.http_timeout_secs)?;
        let token_service = TokenService::new(http.clone(), &config.oauth);
        let graph = GraphClient::new(http, &config.graph);
        let calendar_service = CalendarService::new(graph, Arc::new(rooms), config.calendar.clone());
        let health_service = HealthService::new(sessions.store(), HEALTH_CHECK_TIMEOUT);

        let workers = Workers {
            session_cleanup: match &sessions {
                SessionBackend::Memory(store) => {
                    Some(SessionCleanupWorker::new(Arc::clone(store), config.session.cleanup_interval_secs))
                }
                SessionBackend::Redis(_) => None,
            },
        };

        let state = AppState { config, token_service, calendar_service, sessions: sessions.store() };

        Ok(App { state, mgmt: MgmtState { health_service }, workers })
    }
}

/// Routes panics through tracing so they reach the configured log output.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(ToString::to_string).unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();
        tracing::error!(location = %location, payload = %payload, "Panic occurred");
    }));
}

/// Flips the shutdown channel on Ctrl+C or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}
