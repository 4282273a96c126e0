#![allow(dead_code)]
use clap::Parser;
use roomboard_server::adapters::rooms::RoomDirectory;
use roomboard_server::adapters::session::{MemorySessionStore, SessionState, SessionStore};
use roomboard_server::config::Config;
use roomboard_server::domain::room::Room;
use roomboard_server::domain::token::TokenRecord;
use roomboard_server::{AppBuilder, SessionBackend, api};
use std::sync::{Arc, Once};
use std::time::Duration;
use time::OffsetDateTime;
use wiremock::MockServer;

static INIT: Once = Once::new();

pub const TENANT: &str = "contoso";
pub const TOKEN_PATH: &str = "/contoso/oauth2/v2.0/token";
pub const SESSION_COOKIE: &str = "roomboard_session";

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("roomboard_server=debug".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().init();
    });
}

pub fn redis_url() -> String {
    setup_tracing();
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
}

pub fn test_rooms() -> RoomDirectory {
    RoomDirectory::new(vec![
        Room { name: "Boardroom".into(), email: "boardroom@contoso.com".into(), capacity: Some(12) },
        Room { name: "Huddle 2".into(), email: "huddle2@contoso.com".into(), capacity: None },
    ])
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub provider: MockServer,
    pub sessions: Arc<MemorySessionStore>,
    pub client: reqwest::Client,
    pub config: Config,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_rooms(test_rooms()).await
    }

    /// Starts the app on ephemeral ports, with both the identity provider and
    /// the calendar API served by one mock server.
    pub async fn spawn_with_rooms(rooms: RoomDirectory) -> Self {
        setup_tracing();
        let provider = MockServer::start().await;

        let api_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_url = format!("http://{}", api_listener.local_addr().unwrap());
        let mgmt_url = format!("http://{}", mgmt_listener.local_addr().unwrap());

        let provider_uri = provider.uri();
        let config = Config::try_parse_from([
            "roomboard",
            "--tenant-id",
            TENANT,
            "--client-id",
            "app-123",
            "--client-secret",
            "s3cret",
            "--authority-url",
            provider_uri.as_str(),
            "--graph-url",
            provider_uri.as_str(),
            "--public-url",
            server_url.as_str(),
            "--time-zone",
            "UTC",
        ])
        .unwrap();

        let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(config.session.ttl_secs)));
        let app = AppBuilder::new(config.clone())
            .with_sessions(SessionBackend::Memory(Arc::clone(&sessions)))
            .with_rooms(rooms)
            .build()
            .await
            .unwrap();

        let app_router = api::app_router(app.state);
        let mgmt_router = api::mgmt_router(app.mgmt);
        tokio::spawn(async move { axum::serve(api_listener, app_router).await.unwrap() });
        tokio::spawn(async move { axum::serve(mgmt_listener, mgmt_router).await.unwrap() });

        let client = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none()).build().unwrap();

        Self { server_url, mgmt_url, provider, sessions, client, config }
    }

    /// Stores a token record under a new session id and returns the cookie value.
    pub async fn seed_session(&self, access_token: &str, refresh_token: &str, expires_at: OffsetDateTime) -> String {
        let id = roomboard_server::adapters::session::generate_session_id();
        let state = SessionState {
            tokens: Some(TokenRecord {
                access_token: access_token.to_string(),
                refresh_token: refresh_token.to_string(),
                expires_at,
            }),
        };
        self.sessions.save(&id, &state).await.unwrap();
        id
    }

    pub async fn stored_tokens(&self, id: &str) -> Option<TokenRecord> {
        self.sessions.load(id).await.unwrap().and_then(|s| s.tokens)
    }

    pub async fn get(&self, path: &str, session_id: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(format!("{}{}", self.server_url, path));
        if let Some(id) = session_id {
            request = request.header("cookie", format!("{SESSION_COOKIE}={id}"));
        }
        request.send().await.unwrap()
    }
}

/// Extracts the session id from a `Set-Cookie` response header, if one was set.
pub fn session_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix(&format!("{SESSION_COOKIE}=")))
        .map(|rest| rest.split(';').next().unwrap_or("").to_string())
        .filter(|v| !v.is_empty())
}

pub fn location(response: &reqwest::Response) -> String {
    response.headers().get("location").unwrap().to_str().unwrap().to_string()
}
