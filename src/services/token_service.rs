use crate::adapters::session::{SessionContext, SessionError};
use crate::config::OAuthConfig;
use crate::domain::token::{TokenGrant, TokenRecord};
use opentelemetry::{KeyValue, global, metrics::Counter};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;

/// Delegated permissions requested at sign-in.
pub const SCOPES: [&str; 5] = ["openid", "offline_access", "User.Read", "Calendars.Read", "Calendars.Read.Shared"];

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Token endpoint returned {status}")]
    Rejected { status: StatusCode, body: String },
    #[error("Malformed token response: {0}")]
    Decode(String),
    #[error("Failed to persist tokens: {0}")]
    Session(#[from] SessionError),
}

#[derive(Clone, Copy, Debug)]
enum Grant {
    AuthorizationCode,
    RefreshToken,
}

impl Grant {
    const fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
        }
    }

    /// Form field carrying the credential being exchanged.
    const fn credential_field(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "code",
            Self::RefreshToken => "refresh_token",
        }
    }
}

#[derive(Clone)]
struct Metrics {
    exchange_total: Counter<u64>,
    refresh_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("roomboard-server");
        Self {
            exchange_total: meter
                .u64_counter("token_exchange_total")
                .with_description("Authorization code exchanges by outcome")
                .build(),
            refresh_total: meter
                .u64_counter("token_refresh_total")
                .with_description("Refresh token exchanges by outcome")
                .build(),
        }
    }

    fn record(&self, grant: Grant, ok: bool) {
        let outcome = [KeyValue::new("outcome", if ok { "success" } else { "failure" })];
        match grant {
            Grant::AuthorizationCode => self.exchange_total.add(1, &outcome),
            Grant::RefreshToken => self.refresh_total.add(1, &outcome),
        }
    }
}

/// Acquires, stores and refreshes the OAuth2 tokens of a user session.
#[derive(Clone)]
pub struct TokenService {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    authorize_endpoint: String,
    token_endpoint: String,
    expiry_margin_secs: i64,
    metrics: Metrics,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("client_id", &self.client_id)
            .field("token_endpoint", &self.token_endpoint)
            .field("expiry_margin_secs", &self.expiry_margin_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates the service. When `http_timeout_secs` is configured, token
    /// endpoint calls are bounded by it; otherwise the client default applies.
    #[must_use]
    pub fn new(http: reqwest::Client, config: &OAuthConfig) -> Self {
        Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            authorize_endpoint: config.authorize_endpoint(),
            token_endpoint: config.token_endpoint(),
            expiry_margin_secs: config.expiry_margin_secs,
            metrics: Metrics::new(),
        }
    }

    /// Builds the provider sign-in URL that redirects back to `redirect_uri`.
    #[must_use]
    pub fn build_authorization_url(&self, redirect_uri: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &SCOPES.join(" "))
            .finish();

        format!("{}?{query}", self.authorize_endpoint)
    }

    /// Exchanges an authorization code for a token record and stores it in the session.
    ///
    /// # Errors
    /// Returns an error, leaving the session untouched, if the endpoint is
    /// unreachable, rejects the code, or returns an incomplete body.
    #[tracing::instrument(skip_all, err(level = "warn"))]
    pub async fn exchange_code_for_token(
        &self,
        session: &mut SessionContext,
        auth_code: &str,
        redirect_uri: &str,
    ) -> Result<TokenRecord, TokenError> {
        self.acquire(session, Grant::AuthorizationCode, auth_code, redirect_uri).await
    }

    /// Exchanges a refresh token for a new record, replacing the stored one.
    ///
    /// # Errors
    /// Returns an error, leaving the previously stored record in place, if the
    /// exchange fails for any reason.
    #[tracing::instrument(skip_all, err(level = "warn"))]
    pub async fn refresh_token(
        &self,
        session: &mut SessionContext,
        refresh_token: &str,
        redirect_uri: &str,
    ) -> Result<TokenRecord, TokenError> {
        self.acquire(session, Grant::RefreshToken, refresh_token, redirect_uri).await
    }

    /// Returns an access token that is valid right now, if the session can provide one.
    ///
    /// A still-valid stored token is returned without any I/O. An expired one
    /// triggers a single refresh attempt; `None` means the user has to sign in again.
    pub async fn get_valid_access_token(&self, session: &mut SessionContext, redirect_uri: &str) -> Option<String> {
        let record = session.tokens()?;
        if record.is_valid_at(OffsetDateTime::now_utc()) {
            return Some(record.access_token.clone());
        }

        tracing::debug!(expired_at = %record.expires_at, "Access token expired, refreshing");
        let refresh_token = record.refresh_token.clone();
        match self.refresh_token(session, &refresh_token, redirect_uri).await {
            Ok(record) => Some(record.access_token),
            Err(_) => None,
        }
    }

    async fn acquire(
        &self,
        session: &mut SessionContext,
        grant: Grant,
        credential: &str,
        redirect_uri: &str,
    ) -> Result<TokenRecord, TokenError> {
        let result = self.request_token(grant, credential, redirect_uri).await;
        let result = match result {
            Ok(record) => session.store_tokens(record.clone()).await.map(|()| record).map_err(TokenError::from),
            Err(e) => Err(e),
        };

        self.metrics.record(grant, result.is_ok());
        if result.is_ok() {
            tracing::info!(grant = grant.as_str(), "Stored new token record");
        }
        result
    }

    async fn request_token(
        &self,
        grant: Grant,
        credential: &str,
        redirect_uri: &str,
    ) -> Result<TokenRecord, TokenError> {
        let scope = SCOPES.join(" ");
        let form = [
            ("grant_type", grant.as_str()),
            (grant.credential_field(), credential),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self.http.post(&self.token_endpoint).form(&form).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let issued_at = OffsetDateTime::now_utc();

        if !status.is_success() {
            tracing::warn!(status = %status, body = %body, "Token endpoint rejected the request");
            return Err(TokenError::Rejected { status, body });
        }

        let grant_body: TokenGrant = serde_json::from_str(&body).map_err(|e| TokenError::Decode(e.to_string()))?;
        grant_body
            .into_record(issued_at, self.expiry_margin_secs)
            .map_err(|field| TokenError::Decode(format!("missing field `{field}`")))
    }
}

/// Builds the HTTP client used for token endpoint and Graph calls.
///
/// # Errors
/// Returns an error if the TLS backend cannot be initialised.
pub fn build_http_client(timeout_secs: Option<u64>) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build()
}
