use crate::domain::token::DEFAULT_EXPIRY_MARGIN_SECS;
use clap::builder::NonEmptyStringValueParser;
use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub oauth: OAuthConfig,

    #[command(flatten)]
    pub graph: GraphConfig,

    #[command(flatten)]
    pub session: SessionConfig,

    #[command(flatten)]
    pub calendar: CalendarConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "ROOMBOARD_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "ROOMBOARD_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Port for the management (health) listener
    #[arg(long, env = "ROOMBOARD_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// Externally visible base URL, used to build the OAuth redirect URI
    #[arg(long, env = "ROOMBOARD_PUBLIC_URL", default_value = "http://localhost:5000")]
    pub public_url: String,

    /// Seconds to wait for in-flight work after a shutdown signal
    #[arg(long, env = "ROOMBOARD_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// The redirect target registered with the identity provider.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("{}/authorize", self.public_url.trim_end_matches('/'))
    }
}

#[derive(Clone, Debug, Args)]
pub struct OAuthConfig {
    /// Directory (tenant) identifier of the app registration
    #[arg(long, env = "AZURE_TENANT_ID", value_parser = NonEmptyStringValueParser::new())]
    pub tenant_id: String,

    /// Application (client) identifier
    #[arg(long, env = "AZURE_APP_ID", value_parser = NonEmptyStringValueParser::new())]
    pub client_id: String,

    /// Client secret of the app registration
    #[arg(long, env = "AZURE_APP_SECRET", value_parser = NonEmptyStringValueParser::new(), hide_env_values = true)]
    pub client_secret: String,

    /// Base URL of the identity provider
    #[arg(long, env = "ROOMBOARD_AUTHORITY_URL", default_value = "https://login.microsoftonline.com")]
    pub authority_url: String,

    /// Seconds subtracted from the provider-declared token lifetime
    #[arg(long, env = "ROOMBOARD_TOKEN_EXPIRY_MARGIN_SECS", default_value_t = DEFAULT_EXPIRY_MARGIN_SECS)]
    pub expiry_margin_secs: i64,

    /// Timeout for token endpoint and Graph calls; the HTTP client default applies when unset
    #[arg(long, env = "ROOMBOARD_HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: Option<u64>,
}

impl OAuthConfig {
    #[must_use]
    pub fn authority(&self) -> String {
        format!("{}/{}", self.authority_url.trim_end_matches('/'), self.tenant_id)
    }

    #[must_use]
    pub fn authorize_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/authorize", self.authority())
    }

    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority())
    }
}

#[derive(Clone, Debug, Args)]
pub struct GraphConfig {
    /// Base URL of the Microsoft Graph API
    #[arg(long = "graph-url", env = "ROOMBOARD_GRAPH_URL", default_value = "https://graph.microsoft.com")]
    pub base_url: String,

    /// User agent sent with every Graph request
    #[arg(
        long = "graph-user-agent",
        env = "ROOMBOARD_GRAPH_USER_AGENT",
        default_value = concat!("roomboard/", env!("CARGO_PKG_VERSION"))
    )]
    pub user_agent: String,
}

#[derive(Clone, Debug, Args)]
pub struct SessionConfig {
    /// Redis URL for session storage; sessions are kept in memory when unset
    #[arg(long, env = "ROOMBOARD_REDIS_URL")]
    pub redis_url: Option<String>,

    /// Session lifetime in seconds
    #[arg(long = "session-ttl-secs", env = "ROOMBOARD_SESSION_TTL_SECS", default_value_t = 86_400)]
    pub ttl_secs: u64,

    /// How often expired in-memory sessions are evicted; 0 disables eviction
    #[arg(
        long = "session-cleanup-interval-secs",
        env = "ROOMBOARD_SESSION_CLEANUP_INTERVAL_SECS",
        default_value_t = 300
    )]
    pub cleanup_interval_secs: u64,

    /// Mark the session cookie as Secure (HTTPS only)
    #[arg(long = "session-cookie-secure", env = "ROOMBOARD_SESSION_COOKIE_SECURE", default_value_t = false)]
    pub cookie_secure: bool,
}

#[derive(Clone, Debug, Args)]
pub struct CalendarConfig {
    /// CSV file listing the bookable rooms (name,email[,capacity])
    #[arg(long, env = "ROOMBOARD_ROOMS_FILE", default_value = "data/rooms.csv")]
    pub rooms_file: PathBuf,

    /// Number of days, starting today, covered by availability and meeting views
    #[arg(long, env = "ROOMBOARD_SCHEDULE_DAYS", default_value_t = 3)]
    pub schedule_days: u32,

    /// Time zone name passed to Graph for schedule windows
    #[arg(long, env = "ROOMBOARD_SCHEDULE_TIME_ZONE", default_value = "Eastern Standard Time")]
    pub time_zone: String,

    /// Fixed UTC offset in minutes of the schedule time zone, used to pick "today"
    #[arg(
        long,
        env = "ROOMBOARD_SCHEDULE_UTC_OFFSET_MINS",
        default_value_t = -300,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(i32).range(-1080..=1080)
    )]
    pub utc_offset_mins: i32,

    /// Length of one availability slot in minutes
    #[arg(long, env = "ROOMBOARD_AVAILABILITY_INTERVAL_MINS", default_value_t = 30)]
    pub availability_interval_mins: u32,

    /// Maximum number of meetings shown in the response summary
    #[arg(long, env = "ROOMBOARD_MEETINGS_LIMIT", default_value_t = 25)]
    pub meetings_limit: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "ROOMBOARD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; traces and metrics are only exported when set
    #[arg(long, env = "ROOMBOARD_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Parses the configuration from the command line and environment.
    ///
    /// Exits the process with a usage error when a required identifier is missing.
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 7] = [
        "roomboard",
        "--tenant-id",
        "contoso",
        "--client-id",
        "app-123",
        "--client-secret",
        "s3cret",
    ];

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(REQUIRED).unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.oauth.expiry_margin_secs, DEFAULT_EXPIRY_MARGIN_SECS);
        assert_eq!(config.calendar.utc_offset_mins, -300);
        assert_eq!(config.calendar.schedule_days, 3);
        assert_eq!(config.calendar.availability_interval_mins, 30);
        assert_eq!(config.telemetry.log_format, LogFormat::Text);
        assert!(config.session.redis_url.is_none());
    }

    #[test]
    fn test_endpoints_derived_from_tenant() {
        let config = Config::try_parse_from(REQUIRED).unwrap();

        assert_eq!(
            config.oauth.authorize_endpoint(),
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/authorize"
        );
        assert_eq!(config.oauth.token_endpoint(), "https://login.microsoftonline.com/contoso/oauth2/v2.0/token");
        assert_eq!(config.server.redirect_uri(), "http://localhost:5000/authorize");
    }

    #[test]
    fn test_missing_identifier_is_rejected() {
        let result = Config::try_parse_from(["roomboard", "--tenant-id", "contoso", "--client-id", "app-123"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_identifier_is_rejected() {
        let result = Config::try_parse_from([
            "roomboard",
            "--tenant-id",
            "",
            "--client-id",
            "app-123",
            "--client-secret",
            "s3cret",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_utc_offset_is_bounded() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--utc-offset-mins", "60"]);
        assert_eq!(Config::try_parse_from(args).unwrap().calendar.utc_offset_mins, 60);

        let mut args = REQUIRED.to_vec();
        args.extend(["--utc-offset-mins", "-1500"]);
        assert!(Config::try_parse_from(args).is_err());
    }
}
