use crate::adapters::session::SessionStore;
use opentelemetry::{KeyValue, global, metrics::Gauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Clone, Debug)]
pub struct Metrics {
    pub status: Gauge<i64>,
}

impl Metrics {
    #[must_use]
    pub(crate) fn new() -> Self {
        let meter = global::meter("roomboard-server");
        Self {
            status: meter
                .i64_gauge("roomboard_health_status")
                .with_description("Status of health checks (1 for ok, 0 for error)")
                .build(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct HealthService {
    sessions: Arc<dyn SessionStore>,
    check_timeout: Duration,
    metrics: Metrics,
}

impl HealthService {
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionStore>, check_timeout: Duration) -> Self {
        Self { sessions, check_timeout, metrics: Metrics::new() }
    }

    /// Checks that the session store answers within the check timeout.
    ///
    /// # Errors
    /// Returns a string describing the failure if the store is unreachable.
    pub async fn check_sessions(&self) -> Result<(), String> {
        match timeout(self.check_timeout, self.sessions.ping()).await {
            Ok(Ok(())) => {
                self.metrics.status.record(1, &[KeyValue::new("component", "sessions")]);
                Ok(())
            }
            Ok(Err(e)) => {
                self.metrics.status.record(0, &[KeyValue::new("component", "sessions")]);
                Err(format!("Session store check failed: {e}"))
            }
            Err(_) => {
                self.metrics.status.record(0, &[KeyValue::new("component", "sessions")]);
                Err("Session store check timed out".to_string())
            }
        }
    }
}
