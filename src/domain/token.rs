use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Default number of seconds shaved off the provider-declared token lifetime.
pub const DEFAULT_EXPIRY_MARGIN_SECS: i64 = 300;

/// The OAuth2 credentials held by a single user session.
///
/// Serialized under the session keys `access_token`, `refresh_token` and
/// `token_expires` (unix seconds).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(rename = "token_expires", with = "time::serde::timestamp")]
    pub expires_at: OffsetDateTime,
}

impl TokenRecord {
    /// A record is usable only while `expires_at` is strictly in the future.
    #[must_use]
    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        now < self.expires_at
    }
}

impl std::fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token endpoint response body. Every field is optional so that a body
/// missing a field is reported as incomplete rather than as a JSON error.
#[derive(Debug, Default, Deserialize)]
pub struct TokenGrant {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

impl TokenGrant {
    /// Converts the grant into a record issued at `issued_at`.
    ///
    /// # Errors
    /// Returns the name of the first missing field, or `expires_in` when the
    /// declared lifetime does not yield a representable expiry.
    pub fn into_record(self, issued_at: OffsetDateTime, margin_secs: i64) -> Result<TokenRecord, &'static str> {
        let access_token = self.access_token.filter(|t| !t.is_empty()).ok_or("access_token")?;
        let refresh_token = self.refresh_token.filter(|t| !t.is_empty()).ok_or("refresh_token")?;
        let expires_in = self.expires_in.ok_or("expires_in")?;
        let expires_at = expires_in
            .checked_sub(margin_secs)
            .and_then(|secs| issued_at.checked_add(Duration::seconds(secs)))
            .ok_or("expires_in")?;

        Ok(TokenRecord { access_token, refresh_token, expires_at })
    }
}
