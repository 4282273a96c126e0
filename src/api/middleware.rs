use crate::adapters::session::SessionContext;
use crate::api::AppState;
use crate::config::SessionConfig;
use crate::error::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "roomboard_session";

/// The caller's session, resolved from the session cookie.
#[derive(Debug)]
pub struct Session(pub SessionContext);

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
        let context = SessionContext::load(Arc::clone(&state.sessions), id.as_deref()).await?;
        Ok(Self(context))
    }
}

/// A currently valid access token for the caller, refreshed on demand.
/// Rejects with a redirect to sign-in when none can be obtained.
#[derive(Debug)]
pub struct AccessToken(pub String);

impl FromRequestParts<AppState> for AccessToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Session(mut session) = Session::from_request_parts(parts, state).await?;
        let redirect_uri = state.config.server.redirect_uri();

        state
            .token_service
            .get_valid_access_token(&mut session, &redirect_uri)
            .await
            .map(Self)
            .ok_or(AppError::SignInRequired)
    }
}

#[must_use]
pub fn session_cookie(config: &SessionConfig, id: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(time::Duration::seconds(i64::try_from(config.ttl_secs).unwrap_or(i64::MAX)))
        .build()
}

#[must_use]
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
