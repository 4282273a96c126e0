use crate::adapters::session::SessionContext;
use crate::api::AppState;
use crate::api::middleware::{Session, removal_cookie, session_cookie};
use crate::api::views::{LoginView, render};
use crate::error::{AppError, Result};
use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

pub async fn login(State(state): State<AppState>) -> Result<Html<String>> {
    let signin_url = state.token_service.build_authorization_url(&state.config.server.redirect_uri());
    render(&LoginView { signin_url: &signin_url })
}

pub async fn signin(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.token_service.build_authorization_url(&state.config.server.redirect_uri()))
}

/// OAuth redirect target: trades the authorization code for tokens and
/// starts a new session holding them.
pub async fn authorize(
    State(state): State<AppState>,
    Session(previous): Session,
    jar: CookieJar,
    Query(params): Query<AuthorizeParams>,
) -> Result<(CookieJar, Redirect)> {
    if let Some(error) = params.error {
        return Err(AppError::SignInFailed(params.error_description.unwrap_or(error)));
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::SignInFailed("The identity provider did not return an authorization code".into()))?;

    // Tokens always land in a freshly issued session id.
    let mut session = SessionContext::fresh(Arc::clone(&state.sessions));
    state
        .token_service
        .exchange_code_for_token(&mut session, &code, &state.config.server.redirect_uri())
        .await
        .map_err(|e| AppError::SignInFailed(e.to_string()))?;

    if !previous.is_new()
        && let Err(e) = previous.destroy().await
    {
        tracing::warn!(error = %e, "Failed to remove previous session");
    }

    tracing::info!("User signed in");
    let jar = jar.add(session_cookie(&state.config.session, session.id()));
    Ok((jar, Redirect::to("/rooms")))
}

pub async fn signout(Session(session): Session, jar: CookieJar) -> Result<(CookieJar, Redirect)> {
    if !session.is_new() {
        session.destroy().await?;
        tracing::info!("User signed out");
    }
    Ok((jar.remove(removal_cookie()), Redirect::to("/")))
}
