use crate::adapters::graph::GraphError;
use crate::adapters::session::SessionError;
use crate::api::views::ErrorView;
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;

/// Where users are sent when they need to (re-)authenticate.
pub const SIGN_IN_PATH: &str = "/";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Sign-in required")]
    SignInRequired,
    #[error("Sign-in failed: {0}")]
    SignInFailed(String),
    #[error("Calendar API error: {0}")]
    Graph(#[from] GraphError),
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    #[error("Template error: {0}")]
    Render(#[from] askama::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// A human-readable next step for a failed calendar API call.
#[must_use]
pub const fn suggestion_for(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "The calendar service could not understand the request. Check the room list for malformed addresses.",
        401 => "Your session has expired. Sign in again.",
        403 => {
            "Your account is missing a permission this board needs. Ask an administrator to grant consent for \
             Calendars.Read.Shared."
        }
        404 => "A requested calendar could not be found. Check the room list for mailboxes that no longer exist.",
        429 => "The calendar service is throttling requests. Wait a minute and reload the page.",
        500..=599 => "The calendar service is having problems. Try again in a few minutes.",
        _ => "Something went wrong while talking to the calendar service. Reload the page or sign in again.",
    }
}

fn error_page(status: StatusCode, suggestion: &'static str, detail: Option<String>) -> Response {
    let view = ErrorView {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Error"),
        suggestion,
        detail,
        signin_path: SIGN_IN_PATH,
    };

    match view.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render error page");
            (status, suggestion).into_response()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::SignInRequired | Self::Graph(GraphError::Unauthorized) => {
                tracing::debug!("No usable access token, redirecting to sign-in");
                Redirect::to(SIGN_IN_PATH).into_response()
            }
            Self::SignInFailed(msg) => {
                tracing::warn!(message = %msg, "Sign-in failed");
                error_page(StatusCode::BAD_REQUEST, "Signing in did not complete. Try signing in again.", Some(msg))
            }
            Self::Graph(GraphError::Status { status, body }) => {
                tracing::warn!(status = %status, body = %body, "Calendar API returned an error");
                error_page(status, suggestion_for(status), None)
            }
            Self::Graph(e) => {
                tracing::error!(error = %e, "Calendar API call failed");
                error_page(StatusCode::BAD_GATEWAY, suggestion_for(StatusCode::BAD_GATEWAY), None)
            }
            Self::Session(e) => {
                tracing::error!(error = %e, "Session store error");
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Your session could not be loaded. Try again shortly.",
                    None,
                )
            }
            Self::Render(e) => {
                tracing::error!(error = %e, "Template rendering failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
