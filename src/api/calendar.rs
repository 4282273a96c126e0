use crate::api::AppState;
use crate::api::middleware::AccessToken;
use crate::api::views::{MeetingsView, RoomsView, render};
use crate::error::Result;
use axum::{extract::State, response::Html};

pub async fn rooms(State(state): State<AppState>, AccessToken(token): AccessToken) -> Result<Html<String>> {
    let board = state.calendar_service.room_availability(&token).await?;
    render(&RoomsView {
        user: &board.user,
        board: &board,
        time_zone: &state.config.calendar.time_zone,
        interval_mins: state.config.calendar.availability_interval_mins,
    })
}

pub async fn meetings(State(state): State<AppState>, AccessToken(token): AccessToken) -> Result<Html<String>> {
    let board = state.calendar_service.meeting_responses(&token).await?;
    render(&MeetingsView { user: &board.user, board: &board })
}
