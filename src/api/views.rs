use crate::domain::user::UserProfile;
use crate::error::Result;
use crate::services::calendar_service::{MeetingBoard, RoomBoard};
use askama::Template;
use axum::response::Html;

#[derive(Template, Debug)]
#[template(path = "login.html")]
pub struct LoginView<'a> {
    pub signin_url: &'a str,
}

#[derive(Template, Debug)]
#[template(path = "rooms.html")]
pub struct RoomsView<'a> {
    pub user: &'a UserProfile,
    pub board: &'a RoomBoard,
    pub time_zone: &'a str,
    pub interval_mins: u32,
}

#[derive(Template, Debug)]
#[template(path = "meetings.html")]
pub struct MeetingsView<'a> {
    pub user: &'a UserProfile,
    pub board: &'a MeetingBoard,
}

#[derive(Template, Debug)]
#[template(path = "error.html")]
pub struct ErrorView {
    pub status: u16,
    pub reason: &'static str,
    pub suggestion: &'static str,
    pub detail: Option<String>,
    pub signin_path: &'static str,
}

/// Renders a view into an HTML response body.
///
/// # Errors
/// Returns `AppError::Render` if the template fails to render.
pub fn render<T: Template>(view: &T) -> Result<Html<String>> {
    Ok(Html(view.render()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::room::Room;
    use crate::domain::schedule::{Availability, RoomAvailability};
    use time::{Date, Month};

    #[test]
    fn test_login_escapes_url() {
        let html = LoginView { signin_url: "https://login.example/authorize?a=1&b=2" }.render().unwrap();
        assert!(html.contains("href=\"https://login.example/authorize?a=1&amp;b=2\""));
    }

    #[test]
    fn test_rooms_view_renders_strip_and_errors() {
        let user = UserProfile { mail: None, given_name: Some("Ada".into()), surname: None };
        let start = Date::from_calendar_date(2026, Month::October, 19).unwrap();
        let board = RoomBoard {
            user: user.clone(),
            start,
            end: start.next_day().unwrap(),
            rooms: vec![
                RoomAvailability {
                    room: Room { name: "Board <Main>".into(), email: "board@contoso.com".into(), capacity: Some(12) },
                    slots: vec![Availability::Free, Availability::Busy],
                    items: Vec::new(),
                    error: None,
                },
                RoomAvailability {
                    room: Room { name: "Atrium".into(), email: "atrium@contoso.com".into(), capacity: None },
                    slots: Vec::new(),
                    items: Vec::new(),
                    error: Some("Mailbox not found".into()),
                },
            ],
        };

        let html = RoomsView { user: &user, board: &board, time_zone: "UTC", interval_mins: 30 }.render().unwrap();

        assert!(html.contains("Board &lt;Main&gt;"));
        assert!(html.contains("<span class=\"busy\"></span>"));
        assert!(html.contains("50% (1 of 2)"));
        assert!(html.contains("Mailbox not found"));
        assert!(html.contains("Ada"));
        assert!(html.contains("2026-10-19"));
    }

    #[test]
    fn test_error_view() {
        let html = ErrorView {
            status: 429,
            reason: "Too Many Requests",
            suggestion: "Wait a minute.",
            detail: None,
            signin_path: "/",
        }
        .render()
        .unwrap();

        assert!(html.contains("429 Too Many Requests"));
        assert!(html.contains("Wait a minute."));
    }
}
