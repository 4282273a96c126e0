use crate::adapters::graph::{GraphClient, GraphError, ScheduleQuery};
use crate::adapters::rooms::RoomDirectory;
use crate::config::CalendarConfig;
use crate::domain::meeting::MeetingSummary;
use crate::domain::room::Room;
use crate::domain::schedule::RoomAvailability;
use crate::domain::user::UserProfile;
use std::sync::Arc;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

/// Room availability for the signed-in user, together with their profile.
#[derive(Debug, Clone)]
pub struct RoomBoard {
    pub user: UserProfile,
    pub start: Date,
    pub end: Date,
    pub rooms: Vec<RoomAvailability>,
}

#[derive(Debug, Clone)]
pub struct MeetingBoard {
    pub user: UserProfile,
    pub start: Date,
    pub end: Date,
    pub meetings: Vec<MeetingSummary>,
}

/// Combines the room directory and the calendar API into the views the board renders.
#[derive(Clone, Debug)]
pub struct CalendarService {
    graph: GraphClient,
    rooms: Arc<RoomDirectory>,
    config: CalendarConfig,
}

impl CalendarService {
    #[must_use]
    pub const fn new(graph: GraphClient, rooms: Arc<RoomDirectory>, config: CalendarConfig) -> Self {
        Self { graph, rooms, config }
    }

    fn window(&self) -> (Date, Date) {
        self.window_at(OffsetDateTime::now_utc())
    }

    /// The `[start, end)` window starting on `now`'s date in the schedule time zone.
    fn window_at(&self, now: OffsetDateTime) -> (Date, Date) {
        let offset = UtcOffset::from_whole_seconds(self.config.utc_offset_mins * 60).unwrap_or(UtcOffset::UTC);
        let start = now.to_offset(offset).date();
        let end = start.saturating_add(Duration::days(i64::from(self.config.schedule_days)));
        (start, end)
    }

    /// Free/busy view of every configured room.
    ///
    /// Rooms missing from the Graph answer are shown with an error instead of
    /// being dropped.
    ///
    /// # Errors
    /// Returns an error if a calendar API call fails.
    #[tracing::instrument(skip_all, err(level = "warn"))]
    pub async fn room_availability(&self, access_token: &str) -> Result<RoomBoard, GraphError> {
        let (start, end) = self.window();
        let user = self.graph.get_me(access_token).await?;

        let rooms = if self.rooms.rooms().is_empty() {
            Vec::new()
        } else {
            let emails = self.rooms.emails();
            let query = ScheduleQuery {
                schedules: &emails,
                start,
                end,
                time_zone: &self.config.time_zone,
                interval_mins: self.config.availability_interval_mins,
            };
            let schedules = self.graph.get_schedules(access_token, &query).await?;
            merge_schedules(self.rooms.rooms(), schedules)
        };

        Ok(RoomBoard { user, start, end, rooms })
    }

    /// Attendee response summaries for the user's upcoming meetings.
    ///
    /// # Errors
    /// Returns an error if a calendar API call fails.
    #[tracing::instrument(skip_all, err(level = "warn"))]
    pub async fn meeting_responses(&self, access_token: &str) -> Result<MeetingBoard, GraphError> {
        let (start, end) = self.window();
        let user = self.graph.get_me(access_token).await?;
        let meetings = self.graph.get_calendar_view(access_token, start, end, self.config.meetings_limit).await?;

        Ok(MeetingBoard { user, start, end, meetings })
    }
}

/// Pairs each configured room with its schedule, keeping the room order of the directory.
fn merge_schedules(
    rooms: &[Room],
    schedules: Vec<crate::adapters::graph::ScheduleInformation>,
) -> Vec<RoomAvailability> {
    let mut schedules: Vec<_> = schedules.into_iter().map(Some).collect();

    rooms
        .iter()
        .map(|room| {
            let found = schedules
                .iter_mut()
                .find(|s| s.as_ref().is_some_and(|s| s.schedule_id.eq_ignore_ascii_case(&room.email)))
                .and_then(Option::take);

            found.map_or_else(
                || RoomAvailability {
                    room: room.clone(),
                    slots: Vec::new(),
                    items: Vec::new(),
                    error: Some("No schedule returned for this room".to_string()),
                },
                |schedule| schedule.into_availability(room.clone()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn room(name: &str, email: &str) -> Room {
        Room { name: name.into(), email: email.into(), capacity: None }
    }

    fn service(server: &MockServer, rooms: Vec<Room>) -> CalendarService {
        let graph = GraphClient::new(
            reqwest::Client::new(),
            &GraphConfig { base_url: server.uri(), user_agent: "test".into() },
        );
        let config = CalendarConfig {
            rooms_file: "unused.csv".into(),
            schedule_days: 3,
            time_zone: "UTC".into(),
            utc_offset_mins: 0,
            availability_interval_mins: 60,
            meetings_limit: 10,
        };
        CalendarService::new(graph, Arc::new(RoomDirectory::new(rooms)), config)
    }

    #[tokio::test]
    async fn test_window_starts_on_local_date() {
        let server = MockServer::start().await;
        let mut service = service(&server, Vec::new());
        let late_evening_eastern = OffsetDateTime::from_unix_timestamp(1_792_461_600).unwrap();
        assert_eq!(late_evening_eastern.date().to_string(), "2026-10-20");

        service.config.utc_offset_mins = -300;
        let (start, end) = service.window_at(late_evening_eastern);
        assert_eq!(start.to_string(), "2026-10-19");
        assert_eq!(end.to_string(), "2026-10-22");

        service.config.utc_offset_mins = 0;
        assert_eq!(service.window_at(late_evening_eastern).0.to_string(), "2026-10-20");
    }

    async fn mount_me(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1.0/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "givenName": "Ada" })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_rooms_keep_directory_order_and_flag_missing() {
        let server = MockServer::start().await;
        mount_me(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1.0/me/calendar/getSchedule"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    { "scheduleId": "HUDDLE@contoso.com", "availabilityView": "00" },
                    { "scheduleId": "board@contoso.com", "availabilityView": "22" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let rooms = vec![
            room("Board", "board@contoso.com"),
            room("Huddle", "huddle@contoso.com"),
            room("Atrium", "atrium@contoso.com"),
        ];
        let board = service(&server, rooms).room_availability("t").await.unwrap();

        assert_eq!(board.user.display_name(), "Ada");
        assert_eq!(board.end - board.start, Duration::days(3));
        let names: Vec<_> = board.rooms.iter().map(|r| r.room.name.as_str()).collect();
        assert_eq!(names, vec!["Board", "Huddle", "Atrium"]);
        assert_eq!(board.rooms[0].percent_free(), 0);
        assert_eq!(board.rooms[1].percent_free(), 100);
        assert!(board.rooms[2].error.is_some());
    }

    #[tokio::test]
    async fn test_empty_directory_skips_schedule_lookup() {
        let server = MockServer::start().await;
        mount_me(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1.0/me/calendar/getSchedule"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let board = service(&server, Vec::new()).room_availability("t").await.unwrap();
        assert!(board.rooms.is_empty());
    }

    #[tokio::test]
    async fn test_meeting_responses() {
        let server = MockServer::start().await;
        mount_me(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1.0/me/calendarView"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
            .mount(&server)
            .await;

        let board = service(&server, Vec::new()).meeting_responses("t").await.unwrap();
        assert!(board.meetings.is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = service(&server, Vec::new()).meeting_responses("t").await.unwrap_err();
        assert!(matches!(err, GraphError::Unauthorized));
    }
}
