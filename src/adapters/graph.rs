use crate::config::GraphConfig;
use crate::domain::meeting::{MeetingSummary, ResponseKind};
use crate::domain::room::Room;
use crate::domain::schedule::{RoomAvailability, ScheduleItem as DomainScheduleItem};
use crate::domain::user::UserProfile;
use opentelemetry::{KeyValue, global, metrics::Counter};
use reqwest::{Method, StatusCode, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use time::Date;
use uuid::Uuid;

const CLIENT_REQUEST_ID: &str = "client-request-id";
const RETURN_CLIENT_REQUEST_ID: &str = "return-client-request-id";

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Graph rejected the access token")]
    Unauthorized,
    #[error("Graph returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to decode Graph response: {0}")]
    Decode(String),
}

#[derive(Clone, Debug)]
struct Metrics {
    requests_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("roomboard-server");
        Self {
            requests_total: meter
                .u64_counter("graph_requests_total")
                .with_description("Calendar API requests by response status")
                .build(),
        }
    }
}

/// The window and resolution of a free/busy lookup.
#[derive(Debug, Clone)]
pub struct ScheduleQuery<'a> {
    pub schedules: &'a [String],
    pub start: Date,
    pub end: Date,
    pub time_zone: &'a str,
    pub interval_mins: u32,
}

/// Client for the Microsoft Graph calendar endpoints.
#[derive(Clone, Debug)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
    metrics: Metrics,
}

impl GraphClient {
    #[must_use]
    pub fn new(http: reqwest::Client, config: &GraphConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            metrics: Metrics::new(),
        }
    }

    /// Sends an authenticated request to `path` (relative to `/v1.0`).
    ///
    /// Every call carries a fresh `client-request-id` so that requests can be
    /// correlated with provider-side logs. The response is returned as-is.
    ///
    /// # Errors
    /// Returns `GraphError::Transport` if the request cannot be sent.
    #[tracing::instrument(skip(self, query, body, access_token), fields(client_request_id = tracing::field::Empty))]
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
        access_token: &str,
    ) -> Result<reqwest::Response, GraphError> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("client_request_id", tracing::field::display(&request_id));

        let mut request = self
            .http
            .request(method, format!("{}/v1.0{path}", self.base_url))
            .bearer_auth(access_token)
            .header(header::USER_AGENT, &self.user_agent)
            .header(header::ACCEPT, "application/json")
            .header(CLIENT_REQUEST_ID, &request_id)
            .header(RETURN_CLIENT_REQUEST_ID, "true");

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        self.metrics.requests_total.add(1, &[KeyValue::new("status", i64::from(response.status().as_u16()))]);
        tracing::debug!(status = %response.status(), "Graph responded");
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GraphError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(GraphError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Graph request was not successful");
            return Err(GraphError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GraphError::Decode(e.to_string()))
    }

    /// Fetches the signed-in user's name and mail address.
    ///
    /// # Errors
    /// Returns an error if the request fails or the token is rejected.
    pub async fn get_me(&self, access_token: &str) -> Result<UserProfile, GraphError> {
        let query = [("$select", "mail,givenName,surname".to_string())];
        let response = self.send(Method::GET, "/me", &query, None, access_token).await?;
        let me: MeResponse = Self::decode(response).await?;

        Ok(UserProfile { mail: me.mail, given_name: me.given_name, surname: me.surname })
    }

    /// Looks up free/busy information for a set of mailboxes.
    ///
    /// # Errors
    /// Returns an error if the request fails or the token is rejected.
    pub async fn get_schedules(
        &self,
        access_token: &str,
        query: &ScheduleQuery<'_>,
    ) -> Result<Vec<ScheduleInformation>, GraphError> {
        let body = json!({
            "schedules": query.schedules,
            "startTime": { "dateTime": format!("{}T00:00:00", query.start), "timeZone": query.time_zone },
            "endTime": { "dateTime": format!("{}T00:00:00", query.end), "timeZone": query.time_zone },
            "availabilityViewInterval": query.interval_mins,
        });

        let response = self.send(Method::POST, "/me/calendar/getSchedule", &[], Some(&body), access_token).await?;
        let schedules: ValueList<ScheduleInformation> = Self::decode(response).await?;
        Ok(schedules.value)
    }

    /// Lists the user's meetings between `start` and `end`, with attendee responses.
    ///
    /// # Errors
    /// Returns an error if the request fails or the token is rejected.
    pub async fn get_calendar_view(
        &self,
        access_token: &str,
        start: Date,
        end: Date,
        limit: u32,
    ) -> Result<Vec<MeetingSummary>, GraphError> {
        let query = [
            ("startDateTime", format!("{start}T00:00:00")),
            ("endDateTime", format!("{end}T00:00:00")),
            ("$select", "subject,organizer,start,end,attendees".to_string()),
            ("$orderby", "start/dateTime".to_string()),
            ("$top", limit.to_string()),
        ];

        let response = self.send(Method::GET, "/me/calendarView", &query, None, access_token).await?;
        let events: ValueList<GraphEvent> = Self::decode(response).await?;
        Ok(events.value.into_iter().map(GraphEvent::into_summary).collect())
    }
}

/// Trims a Graph `dateTime` such as `2026-10-19T09:00:00.0000000` to `2026-10-19 09:00`.
fn display_time(date_time: &str) -> String {
    date_time.get(..16).unwrap_or(date_time).replacen('T', " ", 1)
}

#[derive(Debug, Deserialize)]
struct ValueList<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    mail: Option<String>,
    given_name: Option<String>,
    surname: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DateTimeTimeZone {
    date_time: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleItem {
    status: String,
    subject: Option<String>,
    location: Option<String>,
    start: DateTimeTimeZone,
    end: DateTimeTimeZone,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FreeBusyError {
    message: Option<String>,
    response_code: Option<String>,
}

/// Free/busy answer for one mailbox from `getSchedule`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInformation {
    pub schedule_id: String,
    #[serde(default)]
    availability_view: String,
    #[serde(default)]
    schedule_items: Vec<ScheduleItem>,
    error: Option<FreeBusyError>,
}

impl ScheduleInformation {
    #[must_use]
    pub fn into_availability(self, room: Room) -> RoomAvailability {
        let error = self.error.map(|e| {
            e.message.or(e.response_code).unwrap_or_else(|| "Schedule unavailable".to_string())
        });

        RoomAvailability {
            room,
            slots: RoomAvailability::parse_view(&self.availability_view),
            items: self
                .schedule_items
                .into_iter()
                .map(|item| DomainScheduleItem {
                    status: item.status,
                    subject: item.subject.filter(|s| !s.trim().is_empty()),
                    location: item.location.filter(|s| !s.trim().is_empty()),
                    start: display_time(&item.start.date_time),
                    end: display_time(&item.end.date_time),
                })
                .collect(),
            error,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress {
    name: Option<String>,
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Recipient {
    email_address: EmailAddress,
}

#[derive(Debug, Deserialize)]
struct ResponseStatus {
    response: ResponseKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Attendee {
    status: Option<ResponseStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphEvent {
    subject: Option<String>,
    organizer: Option<Recipient>,
    start: DateTimeTimeZone,
    end: DateTimeTimeZone,
    #[serde(default)]
    attendees: Vec<Attendee>,
}

impl GraphEvent {
    fn into_summary(self) -> MeetingSummary {
        let organizer = self.organizer.and_then(|o| o.email_address.name.or(o.email_address.address));
        let responses = self.attendees.into_iter().map(|a| a.status.map_or(ResponseKind::None, |s| s.response));

        MeetingSummary::tally(
            self.subject.filter(|s| !s.trim().is_empty()).unwrap_or_else(|| "(no subject)".to_string()),
            organizer,
            display_time(&self.start.date_time),
            display_time(&self.end.date_time),
            responses,
        )
    }
}
