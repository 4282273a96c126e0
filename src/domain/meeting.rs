use serde::Deserialize;

/// An attendee's answer to a meeting request, as reported by Graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseKind {
    None,
    Organizer,
    TentativelyAccepted,
    Accepted,
    Declined,
    NotResponded,
    #[serde(other)]
    Unknown,
}

/// Per-meeting tally of attendee responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingSummary {
    pub subject: String,
    pub organizer: Option<String>,
    pub start: String,
    pub end: String,
    pub accepted: usize,
    pub tentative: usize,
    pub declined: usize,
    pub awaiting: usize,
}

impl MeetingSummary {
    /// Builds a summary from the responses of every non-organizer attendee.
    pub fn tally(
        subject: String,
        organizer: Option<String>,
        start: String,
        end: String,
        responses: impl IntoIterator<Item = ResponseKind>,
    ) -> Self {
        let mut summary =
            Self { subject, organizer, start, end, accepted: 0, tentative: 0, declined: 0, awaiting: 0 };

        for response in responses {
            match response {
                ResponseKind::Accepted => summary.accepted += 1,
                ResponseKind::TentativelyAccepted => summary.tentative += 1,
                ResponseKind::Declined => summary.declined += 1,
                ResponseKind::None | ResponseKind::NotResponded | ResponseKind::Unknown => summary.awaiting += 1,
                ResponseKind::Organizer => {}
            }
        }

        summary
    }

    #[must_use]
    pub const fn invited(&self) -> usize {
        self.accepted + self.tentative + self.declined + self.awaiting
    }
}
