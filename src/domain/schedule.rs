use crate::domain::room::Room;

/// One slot of a Graph availability view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Free,
    Tentative,
    Busy,
    OutOfOffice,
    WorkingElsewhere,
    Unknown,
}

impl Availability {
    #[must_use]
    pub const fn from_code(code: char) -> Self {
        match code {
            '0' => Self::Free,
            '1' => Self::Tentative,
            '2' => Self::Busy,
            '3' => Self::OutOfOffice,
            '4' => Self::WorkingElsewhere,
            _ => Self::Unknown,
        }
    }

    /// CSS class used by the availability strip.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Tentative => "tentative",
            Self::Busy => "busy",
            Self::OutOfOffice => "oof",
            Self::WorkingElsewhere => "elsewhere",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub const fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleItem {
    pub status: String,
    pub subject: Option<String>,
    pub location: Option<String>,
    pub start: String,
    pub end: String,
}

/// Free/busy information for one room over the requested window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomAvailability {
    pub room: Room,
    pub slots: Vec<Availability>,
    pub items: Vec<ScheduleItem>,
    pub error: Option<String>,
}

impl RoomAvailability {
    #[must_use]
    pub fn parse_view(view: &str) -> Vec<Availability> {
        view.chars().map(Availability::from_code).collect()
    }

    #[must_use]
    pub fn free_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_free()).count()
    }

    #[must_use]
    pub fn busy_slots(&self) -> usize {
        self.slots.len() - self.free_slots()
    }

    /// Share of free slots, rounded down; zero when the view is empty.
    #[must_use]
    pub fn percent_free(&self) -> usize {
        if self.slots.is_empty() {
            return 0;
        }
        self.free_slots() * 100 / self.slots.len()
    }
}
