use serde::Deserialize;

/// A bookable meeting room, identified by its resource mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Room {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub capacity: Option<u32>,
}
