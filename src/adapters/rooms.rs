use crate::domain::room::Room;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoomError {
    #[error("Failed to read room list: {0}")]
    Csv(#[from] csv::Error),
    #[error("Room on line {line} has no email address")]
    MissingEmail { line: u64 },
}

/// The set of rooms shown on the availability board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomDirectory {
    rooms: Vec<Room>,
}

impl RoomDirectory {
    #[must_use]
    pub const fn new(rooms: Vec<Room>) -> Self {
        Self { rooms }
    }

    /// Loads rooms from a CSV file with a `name,email[,capacity]` header.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, a row is malformed, or a
    /// row has an empty email.
    pub fn load(path: &Path) -> Result<Self, RoomError> {
        let reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
        Self::from_reader(reader)
    }

    fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self, RoomError> {
        let mut rooms = Vec::new();
        for record in reader.deserialize::<Room>() {
            let room = record?;
            if room.email.is_empty() {
                let line = rooms.len() as u64 + 2;
                return Err(RoomError::MissingEmail { line });
            }
            rooms.push(room);
        }

        tracing::debug!(count = rooms.len(), "Loaded room list");
        Ok(Self { rooms })
    }

    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    #[must_use]
    pub fn emails(&self) -> Vec<String> {
        self.rooms.iter().map(|r| r.email.clone()).collect()
    }
}
