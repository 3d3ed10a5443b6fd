use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StaffError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Slot '{slot_id}' has malformed time '{value}'")]
    MalformedTime { slot_id: String, value: String },

    #[error("Slot '{slot_id}' was modified concurrently")]
    VersionConflict { slot_id: String },

    #[error("Employee '{employee_id}' is already booked on {date}")]
    AlreadyBooked { employee_id: String, date: NaiveDate },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StaffResult<T> = Result<T, StaffError>;
