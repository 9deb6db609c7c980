use thiserror::Error;

use crate::map::room::RoomId;

/// Errors that can arise while loading or validating the room map.
///
/// Lookups that simply find nothing (unknown room, unknown uid, no route)
/// are not errors and surface as `None` or empty collections instead.
#[derive(Debug, Error)]
pub enum MapError {
    /// Wrapper around IO errors (reading a dataset file, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around serde_json errors outside of dataset parsing.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Returned when a dataset file cannot be parsed into rooms.
    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    /// Returned when a loader produces two rooms sharing one id.
    #[error("duplicate room id: {0}")]
    DuplicateRoom(RoomId),

    /// Returned when an edge weight is negative or not a finite number.
    #[error("invalid travel time {weight} on edge {from} -> {to}")]
    InvalidWeight {
        from: RoomId,
        to: RoomId,
        weight: f64,
    },

    /// A dataset loader failed for a reason of its own.
    #[error("loader error: {0}")]
    Loader(String),
}
