//! Error types for the triangle engine.

use crate::models::{PositionId, TriangleId};
use thiserror::Error;

/// Result type for engine and store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced user, triangle or plan does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Slot selection found nothing in a triangle reported as open
    #[error("No available position in triangle {0}")]
    NoAvailablePosition(TriangleId),

    /// Conditional occupant write found the slot already taken
    #[error("Position {0} is already occupied")]
    SlotOccupied(PositionId),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Store I/O error, passed through uninterpreted
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored record is structurally invalid
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn user_not_found(id: impl std::fmt::Display) -> Self {
        Error::NotFound(format!("user {id}"))
    }

    pub(crate) fn triangle_not_found(id: impl std::fmt::Display) -> Self {
        Error::NotFound(format!("triangle {id}"))
    }
}
