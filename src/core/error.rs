use thiserror::Error;

use crate::core::types::RoomId;

#[derive(Error, Debug)]
pub enum EscapeError {
    #[error("Unknown room: {0}")]
    UnknownRoom(RoomId),

    #[error("No door between {0} and {1}")]
    InvalidEdge(RoomId, RoomId),

    #[error("No path from {from} to {to} under the current lock state")]
    NoPath { from: RoomId, to: RoomId },

    #[error("Probability {value} for {room} is outside [0, 1]")]
    ProbabilityOutOfRange { room: RoomId, value: f64 },

    #[error("Evidence has zero likelihood under the current belief for {0}")]
    DegenerateEvidence(RoomId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Puzzle has no satisfying assignment")]
    Unsatisfiable,

    #[error("Illegal move from {from} to {to}")]
    IllegalMove { from: RoomId, to: RoomId },

    #[error("Session is already over")]
    SessionOver,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl EscapeError {
    /// Recoverable domain failures the orchestrator may retry around
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EscapeError::NoPath { .. } | EscapeError::Unsatisfiable)
    }
}

pub type Result<T> = std::result::Result<T, EscapeError>;
