//! Core type definitions used throughout the codebase

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a room in the escape complex
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomId(pub u32);

impl RoomId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room {}", self.0)
    }
}

/// Identifier for a collectible key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyId(pub u32);

/// Turn counter (simulation time unit)
pub type Turn = u32;

/// Which doors a mover may pass through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Traversal {
    /// Only doors that are currently unlocked
    Unlocked,
    /// Every door, locked or not (planning around locks)
    IncludeLocked,
}

impl Traversal {
    /// Can a door with this lock state be crossed?
    pub fn permits(self, locked: bool) -> bool {
        match self {
            Traversal::Unlocked => !locked,
            Traversal::IncludeLocked => true,
        }
    }
}
