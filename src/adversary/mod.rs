//! The pursuing guard
//!
//! [`AdversaryController`] owns the guard's position and applies one minimax
//! decision per turn. It reports detection and capture; acting on them is the
//! session's job.

pub mod minimax;

use serde::{Deserialize, Serialize};

use crate::core::config::GuardConfig;
use crate::core::error::Result;
use crate::core::types::{RoomId, Traversal};
use crate::world::WorldGraph;

pub use minimax::minimax_move;

/// Whether locked doors stop the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardTraversal {
    RespectLocks,
    IgnoreLocks,
}

impl Default for GuardTraversal {
    fn default() -> Self {
        Self::RespectLocks
    }
}

impl GuardTraversal {
    pub fn traversal(self) -> Traversal {
        match self {
            GuardTraversal::RespectLocks => Traversal::Unlocked,
            GuardTraversal::IgnoreLocks => Traversal::IncludeLocked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuardState {
    pub room: RoomId,
    pub vision_range: u32,
    pub depth: i32,
}

/// Guard statistics for reports
#[derive(Debug, Clone, Serialize)]
pub struct GuardReport {
    pub room: RoomId,
    pub moves_made: u32,
    pub depth: i32,
    pub traversal: GuardTraversal,
}

#[derive(Debug, Clone)]
pub struct AdversaryController {
    config: GuardConfig,
    state: GuardState,
    moves_made: u32,
}

impl AdversaryController {
    pub fn new(config: GuardConfig, start: RoomId) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: GuardState {
                room: start,
                vision_range: config.vision_range,
                depth: config.depth,
            },
            config,
            moves_made: 0,
        })
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn room(&self) -> RoomId {
        self.state.room
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Move the guard one step; a disabled guard stays where it is
    pub fn choose_move(&mut self, world: &WorldGraph, agent_room: RoomId) -> Result<RoomId> {
        if !self.config.enabled {
            return Ok(self.state.room);
        }
        let from = self.state.room;
        let to = minimax_move(world, from, agent_room, self.state.depth, self.config.traversal)?;
        if to != from {
            self.moves_made += 1;
        }
        self.state.room = to;
        tracing::info!(%from, %to, "guard moved");
        Ok(to)
    }

    /// Hop distance from the guard to a room, `None` when unreachable
    pub fn distance_to(&self, world: &WorldGraph, room: RoomId) -> Result<Option<u32>> {
        world.distance_lowerbound(self.state.room, room, self.config.traversal.traversal())
    }

    /// Is the agent within vision range?
    pub fn detected(&self, world: &WorldGraph, agent_room: RoomId) -> Result<bool> {
        Ok(self
            .distance_to(world, agent_room)?
            .map_or(false, |distance| distance <= self.state.vision_range))
    }

    pub fn captured(&self, agent_room: RoomId) -> bool {
        self.config.enabled && self.state.room == agent_room
    }

    pub fn report(&self) -> GuardReport {
        GuardReport {
            room: self.state.room,
            moves_made: self.moves_made,
            depth: self.state.depth,
            traversal: self.config.traversal,
        }
    }
}
