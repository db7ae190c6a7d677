//! Route planning over the room graph
//!
//! Two interchangeable algorithms:
//! - BFS: fewest doors, ties broken by adjacency insertion order
//! - A*: fewest doors plus a surcharge for believed hazard in each room entered
//!
//! The A* heuristic is the plain hop distance to the target. It ignores risk,
//! so it never overestimates and every edge still costs at least 1.

pub mod astar;
pub mod bfs;

use serde::{Deserialize, Serialize};

use crate::belief::BeliefState;
use crate::core::config::PathfindingConfig;
use crate::core::error::{EscapeError, Result};
use crate::core::types::{RoomId, Traversal};
use crate::world::WorldGraph;

pub use astar::find_path_astar;
pub use bfs::find_path_bfs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathAlgorithm {
    Bfs,
    AStar,
}

impl Default for PathAlgorithm {
    fn default() -> Self {
        Self::AStar
    }
}

/// How locked doors are treated while planning
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlanMode {
    /// Locked doors are walls
    Unlocked,
    /// Locked doors are passable at an extra fixed cost (A* only)
    ThroughLocked { puzzle_cost: f64 },
}

impl PlanMode {
    pub fn traversal(self) -> Traversal {
        match self {
            PlanMode::Unlocked => Traversal::Unlocked,
            PlanMode::ThroughLocked { .. } => Traversal::IncludeLocked,
        }
    }

    fn locked_surcharge(self) -> f64 {
        match self {
            PlanMode::Unlocked => 0.0,
            PlanMode::ThroughLocked { puzzle_cost } => puzzle_cost,
        }
    }
}

/// A planned route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    /// Rooms from source to target inclusive
    pub path: Vec<RoomId>,
    pub nodes_expanded: usize,
    /// Hop count for BFS, accumulated edge cost for A*
    pub cost: f64,
    /// Locked doors the route crosses, in travel order
    pub locked_doors: Vec<(RoomId, RoomId)>,
}

impl PathResult {
    fn trivial(room: RoomId) -> Self {
        Self {
            path: vec![room],
            nodes_expanded: 0,
            cost: 0.0,
            locked_doors: Vec::new(),
        }
    }

    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// The room after the source, if the route goes anywhere
    pub fn next_step(&self) -> Option<RoomId> {
        self.path.get(1).copied()
    }

    pub fn crosses_locked(&self) -> bool {
        !self.locked_doors.is_empty()
    }
}

fn locked_doors_on(world: &WorldGraph, path: &[RoomId]) -> Vec<(RoomId, RoomId)> {
    path.windows(2)
        .filter(|pair| world.is_locked(pair[0], pair[1]).unwrap_or(false))
        .map(|pair| (pair[0], pair[1]))
        .collect()
}

/// Route planner configured with risk weight and lock policy
#[derive(Debug, Clone)]
pub struct Pathfinder {
    config: PathfindingConfig,
}

impl Pathfinder {
    pub fn new(config: PathfindingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PathfindingConfig {
        &self.config
    }

    /// Plan mode implied by the configuration
    pub fn mode(&self) -> PlanMode {
        if self.config.consider_locked {
            PlanMode::ThroughLocked {
                puzzle_cost: self.config.puzzle_cost,
            }
        } else {
            PlanMode::Unlocked
        }
    }

    /// Plan a route with the configured lock policy
    pub fn find_path(
        &self,
        world: &WorldGraph,
        belief: &BeliefState,
        source: RoomId,
        target: RoomId,
        algorithm: PathAlgorithm,
    ) -> Result<PathResult> {
        self.find_path_with(world, belief, source, target, algorithm, self.mode())
    }

    /// Plan a route with an explicit lock policy
    pub fn find_path_with(
        &self,
        world: &WorldGraph,
        belief: &BeliefState,
        source: RoomId,
        target: RoomId,
        algorithm: PathAlgorithm,
        mode: PlanMode,
    ) -> Result<PathResult> {
        let result = match algorithm {
            PathAlgorithm::Bfs => find_path_bfs(world, source, target, mode),
            PathAlgorithm::AStar => {
                find_path_astar(world, belief, source, target, self.config.risk_weight, mode)
            }
        }?;

        tracing::debug!(
            ?algorithm,
            %source,
            %target,
            hops = result.hops(),
            cost = result.cost,
            nodes_expanded = result.nodes_expanded,
            "path found"
        );
        Ok(result)
    }

    /// Cheapest route to any of `targets`
    ///
    /// Ties on cost prefer fewer hops, then the lower target id. Fails with
    /// `NoPath` when no target is reachable.
    pub fn find_nearest(
        &self,
        world: &WorldGraph,
        belief: &BeliefState,
        source: RoomId,
        targets: &[RoomId],
        algorithm: PathAlgorithm,
    ) -> Result<PathResult> {
        self.find_nearest_with(world, belief, source, targets, algorithm, self.mode())
    }

    pub fn find_nearest_with(
        &self,
        world: &WorldGraph,
        belief: &BeliefState,
        source: RoomId,
        targets: &[RoomId],
        algorithm: PathAlgorithm,
        mode: PlanMode,
    ) -> Result<PathResult> {
        let mut best: Option<(RoomId, PathResult)> = None;
        for &target in targets {
            let result = match self.find_path_with(world, belief, source, target, algorithm, mode) {
                Ok(result) => result,
                Err(EscapeError::NoPath { .. }) => continue,
                Err(e) => return Err(e),
            };
            let better = match &best {
                None => true,
                Some((best_target, best_result)) => result
                    .cost
                    .total_cmp(&best_result.cost)
                    .then(result.hops().cmp(&best_result.hops()))
                    .then(target.cmp(best_target))
                    .is_lt(),
            };
            if better {
                best = Some((target, result));
            }
        }

        best.map(|(_, result)| result).ok_or(EscapeError::NoPath {
            from: source,
            to: targets.first().copied().unwrap_or(source),
        })
    }
}
