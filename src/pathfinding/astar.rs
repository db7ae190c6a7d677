//! Risk-weighted A*
//!
//! `cost(edge) = 1 + risk_weight * p_trap(dest)`, plus the puzzle cost when the
//! door is locked and the plan mode allows crossing it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;

use crate::belief::BeliefState;
use crate::core::error::{EscapeError, Result};
use crate::core::types::RoomId;
use crate::pathfinding::bfs::reconstruct_path;
use crate::pathfinding::{locked_doors_on, PathResult, PlanMode};
use crate::world::WorldGraph;

/// Node in the A* open set
#[derive(Debug, Clone)]
struct PathNode {
    room: RoomId,
    f_cost: OrderedFloat<f64>, // g_cost + heuristic
    h_cost: u32,
    seq: u64,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap: lowest f, then lowest h, then oldest
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.h_cost.cmp(&self.h_cost))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the cheapest route using risk-weighted A*
///
/// Rooms that cannot reach the target are never pushed. A room is expanded at
/// most once.
pub fn find_path_astar(
    world: &WorldGraph,
    belief: &BeliefState,
    source: RoomId,
    target: RoomId,
    risk_weight: f64,
    mode: PlanMode,
) -> Result<PathResult> {
    world.ensure(source)?;
    world.ensure(target)?;
    if source == target {
        return Ok(PathResult::trivial(source));
    }

    let traversal = mode.traversal();
    // Doors are undirected, so distances from the target are distances to it
    let heuristic = world.distances_from(target, traversal)?;
    let Some(&source_h) = heuristic.get(&source) else {
        return Err(EscapeError::NoPath {
            from: source,
            to: target,
        });
    };

    let mut open_set = BinaryHeap::new();
    let mut closed: AHashSet<RoomId> = AHashSet::new();
    let mut came_from: AHashMap<RoomId, RoomId> = AHashMap::new();
    let mut g_scores: AHashMap<RoomId, f64> = AHashMap::new();
    let mut seq = 0u64;
    let mut nodes_expanded = 0;

    g_scores.insert(source, 0.0);
    open_set.push(PathNode {
        room: source,
        f_cost: OrderedFloat(source_h as f64),
        h_cost: source_h,
        seq,
    });

    while let Some(current) = open_set.pop() {
        if !closed.insert(current.room) {
            continue;
        }
        nodes_expanded += 1;

        let current_g = g_scores.get(&current.room).copied().unwrap_or(f64::INFINITY);
        if current.room == target {
            let path = reconstruct_path(&came_from, current.room);
            return Ok(PathResult {
                locked_doors: locked_doors_on(world, &path),
                path,
                nodes_expanded,
                cost: current_g,
            });
        }

        for neighbor in world.neighbors_unchecked(current.room, traversal) {
            if closed.contains(&neighbor) {
                continue;
            }
            let Some(&h_cost) = heuristic.get(&neighbor) else {
                continue;
            };

            let mut move_cost = 1.0 + risk_weight * belief.probability(neighbor)?;
            if world.is_locked(current.room, neighbor)? {
                move_cost += mode.locked_surcharge();
            }

            let tentative_g = current_g + move_cost;
            let neighbor_g = g_scores.get(&neighbor).copied().unwrap_or(f64::INFINITY);
            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.room);
                g_scores.insert(neighbor, tentative_g);
                seq += 1;
                open_set.push(PathNode {
                    room: neighbor,
                    f_cost: OrderedFloat(tentative_g + h_cost as f64),
                    h_cost,
                    seq,
                });
            }
        }
    }

    Err(EscapeError::NoPath {
        from: source,
        to: target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::BeliefConfig;
    use crate::pathfinding::bfs::find_path_bfs;

    /// Risk-weighted route from room 0 through open doors only
    fn open_route(
        world: &WorldGraph,
        belief: &BeliefState,
        target: u32,
        weight: f64,
    ) -> Result<PathResult> {
        find_path_astar(world, belief, RoomId(0), RoomId(target), weight, PlanMode::Unlocked)
    }

    fn diamond() -> WorldGraph {
        // 0-1-3 and 0-2-3
        let mut world = WorldGraph::with_rooms(4);
        world.connect(RoomId(0), RoomId(1), false).unwrap();
        world.connect(RoomId(0), RoomId(2), false).unwrap();
        world.connect(RoomId(1), RoomId(3), false).unwrap();
        world.connect(RoomId(2), RoomId(3), false).unwrap();
        world
    }

    #[test]
    fn test_avoids_risky_room() {
        let world = diamond();
        let mut belief = BeliefState::new(&world, BeliefConfig::default()).unwrap();
        belief.set_probability(RoomId(1), 0.9).unwrap();
        belief.set_probability(RoomId(2), 0.1).unwrap();

        let result = open_route(&world, &belief, 3, 10.0).unwrap();
        assert_eq!(result.path, vec![RoomId(0), RoomId(2), RoomId(3)]);
        // (1 + 10·0.1) + (1 + 10·0.2)
        assert!((result.cost - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_takes_detour_when_risk_dominates() {
        // Direct 0-1-4 through a likely trap versus 0-2-3-4
        let mut world = WorldGraph::with_rooms(5);
        world.connect(RoomId(0), RoomId(1), false).unwrap();
        world.connect(RoomId(1), RoomId(4), false).unwrap();
        world.connect(RoomId(0), RoomId(2), false).unwrap();
        world.connect(RoomId(2), RoomId(3), false).unwrap();
        world.connect(RoomId(3), RoomId(4), false).unwrap();
        let mut belief = BeliefState::new(&world, BeliefConfig::default()).unwrap();
        belief.set_probability(RoomId(1), 1.0).unwrap();
        for room in [2, 3, 4] {
            belief.set_probability(RoomId(room), 0.0).unwrap();
        }

        let result = open_route(&world, &belief, 4, 10.0).unwrap();
        assert_eq!(result.hops(), 3);

        let bfs = find_path_bfs(&world, RoomId(0), RoomId(4), PlanMode::Unlocked).unwrap();
        assert_eq!(bfs.hops(), 2);
    }

    #[test]
    fn test_zero_risk_matches_bfs_hops() {
        let world = diamond();
        let belief = BeliefState::new(&world, BeliefConfig::default()).unwrap();

        let astar = open_route(&world, &belief, 3, 0.0).unwrap();
        let bfs = find_path_bfs(&world, RoomId(0), RoomId(3), PlanMode::Unlocked).unwrap();
        assert_eq!(astar.hops(), bfs.hops());
        assert_eq!(astar.cost, 2.0);
    }

    #[test]
    fn test_puzzle_cost_applies_to_locked_doors() {
        let mut world = WorldGraph::with_rooms(3);
        world.connect(RoomId(0), RoomId(1), true).unwrap();
        world.connect(RoomId(1), RoomId(2), false).unwrap();
        let mut belief = BeliefState::new(&world, BeliefConfig::default()).unwrap();
        belief.set_probability(RoomId(1), 0.0).unwrap();
        belief.set_probability(RoomId(2), 0.0).unwrap();

        let blocked = open_route(&world, &belief, 2, 10.0);
        assert!(matches!(blocked, Err(EscapeError::NoPath { .. })));

        let result = find_path_astar(
            &world,
            &belief,
            RoomId(0),
            RoomId(2),
            10.0,
            PlanMode::ThroughLocked { puzzle_cost: 3.0 },
        )
        .unwrap();
        assert_eq!(result.cost, 5.0);
        assert_eq!(result.locked_doors, vec![(RoomId(0), RoomId(1))]);
    }

    #[test]
    fn test_unreachable_target_expands_nothing() {
        let world = WorldGraph::with_rooms(2);
        let belief = BeliefState::new(&world, BeliefConfig::default()).unwrap();
        let result = open_route(&world, &belief, 1, 10.0);
        assert!(matches!(result, Err(EscapeError::NoPath { .. })));
    }

    #[test]
    fn test_open_set_order() {
        let node = |room, f_cost, h_cost, seq| PathNode {
            room: RoomId(room),
            f_cost: OrderedFloat(f_cost),
            h_cost,
            seq,
        };
        let low = node(0, 2.0, 1, 5);
        let high = node(1, 3.0, 0, 0);
        let low_h = node(2, 2.0, 0, 9);

        let mut heap = BinaryHeap::from(vec![high, low, low_h]);
        assert_eq!(heap.pop().map(|n| n.room), Some(RoomId(2)));
        assert_eq!(heap.pop().map(|n| n.room), Some(RoomId(0)));
        assert_eq!(heap.pop().map(|n| n.room), Some(RoomId(1)));
    }
}
