//! Depth-limited minimax for guard pursuit
//!
//! The guard minimizes the BFS distance to the agent, the agent maximizes it.
//! Depth counts plies including the guard's root move. No pruning.

use ahash::AHashMap;

use crate::adversary::GuardTraversal;
use crate::core::error::Result;
use crate::core::types::{RoomId, Traversal};
use crate::world::WorldGraph;

/// Static value of a position that can never become a capture
pub const UNREACHABLE: u32 = u32::MAX;

/// Hop distances between every pair of rooms, computed once per decision
struct DistanceTable {
    table: AHashMap<RoomId, AHashMap<RoomId, u32>>,
}

impl DistanceTable {
    fn build(world: &WorldGraph, traversal: Traversal) -> Result<Self> {
        let mut table = AHashMap::with_capacity(world.room_count());
        for room in world.room_ids() {
            table.insert(room, world.distances_from(room, traversal)?);
        }
        Ok(Self { table })
    }

    fn get(&self, from: RoomId, to: RoomId) -> u32 {
        self.table
            .get(&from)
            .and_then(|row| row.get(&to))
            .copied()
            .unwrap_or(UNREACHABLE)
    }
}

struct Search<'a> {
    world: &'a WorldGraph,
    guard_traversal: Traversal,
    distances: DistanceTable,
    nodes: u64,
}

impl Search<'_> {
    fn evaluate(&self, guard: RoomId, agent: RoomId) -> u32 {
        if guard == agent {
            0
        } else {
            self.distances.get(guard, agent)
        }
    }

    /// Stay plus every permitted neighbor, ascending by id
    fn moves(&self, room: RoomId, traversal: Traversal) -> Vec<RoomId> {
        let mut moves: Vec<RoomId> = std::iter::once(room)
            .chain(self.world.neighbors_unchecked(room, traversal))
            .collect();
        moves.sort_unstable();
        moves.dedup();
        moves
    }

    fn minimax(
        &mut self,
        guard: RoomId,
        agent: RoomId,
        remaining: i32,
        agent_to_move: bool,
    ) -> u32 {
        self.nodes += 1;
        if guard == agent {
            return 0;
        }
        if remaining <= 0 {
            return self.evaluate(guard, agent);
        }

        if agent_to_move {
            let mut best = 0;
            for next in self.moves(agent, Traversal::Unlocked) {
                best = best.max(self.minimax(guard, next, remaining - 1, false));
            }
            best
        } else {
            let mut best = UNREACHABLE;
            for next in self.moves(guard, self.guard_traversal) {
                best = best.min(self.minimax(next, agent, remaining - 1, true));
            }
            best
        }
    }
}

/// Pick the guard's next room
///
/// Returns the legal move (staying included) with the smallest minimax value.
/// Equal values go to the move that ends closest to the agent's current room,
/// then to the smallest room id. `depth <= 1` reduces to a greedy one-ply
/// choice. A guard with no open doors stays put.
pub fn minimax_move(
    world: &WorldGraph,
    guard_room: RoomId,
    agent_room: RoomId,
    depth: i32,
    traversal: GuardTraversal,
) -> Result<RoomId> {
    world.ensure(guard_room)?;
    world.ensure(agent_room)?;

    let guard_traversal = traversal.traversal();
    let mut search = Search {
        world,
        guard_traversal,
        distances: DistanceTable::build(world, guard_traversal)?,
        nodes: 0,
    };

    let remaining = depth.max(1) - 1;
    let mut best: Option<(u32, u32, RoomId)> = None;
    for candidate in search.moves(guard_room, guard_traversal) {
        let value = search.minimax(candidate, agent_room, remaining, true);
        let closeness = search.evaluate(candidate, agent_room);
        // Candidates arrive in ascending id order, so strict < keeps the smallest id
        if best.map_or(true, |(v, c, _)| (value, closeness) < (v, c)) {
            best = Some((value, closeness, candidate));
        }
    }

    let chosen = best.map(|(_, _, room)| room).unwrap_or(guard_room);
    tracing::debug!(
        %guard_room,
        %agent_room,
        depth,
        %chosen,
        value = best.map(|(value, _, _)| value),
        nodes = search.nodes,
        "guard move selected"
    );
    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(n: u32) -> WorldGraph {
        let mut world = WorldGraph::with_rooms(n);
        for i in 0..n {
            world.connect(RoomId(i), RoomId((i + 1) % n), false).unwrap();
        }
        world
    }

    fn chase(world: &WorldGraph, guard: u32, agent: u32, depth: i32) -> RoomId {
        minimax_move(world, RoomId(guard), RoomId(agent), depth, GuardTraversal::RespectLocks)
            .unwrap()
    }

    #[test]
    fn test_four_cycle_moves_toward_agent() {
        let world = cycle(4);
        assert_eq!(chase(&world, 2, 0, 2), RoomId(1));
    }

    #[test]
    fn test_four_cycle_relabeled_guard_still_advances() {
        // Staying ties with both approaches on value; the closer move wins
        let world = cycle(4);
        for depth in [1, 2, 3, 4] {
            assert_eq!(chase(&world, 0, 2, depth), RoomId(1), "depth {}", depth);
        }
    }

    #[test]
    fn test_adjacent_agent_is_captured() {
        let world = cycle(5);
        for depth in [1, 2, 3, 4] {
            assert_eq!(chase(&world, 1, 2, depth), RoomId(2), "depth {}", depth);
        }
    }

    #[test]
    fn test_non_positive_depth_is_greedy() {
        let world = cycle(6);
        let greedy = chase(&world, 0, 3, 1);
        for depth in [0, -3] {
            assert_eq!(chase(&world, 0, 3, depth), greedy);
        }
        // Both neighbors are two rooms from the agent; the smaller id wins
        assert_eq!(greedy, RoomId(1));
    }

    #[test]
    fn test_isolated_guard_stays() {
        let mut world = WorldGraph::with_rooms(3);
        world.connect(RoomId(0), RoomId(1), false).unwrap();
        assert_eq!(chase(&world, 2, 0, 3), RoomId(2));
    }

    #[test]
    fn test_lock_policy() {
        // Guard at 0 behind a locked door to the agent at 1
        let mut world = WorldGraph::with_rooms(3);
        world.connect(RoomId(0), RoomId(1), true).unwrap();
        world.connect(RoomId(0), RoomId(2), false).unwrap();

        assert_ne!(chase(&world, 0, 1, 1), RoomId(1));
        let ignore =
            minimax_move(&world, RoomId(0), RoomId(1), 1, GuardTraversal::IgnoreLocks).unwrap();
        assert_eq!(ignore, RoomId(1));
    }

    #[test]
    fn test_unknown_room() {
        let world = cycle(3);
        let result = minimax_move(&world, RoomId(0), RoomId(8), 2, GuardTraversal::RespectLocks);
        assert!(result.is_err());
    }
}
