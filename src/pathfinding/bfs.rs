//! Breadth-first search: fewest doors

use std::collections::VecDeque;

use ahash::AHashMap;

use crate::core::error::{EscapeError, Result};
use crate::core::types::RoomId;
use crate::pathfinding::{locked_doors_on, PathResult, PlanMode};
use crate::world::WorldGraph;

/// Shortest route by edge count
///
/// A room's parent is fixed the first time it is discovered, so among equal
/// length routes the one using earlier-inserted doors wins.
pub fn find_path_bfs(
    world: &WorldGraph,
    source: RoomId,
    target: RoomId,
    mode: PlanMode,
) -> Result<PathResult> {
    world.ensure(source)?;
    world.ensure(target)?;
    if source == target {
        return Ok(PathResult::trivial(source));
    }

    let traversal = mode.traversal();
    let mut came_from: AHashMap<RoomId, RoomId> = AHashMap::new();
    let mut queue = VecDeque::new();
    let mut nodes_expanded = 0;
    queue.push_back(source);

    while let Some(current) = queue.pop_front() {
        nodes_expanded += 1;
        if current == target {
            let path = reconstruct_path(&came_from, current);
            return Ok(PathResult {
                cost: (path.len() - 1) as f64,
                locked_doors: locked_doors_on(world, &path),
                path,
                nodes_expanded,
            });
        }

        for neighbor in world.neighbors_unchecked(current, traversal) {
            if neighbor != source && !came_from.contains_key(&neighbor) {
                came_from.insert(neighbor, current);
                queue.push_back(neighbor);
            }
        }
    }

    Err(EscapeError::NoPath {
        from: source,
        to: target,
    })
}

/// Reconstruct path from came_from map
pub(crate) fn reconstruct_path(
    came_from: &AHashMap<RoomId, RoomId>,
    mut current: RoomId,
) -> Vec<RoomId> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
