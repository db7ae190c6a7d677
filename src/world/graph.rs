//! Room graph: topology, door lock state and adjacency queries
//!
//! Doors are undirected and stored once per room pair, so the lock state is
//! symmetric by construction. Adjacency lists keep insertion order, which is
//! the order every search in the crate explores neighbors in.

use std::collections::{BTreeMap, VecDeque};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{EscapeError, Result};
use crate::core::types::{KeyId, RoomId, Traversal};
use crate::puzzle::Difficulty;

/// A single room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub is_exit: bool,
    /// Key lying in this room, if not yet collected
    pub key: Option<KeyId>,
    trapped: bool,
    trap_triggered: bool,
}

impl Room {
    pub fn new(id: RoomId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_exit: false,
            key: None,
            trapped: false,
            trap_triggered: false,
        }
    }

    pub fn with_exit(mut self) -> Self {
        self.is_exit = true;
        self
    }

    pub fn with_key(mut self, key: KeyId) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_trap(mut self) -> Self {
        self.trapped = true;
        self
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }
}

/// A door between two rooms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
    /// Lower room id of the pair
    pub a: RoomId,
    /// Higher room id of the pair
    pub b: RoomId,
    pub locked: bool,
    /// Puzzle guarding a locked door
    pub puzzle: Option<Difficulty>,
}

impl Door {
    /// The room on the other side of the door from `room`
    pub fn other(&self, room: RoomId) -> RoomId {
        if self.a == room {
            self.b
        } else {
            self.a
        }
    }
}

fn door_key(a: RoomId, b: RoomId) -> (RoomId, RoomId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// The shared world model: rooms, doors and their lock state
#[derive(Debug, Clone, Default)]
pub struct WorldGraph {
    rooms: BTreeMap<RoomId, Room>,
    adjacency: AHashMap<RoomId, Vec<RoomId>>,
    doors: AHashMap<(RoomId, RoomId), Door>,
}

impl WorldGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph with rooms `0..count` and no doors
    pub fn with_rooms(count: u32) -> Self {
        let mut graph = Self::new();
        for i in 0..count {
            graph.add_room(Room::new(RoomId(i), format!("Room {}", i)));
        }
        graph
    }

    /// Insert a room, replacing the attributes of an existing room with the same id
    pub fn add_room(&mut self, room: Room) {
        self.adjacency.entry(room.id).or_default();
        self.rooms.insert(room.id, room);
    }

    /// Add a door between two rooms; reconnecting existing rooms is a no-op
    pub fn connect(&mut self, a: RoomId, b: RoomId, locked: bool) -> Result<()> {
        self.insert_door(a, b, locked, None)
    }

    /// Add a locked door guarded by a puzzle
    pub fn connect_with_puzzle(&mut self, a: RoomId, b: RoomId, puzzle: Difficulty) -> Result<()> {
        self.insert_door(a, b, true, Some(puzzle))
    }

    fn insert_door(
        &mut self,
        a: RoomId,
        b: RoomId,
        locked: bool,
        puzzle: Option<Difficulty>,
    ) -> Result<()> {
        self.ensure(a)?;
        self.ensure(b)?;
        if a == b {
            return Err(EscapeError::InvalidEdge(a, b));
        }
        let key = door_key(a, b);
        if self.doors.contains_key(&key) {
            return Ok(());
        }
        self.doors.insert(
            key,
            Door {
                a: key.0,
                b: key.1,
                locked,
                puzzle,
            },
        );
        self.adjacency.entry(a).or_default().push(b);
        self.adjacency.entry(b).or_default().push(a);
        Ok(())
    }

    pub fn contains(&self, room: RoomId) -> bool {
        self.rooms.contains_key(&room)
    }

    /// Fail fast on ids the graph has never seen
    pub fn ensure(&self, room: RoomId) -> Result<()> {
        if self.contains(room) {
            Ok(())
        } else {
            Err(EscapeError::UnknownRoom(room))
        }
    }

    pub fn room(&self, room: RoomId) -> Result<&Room> {
        self.rooms.get(&room).ok_or(EscapeError::UnknownRoom(room))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Room ids in ascending order
    pub fn room_ids(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.rooms.keys().copied()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn door_count(&self) -> usize {
        self.doors.len()
    }

    pub fn door(&self, a: RoomId, b: RoomId) -> Option<&Door> {
        self.doors.get(&door_key(a, b))
    }

    /// Neighbors reachable through doors the traversal permits, in insertion order
    pub fn neighbors(&self, room: RoomId, traversal: Traversal) -> Result<Vec<RoomId>> {
        self.ensure(room)?;
        Ok(self.neighbors_unchecked(room, traversal).collect())
    }

    /// Neighbor iteration for ids already validated by the caller
    pub(crate) fn neighbors_unchecked(
        &self,
        room: RoomId,
        traversal: Traversal,
    ) -> impl Iterator<Item = RoomId> + '_ {
        self.adjacency
            .get(&room)
            .into_iter()
            .flatten()
            .copied()
            .filter(move |&other| {
                self.doors
                    .get(&door_key(room, other))
                    .map(|door| traversal.permits(door.locked))
                    .unwrap_or(false)
            })
    }

    /// Locked doors leading out of a room
    pub fn locked_doors_from(&self, room: RoomId) -> Result<Vec<&Door>> {
        self.ensure(room)?;
        Ok(self
            .adjacency
            .get(&room)
            .into_iter()
            .flatten()
            .filter_map(|&other| self.doors.get(&door_key(room, other)))
            .filter(|door| door.locked)
            .collect())
    }

    pub fn is_locked(&self, a: RoomId, b: RoomId) -> Result<bool> {
        self.door(a, b)
            .map(|door| door.locked)
            .ok_or(EscapeError::InvalidEdge(a, b))
    }

    /// Unlock the door between two rooms
    ///
    /// Idempotent: returns `true` only when the door was locked before the call.
    pub fn unlock(&mut self, a: RoomId, b: RoomId) -> Result<bool> {
        let door = self
            .doors
            .get_mut(&door_key(a, b))
            .ok_or(EscapeError::InvalidEdge(a, b))?;
        let was_locked = door.locked;
        door.locked = false;
        if was_locked {
            tracing::debug!(%a, %b, "door unlocked");
        }
        Ok(was_locked)
    }

    /// BFS hop distances from `room` to every reachable room
    pub fn distances_from(
        &self,
        room: RoomId,
        traversal: Traversal,
    ) -> Result<AHashMap<RoomId, u32>> {
        self.ensure(room)?;
        let mut distances = AHashMap::new();
        let mut queue = VecDeque::new();
        distances.insert(room, 0);
        queue.push_back(room);

        while let Some(current) = queue.pop_front() {
            let next = distances[&current] + 1;
            for neighbor in self.neighbors_unchecked(current, traversal) {
                if !distances.contains_key(&neighbor) {
                    distances.insert(neighbor, next);
                    queue.push_back(neighbor);
                }
            }
        }

        Ok(distances)
    }

    /// Hop distance ignoring risk; a lower bound on any path's step count
    ///
    /// `None` when `b` is unreachable from `a` under the traversal.
    pub fn distance_lowerbound(
        &self,
        a: RoomId,
        b: RoomId,
        traversal: Traversal,
    ) -> Result<Option<u32>> {
        self.ensure(b)?;
        Ok(self.distances_from(a, traversal)?.get(&b).copied())
    }

    /// Graph diameter: the longest finite shortest path between any two rooms
    pub fn distance_upper_bound(&self, traversal: Traversal) -> u32 {
        self.rooms
            .keys()
            .filter_map(|&room| self.distances_from(room, traversal).ok())
            .filter_map(|distances| distances.values().copied().max())
            .max()
            .unwrap_or(0)
    }

    pub fn exit_room(&self) -> Option<RoomId> {
        self.rooms.values().find(|room| room.is_exit).map(|room| room.id)
    }

    /// Rooms still holding a key, ascending by room id
    pub fn key_rooms(&self) -> Vec<(RoomId, KeyId)> {
        self.rooms
            .values()
            .filter_map(|room| room.key.map(|key| (room.id, key)))
            .collect()
    }

    /// Pick up the key in a room, if any
    pub fn collect_key(&mut self, room: RoomId) -> Result<Option<KeyId>> {
        let room = self.rooms.get_mut(&room).ok_or(EscapeError::UnknownRoom(room))?;
        Ok(room.key.take())
    }

    /// Ground truth: does the room hold a trap?
    pub fn is_trapped(&self, room: RoomId) -> Result<bool> {
        Ok(self.room(room)?.trapped)
    }

    pub fn set_trap(&mut self, room: RoomId, trapped: bool) -> Result<()> {
        let room = self.rooms.get_mut(&room).ok_or(EscapeError::UnknownRoom(room))?;
        room.trapped = trapped;
        Ok(())
    }

    /// Spring the trap in a room; a trap fires only once
    pub fn trigger_trap(&mut self, room: RoomId) -> Result<bool> {
        let room = self.rooms.get_mut(&room).ok_or(EscapeError::UnknownRoom(room))?;
        if room.trapped && !room.trap_triggered {
            room.trap_triggered = true;
            return Ok(true);
        }
        Ok(false)
    }
}
