//! Seeded map generation
//!
//! Rooms form a chain of unlocked doors from the start to the exit, so every
//! key and the exit stay reachable however the extra doors are locked.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::{MapConfig, PuzzleConfig};
use crate::core::error::Result;
use crate::core::types::{KeyId, RoomId};
use crate::world::graph::{Room, WorldGraph};

const ROOM_NAMES: [&str; 30] = [
    "Entrance Hall",
    "Storage Room",
    "Library",
    "Armory",
    "Kitchen",
    "Dungeon",
    "Guard Room",
    "Treasury",
    "Laboratory",
    "Chapel",
    "Throne Room",
    "Garden",
    "Tower",
    "Cellar",
    "Study",
    "Gallery",
    "Chamber",
    "Vault",
    "Courtyard",
    "Crypt",
    "Workshop",
    "Barracks",
    "Dining Hall",
    "Prison",
    "Observatory",
    "Archive",
    "Forge",
    "Sanctuary",
    "Quarters",
    "Hall of Mirrors",
];

/// A freshly generated escape complex
#[derive(Debug, Clone)]
pub struct GeneratedMap {
    pub world: WorldGraph,
    pub start: RoomId,
    pub exit: RoomId,
    pub guard_start: RoomId,
    pub total_keys: u32,
}

/// Generate a map from configuration
pub fn generate_map(
    map: &MapConfig,
    puzzles: &PuzzleConfig,
    rng: &mut ChaCha8Rng,
) -> Result<GeneratedMap> {
    map.validate()?;
    let count = map.size.room_count();
    let start = RoomId(0);
    let exit = RoomId(count - 1);

    let mut world = WorldGraph::new();
    for i in 0..count {
        let name = match i {
            0 => "Entrance (START)".to_string(),
            i if i == count - 1 => "Exit Door (ESCAPE)".to_string(),
            i => ROOM_NAMES
                .get(i as usize)
                .map(|name| name.to_string())
                .unwrap_or_else(|| format!("Room {}", i)),
        };
        let mut room = Room::new(RoomId(i), name);
        room.is_exit = i == count - 1;
        world.add_room(room);
    }

    // Backbone chain keeps the map connected
    for i in 0..count - 1 {
        world.connect(RoomId(i), RoomId(i + 1), false)?;
    }

    // Extra doors, some of them locked behind puzzles
    let mut locked_doors = 0u32;
    for _ in 0..count / 3 {
        let a = RoomId(rng.gen_range(0..count));
        let b = RoomId(rng.gen_range(0..count));
        if a == b || world.door(a, b).is_some() {
            continue;
        }
        if rng.gen_bool(map.lock_chance) {
            let difficulty = puzzles.difficulty.resolve(locked_doors);
            world.connect_with_puzzle(a, b, difficulty)?;
            locked_doors += 1;
        } else {
            world.connect(a, b, false)?;
        }
    }

    let mut interior: Vec<u32> = (1..count - 1).collect();

    interior.shuffle(rng);
    let key_rooms: Vec<u32> = interior.iter().take(map.num_keys as usize).copied().collect();
    for (key, &room) in key_rooms.iter().enumerate() {
        let name = world.room(RoomId(room))?.name.clone();
        world.add_room(Room::new(RoomId(room), name).with_key(KeyId(key as u32)));
    }

    interior.shuffle(rng);
    let mut traps = 0;
    for &room in interior.iter().take(map.num_traps as usize) {
        if !key_rooms.contains(&room) {
            world.set_trap(RoomId(room), true)?;
            traps += 1;
        }
    }

    let guard_start = if count > 4 {
        RoomId(rng.gen_range(2..count - 2))
    } else {
        RoomId(1.min(count - 1))
    };

    tracing::info!(
        rooms = count,
        doors = world.door_count(),
        locked_doors,
        keys = key_rooms.len(),
        traps,
        guard = %guard_start,
        "generated escape map"
    );

    Ok(GeneratedMap {
        world,
        start,
        exit,
        guard_start,
        total_keys: key_rooms.len() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::MapSize;
    use crate::core::types::Traversal;
    use rand::SeedableRng;

    fn generate(size: MapSize, seed: u64) -> GeneratedMap {
        let map = MapConfig {
            size,
            ..MapConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        generate_map(&map, &PuzzleConfig::default(), &mut rng).unwrap()
    }

    #[test]
    fn test_room_count_matches_size() {
        for size in [MapSize::Small, MapSize::Medium, MapSize::Large] {
            let map = generate(size, 7);
            assert_eq!(map.world.room_count() as u32, size.room_count());
            assert_eq!(map.exit, RoomId(size.room_count() - 1));
            assert_eq!(map.world.exit_room(), Some(map.exit));
        }
    }

    #[test]
    fn test_exit_reachable_without_unlocking() {
        for seed in 0..20 {
            let map = generate(MapSize::Medium, seed);
            let distance = map
                .world
                .distance_lowerbound(map.start, map.exit, Traversal::Unlocked)
                .unwrap();
            assert!(distance.is_some(), "seed {} produced an unreachable exit", seed);
        }
    }

    #[test]
    fn test_keys_and_traps_avoid_endpoints() {
        let map = generate(MapSize::Small, 3);
        let keys = map.world.key_rooms();
        assert_eq!(keys.len() as u32, map.total_keys);
        for (room, _) in keys {
            assert_ne!(room, map.start);
            assert_ne!(room, map.exit);
            assert!(!map.world.is_trapped(room).unwrap(), "key rooms never hold traps");
        }
        assert!(!map.world.is_trapped(map.start).unwrap());
        assert!(!map.world.is_trapped(map.exit).unwrap());
    }

    #[test]
    fn test_same_seed_same_map() {
        let a = generate(MapSize::Large, 99);
        let b = generate(MapSize::Large, 99);
        assert_eq!(a.guard_start, b.guard_start);
        assert_eq!(a.world.key_rooms(), b.world.key_rooms());
        assert_eq!(a.world.door_count(), b.world.door_count());
    }

    #[test]
    fn test_guard_starts_in_the_middle() {
        let map = generate(MapSize::Medium, 11);
        assert!(map.guard_start.0 >= 2 && map.guard_start.0 < 10);
    }
}
