//! World model: the room graph and its generation

pub mod generation;
pub mod graph;

pub use generation::{generate_map, GeneratedMap};
pub use graph::{Door, Room, WorldGraph};
