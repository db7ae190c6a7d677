//! Escape Room - decision and reasoning engine
//!
//! An agent escapes a graph of rooms while reasoning about hidden traps
//! (Bayesian belief), planning routes (BFS and risk-weighted A*), solving
//! door puzzles (CSP) and evading a guard that pursues it with minimax.

pub mod adversary;
pub mod belief;
pub mod core;
pub mod pathfinding;
pub mod puzzle;
pub mod session;
pub mod world;
