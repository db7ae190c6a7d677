pub mod config;
pub mod error;
pub mod types;

pub use config::EscapeConfig;
pub use error::{EscapeError, Result};
pub use types::{KeyId, RoomId, Traversal, Turn};
