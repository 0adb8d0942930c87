//! Shared value types: grid coordinates, compass directions, creature ids.

pub mod types;

pub use types::{Coordinate, CreatureId, Direction, ParseDirectionError};
