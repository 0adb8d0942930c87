//! Session kernel: the lazily expanding world grid, the hero, and the game
//! state that keeps them consistent.
//!
//! # Invariants
//! - The hero occupies exactly one Location, the one at its recorded position.
//! - A Location exists at a coordinate iff that coordinate was expanded.
//! - The world and the exploration log only ever grow.
//! - All position/occupancy/log mutations flow through `GameState::move_hero`.

pub mod cursor;
pub mod error;
pub mod hero;
pub mod history;
pub mod state;
pub mod world;

pub use cursor::ContentCursor;
pub use error::KernelError;
pub use hero::{AchievementTracker, ExplorationLog, Hero};
pub use history::CommandHistory;
pub use state::{GameEvent, GameState, Preferences};
pub use world::{Location, World};
