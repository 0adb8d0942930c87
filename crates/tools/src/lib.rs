//! Presentation tooling: read-only views of the game state for the command
//! layer and for debugging.
//!
//! # Invariants
//! - Tools never mutate the state they inspect.
//! - Empty content and zero counts render as explicit "nothing" text.

pub mod inspector;
pub mod report;

pub use inspector::{GameInspector, GameSummary, LocationView};
pub use report::{AchievementReport, StatisticsReport, progress};

pub fn crate_info() -> &'static str {
    "dungeon-tools v0.1.0"
}
