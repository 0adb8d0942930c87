//! Text input: one typed line becomes one [`Command`].
//!
//! # Invariants
//! - Parsing never touches game state; dispatch happens in the caller.
//! - Blank lines are not commands and are not counted in the history.

pub mod command;

pub use command::{Command, ConfigOption, ParseError, parse};

pub fn crate_info() -> &'static str {
    "dungeon-input v0.1.0"
}
