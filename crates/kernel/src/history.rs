use serde::{Deserialize, Serialize};

/// Running totals over the commands the player has typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandHistory {
    command_count: u64,
    character_count: u64,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one issued command and its characters.
    pub fn record(&mut self, command: &str) {
        self.command_count += 1;
        self.character_count += command.chars().count() as u64;
    }

    pub fn command_count(&self) -> u64 {
        self.command_count
    }

    pub fn character_count(&self) -> u64 {
        self.character_count
    }

    /// Mean characters per command, or `None` before the first command.
    pub fn average_characters(&self) -> Option<f64> {
        if self.command_count == 0 {
            return None;
        }
        Some(self.character_count as f64 / self.command_count as f64)
    }
}
