use dungeon_content::ContentLibrary;
use dungeon_kernel::{CommandHistory, Hero};
use std::fmt;

const BAR_WIDTH: usize = 20;

/// Render `current` out of `total` as a fraction, or as a bar when
/// `using_bars` is set. A zero total renders as "none".
pub fn progress(current: usize, total: usize, using_bars: bool) -> String {
    if total == 0 {
        return "none".to_string();
    }
    if !using_bars {
        return format!("{current}/{total}");
    }
    let filled = current.min(total) * BAR_WIDTH / total;
    format!("[{}{}]", "=".repeat(filled), " ".repeat(BAR_WIDTH - filled))
}

/// Command usage statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsReport {
    pub commands: u64,
    pub characters: u64,
    /// `None` before the first command.
    pub average_characters: Option<f64>,
}

impl StatisticsReport {
    pub fn from_history(history: &CommandHistory) -> Self {
        Self {
            commands: history.command_count(),
            characters: history.character_count(),
            average_characters: history.average_characters(),
        }
    }
}

impl fmt::Display for StatisticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Commands issued: {}", self.commands)?;
        writeln!(f, "Characters entered: {}", self.characters)?;
        match self.average_characters {
            Some(avg) => write!(f, "Average characters per command: {avg:.2}"),
            None => write!(f, "Average characters per command: N/A"),
        }
    }
}

/// Unlocked achievements against the loaded definitions.
#[derive(Debug, Clone)]
pub struct AchievementReport {
    pub progress: String,
    /// `(name, info)` of each unlocked achievement, in definition order.
    pub unlocked: Vec<(String, String)>,
}

impl AchievementReport {
    pub fn new(hero: &Hero, content: &ContentLibrary, using_bars: bool) -> Self {
        let tracker = hero.achievements();
        let unlocked: Vec<(String, String)> = content
            .achievements
            .iter()
            .filter(|a| tracker.is_unlocked(&a.id))
            .map(|a| (a.name.clone(), a.info.clone()))
            .collect();
        Self {
            progress: progress(unlocked.len(), content.achievements.len(), using_bars),
            unlocked,
        }
    }
}

impl fmt::Display for AchievementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Progress: {}", self.progress)?;
        for (name, info) in &self.unlocked {
            write!(f, "\n{name} {info}")?;
        }
        Ok(())
    }
}
