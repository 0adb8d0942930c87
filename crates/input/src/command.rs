use dungeon_common::{Direction, ParseDirectionError};

/// A high-level command the dispatch layer executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Walk one cell.
    Go(Direction),
    /// Describe the current location.
    Look,
    /// Draw the explored neighbourhood.
    Map,
    /// Show the next hint.
    Hint,
    /// Show the next poem.
    Poem,
    /// List unlocked achievements.
    Achievements,
    /// Show command statistics.
    Statistics,
    /// Persist the session.
    Save,
    /// Replace the session with the latest save.
    Load,
    /// Toggle a presentation preference.
    Config(ConfigOption),
    Help,
    Quit,
}

/// Preferences that `config` can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOption {
    Bold,
    Bars,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty input")]
    Empty,
    #[error("unknown command {0:?}; type 'help'")]
    UnknownCommand(String),
    #[error("'{command}' needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error(transparent)]
    Direction(#[from] ParseDirectionError),
    #[error("unknown option {0:?}; try 'bold' or 'bars'")]
    UnknownOption(String),
}

/// Parse one line of player input. Words are case-insensitive.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err(ParseError::Empty);
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "go" | "walk" => {
            let target = words.next().ok_or(ParseError::MissingArgument {
                command: "go",
                expected: "a direction",
            })?;
            Command::Go(target.parse()?)
        }
        "n" | "north" => Command::Go(Direction::North),
        "e" | "east" => Command::Go(Direction::East),
        "s" | "south" => Command::Go(Direction::South),
        "w" | "west" => Command::Go(Direction::West),
        "look" | "l" => Command::Look,
        "map" => Command::Map,
        "hint" | "tutorial" => Command::Hint,
        "poem" => Command::Poem,
        "achievements" => Command::Achievements,
        "statistics" | "stats" => Command::Statistics,
        "save" => Command::Save,
        "load" => Command::Load,
        "config" => {
            let option = words.next().ok_or(ParseError::MissingArgument {
                command: "config",
                expected: "an option",
            })?;
            match option.to_ascii_lowercase().as_str() {
                "bold" => Command::Config(ConfigOption::Bold),
                "bars" => Command::Config(ConfigOption::Bars),
                other => return Err(ParseError::UnknownOption(other.to_string())),
            }
        }
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    tracing::trace!(?command, "parsed input");
    Ok(command)
}
