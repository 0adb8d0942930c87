use dungeon_common::{Coordinate, Direction};
use dungeon_kernel::{GameState, KernelError};

/// Game inspector for the command layer and developer tooling.
///
/// Provides read-only queries against the game state.
pub struct GameInspector;

impl GameInspector {
    /// Produce a summary of the session.
    pub fn summary(state: &GameState) -> GameSummary {
        GameSummary {
            hero_name: state.hero().name().to_string(),
            position: state.hero_position(),
            locations: state.world().location_count(),
            explored: state.hero().exploration_log().len(),
            commands: state.command_history().command_count(),
            saved: state.is_saved(),
            pending_events: state.events().len(),
        }
    }

    /// Describe the location the hero stands in.
    pub fn describe_location(state: &GameState) -> Result<LocationView, KernelError> {
        let position = state.hero_position();
        let location = state.hero_location()?;
        let log = state.hero().exploration_log();
        let visited_exits = Direction::ALL
            .into_iter()
            .filter(|d| position.step(*d).is_some_and(|c| log.has_visited(c)))
            .collect();
        Ok(LocationView {
            position,
            others_here: location.occupant_count().saturating_sub(1),
            visits: log.visit_count(position),
            visited_exits,
        })
    }

    /// Draw the visited cells within `radius` of the hero, north at the top.
    ///
    /// `@` is the hero, `.` a visited cell, a space an unexplored one.
    pub fn explored_map(state: &GameState, radius: u32) -> String {
        let center = state.hero_position();
        let log = state.hero().exploration_log();
        let r = i64::from(radius);
        let mut out = String::new();
        for dy in (-r..=r).rev() {
            let row: String = (-r..=r)
                .map(|dx| {
                    let cell = cell_at(center, dx, dy);
                    match cell {
                        Some(c) if c == center => '@',
                        Some(c) if log.has_visited(c) => '.',
                        _ => ' ',
                    }
                })
                .collect();
            out.push_str(row.trim_end());
            out.push('\n');
        }
        out
    }
}

fn cell_at(center: Coordinate, dx: i64, dy: i64) -> Option<Coordinate> {
    let x = i32::try_from(i64::from(center.x) + dx).ok()?;
    let y = i32::try_from(i64::from(center.y) + dy).ok()?;
    Some(Coordinate::new(x, y))
}

/// Summary of the session for the inspector.
#[derive(Debug, Clone)]
pub struct GameSummary {
    pub hero_name: String,
    pub position: Coordinate,
    pub locations: usize,
    pub explored: usize,
    pub commands: u64,
    pub saved: bool,
    pub pending_events: usize,
}

impl std::fmt::Display for GameSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Game: hero={} position={} locations={} explored={} commands={} saved={} pending_events={}",
            self.hero_name,
            self.position,
            self.locations,
            self.explored,
            self.commands,
            self.saved,
            self.pending_events
        )
    }
}

/// What the hero sees where it stands.
#[derive(Debug, Clone)]
pub struct LocationView {
    pub position: Coordinate,
    /// Occupants other than the hero.
    pub others_here: usize,
    pub visits: u32,
    /// Directions leading to already-visited cells.
    pub visited_exits: Vec<Direction>,
}

impl std::fmt::Display for LocationView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "You are at {}.", self.position)?;
        if self.visits > 1 {
            write!(f, " You have been here {} times.", self.visits)?;
        }
        match self.others_here {
            0 => write!(f, " You are alone.")?,
            1 => write!(f, " Someone else is here.")?,
            n => write!(f, " {n} others are here.")?,
        }
        if !self.visited_exits.is_empty() {
            let names: Vec<&str> = self.visited_exits.iter().map(|d| d.name()).collect();
            write!(f, " Known ways: {}.", names.join(", "))?;
        }
        Ok(())
    }
}
