use dungeon_common::{Coordinate, Direction};
use serde::{Deserialize, Serialize};

use crate::cursor::ContentCursor;
use crate::error::KernelError;
use crate::hero::{DEFAULT_HERO_NAME, Hero};
use crate::history::CommandHistory;
use crate::world::{Location, World};

/// An event record produced by every mutation of the game state.
///
/// Events are transient: they feed logging and tooling during a session and
/// are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new Location was materialized.
    LocationExpanded { coordinate: Coordinate },
    /// The hero left `from` and entered `to`. `first_visit` is true when `to`
    /// had never been entered before.
    HeroMoved {
        from: Coordinate,
        to: Coordinate,
        first_visit: bool,
    },
    /// A command was counted in the history.
    CommandRecorded { characters: usize },
    AchievementUnlocked { id: String },
    PreferenceChanged { name: String, value: bool },
}

/// Presentation toggles the player can flip with `config`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Render text in bold.
    pub bold: bool,
    /// Draw bars instead of fractions wherever possible.
    pub using_bars: bool,
}

/// The aggregate root of a play session.
///
/// Owns the world, the hero and the hero's position, and keeps them in step:
/// after construction the Location at `hero_position` always exists and is
/// the only Location holding the hero. Position, occupancy and the
/// exploration log change only through [`GameState::move_hero`].
///
/// `saved` tells whether the persisted copy matches memory. It is cleared by
/// every mutation, set by the persistence layer after a successful write, and
/// never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    command_history: CommandHistory,
    hero: Hero,
    hero_position: Coordinate,
    world: World,
    preferences: Preferences,
    hint_cursor: ContentCursor,
    poem_cursor: ContentCursor,
    #[serde(skip)]
    saved: bool,
    #[serde(skip)]
    event_log: Vec<GameEvent>,
}

impl GameState {
    /// Start a new session with the default hero.
    pub fn new() -> Self {
        Self::with_hero_name(DEFAULT_HERO_NAME)
    }

    /// Start a new session: the hero stands at the origin, which is the only
    /// expanded and visited cell, and there is nothing to save yet.
    pub fn with_hero_name(name: impl Into<String>) -> Self {
        let command_history = CommandHistory::new();
        let mut hero = Hero::new(name);
        let hero_position = Coordinate::ORIGIN;
        let mut world = World::new();

        world.expand(hero_position);
        world.materialize(hero_position).add_creature(hero.id());
        hero.exploration_log_mut().add_visit(hero_position);

        tracing::debug!(hero = hero.name(), "new game state");

        Self {
            command_history,
            hero,
            hero_position,
            world,
            preferences: Preferences::default(),
            hint_cursor: ContentCursor::new(),
            poem_cursor: ContentCursor::new(),
            saved: true,
            event_log: Vec::new(),
        }
    }

    pub fn hero(&self) -> &Hero {
        &self.hero
    }

    pub fn hero_position(&self) -> Coordinate {
        self.hero_position
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn command_history(&self) -> &CommandHistory {
        &self.command_history
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    /// The Location currently holding the hero.
    pub fn hero_location(&self) -> Result<&Location, KernelError> {
        self.world.location(self.hero_position)
    }

    /// Move the hero to `target`, expanding the world if needed.
    ///
    /// The hero is removed from its current Location, `target` is expanded,
    /// the position is updated, the hero is added to the target Location,
    /// the visit is logged and the session becomes unsaved. The current
    /// Location is validated first; if it is missing or does not hold the
    /// hero, nothing is changed and the violation is returned.
    pub fn move_hero(&mut self, target: Coordinate) -> Result<(), KernelError> {
        let hero = self.hero.id();
        let from = self.hero_position;

        let current = self.world.location_mut(from)?;
        if !current.contains(hero) {
            return Err(KernelError::HeroMissing {
                hero,
                position: from,
            });
        }
        current.remove_creature(hero);

        if self.world.expand(target) {
            self.event_log
                .push(GameEvent::LocationExpanded { coordinate: target });
        }
        self.hero_position = target;
        self.world.materialize(target).add_creature(hero);
        let first_visit = self.hero.exploration_log_mut().add_visit(target);
        self.saved = false;

        tracing::debug!(%from, to = %target, first_visit, "hero moved");
        self.event_log.push(GameEvent::HeroMoved {
            from,
            to: target,
            first_visit,
        });
        Ok(())
    }

    /// Walk one cell in `direction`. Returns the new position.
    pub fn move_hero_in(&mut self, direction: Direction) -> Result<Coordinate, KernelError> {
        let from = self.hero_position;
        let target = from
            .step(direction)
            .ok_or(KernelError::EdgeOfWorld { from, direction })?;
        self.move_hero(target)?;
        Ok(target)
    }

    /// Count a command the player issued.
    pub fn record_command(&mut self, command: &str) {
        self.command_history.record(command);
        self.saved = false;
        self.event_log.push(GameEvent::CommandRecorded {
            characters: command.chars().count(),
        });
    }

    /// Mark an achievement as unlocked. Returns `true` if it was new.
    pub fn unlock_achievement(&mut self, id: &str) -> bool {
        if !self.hero.achievements_mut().unlock(id) {
            return false;
        }
        tracing::info!(achievement = id, "achievement unlocked");
        self.saved = false;
        self.event_log
            .push(GameEvent::AchievementUnlocked { id: id.to_string() });
        true
    }

    pub fn set_bold(&mut self, bold: bool) {
        if self.preferences.bold != bold {
            self.preferences.bold = bold;
            self.preference_changed("bold", bold);
        }
    }

    pub fn set_using_bars(&mut self, using_bars: bool) {
        if self.preferences.using_bars != using_bars {
            self.preferences.using_bars = using_bars;
            self.preference_changed("bars", using_bars);
        }
    }

    fn preference_changed(&mut self, name: &str, value: bool) {
        self.saved = false;
        self.event_log.push(GameEvent::PreferenceChanged {
            name: name.to_string(),
            value,
        });
    }

    /// Index of the hint that will be shown next.
    pub fn hint_index(&self) -> usize {
        self.hint_cursor.index()
    }

    /// Index of the poem that will be shown next.
    pub fn poem_index(&self) -> usize {
        self.poem_cursor.index()
    }

    /// The hint under the cursor, advancing past it. `None` if `hints` is empty.
    pub fn next_hint<'a, T>(&mut self, hints: &'a [T]) -> Option<&'a T> {
        let hint = self.hint_cursor.take_next(hints)?;
        self.saved = false;
        Some(hint)
    }

    /// The poem under the cursor, advancing past it. `None` if `poems` is empty.
    pub fn next_poem<'a, T>(&mut self, poems: &'a [T]) -> Option<&'a T> {
        let poem = self.poem_cursor.take_next(poems)?;
        self.saved = false;
        Some(poem)
    }

    /// Whether the persisted copy matches memory.
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Record that the current state was just persisted successfully.
    pub fn mark_saved(&mut self) {
        self.saved = true;
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[GameEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Verify the cross-entity invariants.
    ///
    /// Holds for every state reachable through this API; a failure means a
    /// corrupt restore or a bug in the orchestration.
    pub fn check_invariants(&self) -> Result<(), KernelError> {
        let hero = self.hero.id();
        let position = self.hero_position;

        if !self.hero_location()?.contains(hero) {
            return Err(KernelError::HeroMissing { hero, position });
        }
        let locations = self.world.locations_containing(hero);
        if locations.len() != 1 {
            return Err(KernelError::HeroDuplicated { hero, locations });
        }

        let log = self.hero.exploration_log();
        if let Some(c) = log.inconsistency() {
            return Err(KernelError::InconsistentLog(c));
        }
        if !log.has_visited(position) {
            return Err(KernelError::UnvisitedPosition(position));
        }
        if let Some(c) = log.visited().find(|c| !self.world.contains(*c)) {
            return Err(KernelError::UnexpandedVisit(c));
        }
        Ok(())
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
