//! Interactive session: reads commands, dispatches them to the kernel and
//! writes the presentation text.

use anyhow::Context;
use dungeon_content::ContentLibrary;
use dungeon_input::{Command, ConfigOption, ParseError};
use dungeon_kernel::{GameState, KernelError};
use dungeon_persist::{SaveStore, StoreError};
use dungeon_tools::{AchievementReport, GameInspector, StatisticsReport, progress};
use std::io::{BufRead, Write};

const HELP: &str = "\
commands:
  go <direction>   walk north, east, south or west (or just n, e, s, w)
  look             describe where you are
  map              draw the places you have visited
  hint             show the next hint
  poem             show the next poem
  achievements     list unlocked achievements
  stats            show command statistics
  config bold      toggle bold text
  config bars      toggle bars instead of fractions
  save             save the game
  load             load the last saved game
  help             this message
  quit             leave the game";

/// Whether the read loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    state: GameState,
    content: ContentLibrary,
    store: SaveStore,
    map_radius: u32,
    /// Destructive command the player was just warned about.
    confirming: Option<Command>,
}

impl Session {
    pub fn new(state: GameState, content: ContentLibrary, store: SaveStore) -> Self {
        Self {
            state,
            content,
            store,
            map_radius: 3,
            confirming: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Read commands until `quit` or end of input.
    pub fn run(&mut self, input: impl BufRead, mut out: impl Write) -> anyhow::Result<()> {
        let view = GameInspector::describe_location(&self.state)?;
        self.emit(&mut out, &format!("Welcome, {}. {view}", self.state.hero().name()))?;

        write!(out, "> ")?;
        out.flush()?;
        for line in input.lines() {
            let line = line.context("failed to read input")?;
            if self.handle_line(&line, &mut out)? == Flow::Quit {
                return Ok(());
            }
            write!(out, "> ")?;
            out.flush()?;
        }
        writeln!(out)?;
        if !self.state.is_saved() {
            tracing::warn!("input ended with unsaved progress");
        }
        Ok(())
    }

    /// Execute one line of input.
    ///
    /// Returns an error only for kernel invariant violations or output
    /// failures; both end the session.
    pub fn handle_line(&mut self, line: &str, out: &mut impl Write) -> anyhow::Result<Flow> {
        let command = match dungeon_input::parse(line) {
            Ok(command) => command,
            Err(ParseError::Empty) => return Ok(Flow::Continue),
            Err(e) => {
                self.confirming = None;
                self.state.record_command(line.trim());
                self.emit(out, &e.to_string())?;
                return Ok(Flow::Continue);
            }
        };

        let needs_confirmation = self.needs_confirmation(command);
        if command != Command::Quit {
            self.state.record_command(line.trim());
        }
        if needs_confirmation {
            self.confirming = Some(command);
            let verb = if command == Command::Quit { "quit" } else { "load" };
            self.emit(
                out,
                &format!(
                    "You have unsaved progress. Type 'save' first, or '{verb}' again to discard it."
                ),
            )?;
            return Ok(Flow::Continue);
        }
        self.confirming = None;
        if command == Command::Quit {
            return Ok(Flow::Quit);
        }

        self.dispatch(command, out)?;

        for event in self.state.drain_events() {
            tracing::debug!(?event, "game event");
        }
        Ok(Flow::Continue)
    }

    fn dispatch(&mut self, command: Command, out: &mut impl Write) -> anyhow::Result<()> {
        match command {
            Command::Go(direction) => match self.state.move_hero_in(direction) {
                Ok(_) => {
                    self.look(out)?;
                    self.award_exploration(out)?;
                }
                Err(KernelError::EdgeOfWorld { .. }) => {
                    self.emit(out, &format!("You cannot go any further {direction}."))?;
                }
                Err(e) => return Err(e).context("game state invariant violated"),
            },
            Command::Look => self.look(out)?,
            Command::Map => {
                let map = GameInspector::explored_map(&self.state, self.map_radius);
                self.emit(out, map.trim_end_matches('\n'))?;
            }
            Command::Hint => {
                let text = match self.state.next_hint(&self.content.hints) {
                    Some(hint) => hint.clone(),
                    None => "No hints were loaded.".to_string(),
                };
                self.emit(out, &text)?;
            }
            Command::Poem => {
                let text = match self.state.next_poem(&self.content.poems) {
                    Some(poem) => poem.to_string(),
                    None => "No poems were loaded.".to_string(),
                };
                self.emit(out, &text)?;
            }
            Command::Achievements => {
                let report = AchievementReport::new(
                    self.state.hero(),
                    &self.content,
                    self.state.preferences().using_bars,
                );
                self.emit(out, &report.to_string())?;
            }
            Command::Statistics => {
                let report = StatisticsReport::from_history(self.state.command_history());
                let explored = self.state.hero().exploration_log().len();
                self.emit(out, &format!("{report}\nPlaces explored: {explored}"))?;
            }
            Command::Save => match self.store.save(&mut self.state) {
                Ok(slot) => self.emit(out, &format!("Game saved (slot {slot})."))?,
                Err(e) => {
                    tracing::error!("failed to save game: {e}");
                    self.emit(out, &format!("Could not save: {e}"))?;
                }
            },
            Command::Load => match self.store.load_latest() {
                Ok(state) => {
                    self.state = state;
                    self.emit(out, "Game loaded.")?;
                    self.look(out)?;
                }
                Err(StoreError::NoSaves) => self.emit(out, "There is no saved game.")?,
                Err(e) => {
                    tracing::error!("failed to load game: {e}");
                    self.emit(out, &format!("Could not load: {e}"))?;
                }
            },
            Command::Config(ConfigOption::Bold) => {
                let bold = !self.state.preferences().bold;
                self.state.set_bold(bold);
                self.emit(out, &format!("Bold text is now {}.", on_off(bold)))?;
            }
            Command::Config(ConfigOption::Bars) => {
                let bars = !self.state.preferences().using_bars;
                self.state.set_using_bars(bars);
                self.emit(out, &format!("Bars are now {}.", on_off(bars)))?;
            }
            Command::Help => self.emit(out, HELP)?,
            Command::Quit => {}
        }
        Ok(())
    }

    /// Whether `command` would throw away unsaved progress without the
    /// player having just been warned about it.
    fn needs_confirmation(&self, command: Command) -> bool {
        let destructive = match command {
            Command::Quit => true,
            Command::Load => self.store.meta().save_count > 0,
            _ => false,
        };
        destructive && !self.state.is_saved() && self.confirming != Some(command)
    }

    fn look(&self, out: &mut impl Write) -> anyhow::Result<()> {
        let view = GameInspector::describe_location(&self.state)
            .context("game state invariant violated")?;
        self.emit(out, &view.to_string())
    }

    /// Unlock the threshold achievements the current exploration earns.
    fn award_exploration(&mut self, out: &mut impl Write) -> anyhow::Result<()> {
        let hero = self.state.hero();
        let explored = hero.exploration_log().len();
        let earned: Vec<(String, String)> = self
            .content
            .earned_by_exploration(explored, |id| hero.achievements().is_unlocked(id))
            .map(|a| (a.id.clone(), a.name.clone()))
            .collect();
        for (id, name) in earned {
            self.state.unlock_achievement(&id);
            let unlocked = self.state.hero().achievements().unlocked_count();
            let total = self.content.achievements.len();
            let shown = progress(unlocked, total, self.state.preferences().using_bars);
            self.emit(out, &format!("Achievement unlocked: {name} ({shown})"))?;
        }
        Ok(())
    }

    fn emit(&self, out: &mut impl Write, text: &str) -> anyhow::Result<()> {
        if self.state.preferences().bold {
            writeln!(out, "\x1b[1m{text}\x1b[0m")?;
        } else {
            writeln!(out, "{text}")?;
        }
        Ok(())
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}
