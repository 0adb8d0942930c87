use dungeon_common::{Coordinate, CreatureId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default name given to a freshly created hero.
pub const DEFAULT_HERO_NAME: &str = "Seth";

/// Record of every coordinate the hero has occupied.
///
/// Membership is append-only: a coordinate, once visited, stays visited.
/// First visits are also kept in order for presentation, and each visit is
/// counted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorationLog {
    order: Vec<Coordinate>,
    visits: BTreeMap<Coordinate, u32>,
}

impl ExplorationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visit. Returns `true` on the first visit to `coordinate`.
    pub fn add_visit(&mut self, coordinate: Coordinate) -> bool {
        let count = self.visits.entry(coordinate).or_insert(0);
        *count = count.saturating_add(1);
        if *count == 1 {
            self.order.push(coordinate);
            true
        } else {
            false
        }
    }

    pub fn has_visited(&self, coordinate: Coordinate) -> bool {
        self.visits.contains_key(&coordinate)
    }

    /// How many times the hero entered `coordinate` (0 if never).
    pub fn visit_count(&self, coordinate: Coordinate) -> u32 {
        self.visits.get(&coordinate).copied().unwrap_or(0)
    }

    /// Number of distinct coordinates visited.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Visited coordinates in the order they were first entered.
    pub fn in_visit_order(&self) -> &[Coordinate] {
        &self.order
    }

    /// Visited coordinates as recorded in the visit counts.
    pub fn visited(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.visits.keys().copied()
    }

    /// First coordinate on which the visit order and the visit counts
    /// disagree, if any.
    ///
    /// Always `None` for a log built through [`ExplorationLog::add_visit`];
    /// a decoded log may not be.
    pub fn inconsistency(&self) -> Option<Coordinate> {
        if let Some((c, _)) = self.visits.iter().find(|(_, count)| **count == 0) {
            return Some(*c);
        }
        let mut seen = BTreeSet::new();
        for c in &self.order {
            if !seen.insert(*c) || !self.visits.contains_key(c) {
                return Some(*c);
            }
        }
        self.visits.keys().find(|c| !seen.contains(*c)).copied()
    }
}

/// Ids of the achievements the hero has unlocked.
///
/// Achievement definitions and the rules that unlock them live outside the
/// kernel; this only remembers the outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementTracker {
    unlocked: BTreeSet<String>,
}

impl AchievementTracker {
    /// Returns `true` if `id` was not unlocked before.
    pub fn unlock(&mut self, id: impl Into<String>) -> bool {
        self.unlocked.insert(id.into())
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains(id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }
}

/// The player-controlled creature.
///
/// Created once per session and never replaced; its id is what Locations
/// store as an occupant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    id: CreatureId,
    name: String,
    exploration_log: ExplorationLog,
    achievements: AchievementTracker,
}

impl Hero {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CreatureId::new(),
            name: name.into(),
            exploration_log: ExplorationLog::new(),
            achievements: AchievementTracker::default(),
        }
    }

    pub fn id(&self) -> CreatureId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exploration_log(&self) -> &ExplorationLog {
        &self.exploration_log
    }

    pub fn achievements(&self) -> &AchievementTracker {
        &self.achievements
    }

    // Only GameState records visits, so that the log moves with occupancy.
    pub(crate) fn exploration_log_mut(&mut self) -> &mut ExplorationLog {
        &mut self.exploration_log
    }

    pub(crate) fn achievements_mut(&mut self) -> &mut AchievementTracker {
        &mut self.achievements
    }
}

impl Default for Hero {
    fn default() -> Self {
        Self::new(DEFAULT_HERO_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_membership_is_idempotent() {
        let mut log = ExplorationLog::new();
        let c = Coordinate::new(1, 0);
        assert!(log.add_visit(c));
        assert!(!log.add_visit(c));
        assert_eq!(log.len(), 1);
        assert_eq!(log.visit_count(c), 2);
        assert!(log.has_visited(c));
    }

    #[test]
    fn log_keeps_first_visit_order() {
        let mut log = ExplorationLog::new();
        for (x, y) in [(0, 0), (1, 0), (0, 0), (-1, 2), (1, 0)] {
            log.add_visit(Coordinate::new(x, y));
        }
        assert_eq!(
            log.in_visit_order(),
            &[
                Coordinate::new(0, 0),
                Coordinate::new(1, 0),
                Coordinate::new(-1, 2)
            ]
        );
    }

    #[test]
    fn unvisited_coordinate_has_zero_count() {
        let log = ExplorationLog::new();
        assert!(log.is_empty());
        assert_eq!(log.visit_count(Coordinate::new(4, 4)), 0);
        assert!(!log.has_visited(Coordinate::new(4, 4)));
    }

    #[test]
    fn log_built_by_visits_is_consistent() {
        let mut log = ExplorationLog::new();
        for (x, y) in [(0, 0), (0, 1), (0, 0), (5, -2)] {
            log.add_visit(Coordinate::new(x, y));
        }
        assert_eq!(log.inconsistency(), None);
        assert_eq!(log.visited().count(), log.len());
    }

    #[test]
    fn decoded_log_with_extra_visit_count_is_inconsistent() {
        let mut log = ExplorationLog::new();
        log.add_visit(Coordinate::ORIGIN);
        log.visits.insert(Coordinate::new(99, 99), 1);
        assert_eq!(log.inconsistency(), Some(Coordinate::new(99, 99)));
    }

    #[test]
    fn decoded_log_with_repeated_or_uncounted_order_is_inconsistent() {
        let mut log = ExplorationLog::new();
        log.add_visit(Coordinate::ORIGIN);
        log.order.push(Coordinate::ORIGIN);
        assert_eq!(log.inconsistency(), Some(Coordinate::ORIGIN));

        let mut log = ExplorationLog::new();
        log.order.push(Coordinate::new(3, 3));
        assert_eq!(log.inconsistency(), Some(Coordinate::new(3, 3)));

        let mut log = ExplorationLog::new();
        log.add_visit(Coordinate::ORIGIN);
        log.visits.insert(Coordinate::ORIGIN, 0);
        assert_eq!(log.inconsistency(), Some(Coordinate::ORIGIN));
    }

    #[test]
    fn achievements_unlock_once() {
        let mut tracker = AchievementTracker::default();
        assert!(tracker.unlock("first_steps"));
        assert!(!tracker.unlock("first_steps"));
        assert!(tracker.is_unlocked("first_steps"));
        assert!(!tracker.is_unlocked("cartographer"));
        assert_eq!(tracker.unlocked_count(), 1);
    }

    #[test]
    fn default_hero_is_named_seth() {
        let hero = Hero::default();
        assert_eq!(hero.name(), "Seth");
        assert!(hero.exploration_log().is_empty());
        assert_eq!(hero.achievements().unlocked_count(), 0);
    }

    #[test]
    fn heroes_have_distinct_ids() {
        assert_ne!(Hero::new("a").id(), Hero::new("b").id());
    }
}
