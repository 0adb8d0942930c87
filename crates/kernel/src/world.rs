use dungeon_common::{Coordinate, CreatureId};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::KernelError;

/// A single grid cell: a plain container of occupant creatures.
///
/// Location does not enforce that a creature lives in only one place; the
/// caller that moves a creature removes it first and adds it after.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    occupants: BTreeSet<CreatureId>,
}

impl Location {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a creature to the occupant set. Adding twice has no extra effect.
    pub fn add_creature(&mut self, id: CreatureId) {
        self.occupants.insert(id);
    }

    /// Remove a creature. Returns whether it was present.
    pub fn remove_creature(&mut self, id: CreatureId) -> bool {
        self.occupants.remove(&id)
    }

    pub fn contains(&self, id: CreatureId) -> bool {
        self.occupants.contains(&id)
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }
}

/// The sparse, lazily expanding world grid.
///
/// A Location exists at a coordinate iff that coordinate has been expanded.
/// Locations are never removed, so the world only grows for the lifetime of
/// a session. Memory is proportional to what was explored, not to map extent.
///
/// Uses BTreeMap for deterministic iteration and serialization order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    locations: BTreeMap<Coordinate, Location>,
}

impl World {
    /// Create an empty world. No coordinate is expanded yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a Location exists at `coordinate`.
    ///
    /// Returns `true` when a new, empty Location was materialized and `false`
    /// when one was already there (in which case nothing changes).
    pub fn expand(&mut self, coordinate: Coordinate) -> bool {
        let before = self.locations.len();
        self.materialize(coordinate);
        self.locations.len() != before
    }

    /// Expand `coordinate` if needed and hand back its Location.
    pub fn materialize(&mut self, coordinate: Coordinate) -> &mut Location {
        match self.locations.entry(coordinate) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                tracing::debug!(%coordinate, "expanded world");
                entry.insert(Location::new())
            }
        }
    }

    /// Whether `coordinate` has been expanded.
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        self.locations.contains_key(&coordinate)
    }

    /// The Location at an expanded coordinate.
    pub fn location(&self, coordinate: Coordinate) -> Result<&Location, KernelError> {
        self.locations
            .get(&coordinate)
            .ok_or(KernelError::LocationNotFound(coordinate))
    }

    pub fn location_mut(&mut self, coordinate: Coordinate) -> Result<&mut Location, KernelError> {
        self.locations
            .get_mut(&coordinate)
            .ok_or(KernelError::LocationNotFound(coordinate))
    }

    /// Number of materialized Locations.
    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    /// Read-only access to all Locations in coordinate order.
    pub fn locations(&self) -> impl Iterator<Item = (Coordinate, &Location)> + '_ {
        self.locations.iter().map(|(c, l)| (*c, l))
    }

    /// Every coordinate whose Location lists `id` as an occupant.
    pub fn locations_containing(&self, id: CreatureId) -> Vec<Coordinate> {
        self.locations
            .iter()
            .filter(|(_, l)| l.contains(id))
            .map(|(c, _)| *c)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_starts_empty() {
        let w = World::new();
        assert_eq!(w.location_count(), 0);
        assert!(!w.contains(Coordinate::ORIGIN));
    }

    #[test]
    fn expand_materializes_empty_location() {
        let mut w = World::new();
        assert!(w.expand(Coordinate::new(2, -3)));
        let loc = w.location(Coordinate::new(2, -3)).unwrap();
        assert!(loc.is_empty());
        assert_eq!(w.location_count(), 1);
    }

    #[test]
    fn expand_is_idempotent() {
        let mut once = World::new();
        once.expand(Coordinate::new(1, 1));

        let mut twice = World::new();
        assert!(twice.expand(Coordinate::new(1, 1)));
        assert!(!twice.expand(Coordinate::new(1, 1)));

        assert_eq!(once, twice);
    }

    #[test]
    fn expand_keeps_existing_occupants() {
        let mut w = World::new();
        let id = CreatureId::new();
        w.expand(Coordinate::ORIGIN);
        w.location_mut(Coordinate::ORIGIN).unwrap().add_creature(id);
        w.expand(Coordinate::ORIGIN);
        assert!(w.location(Coordinate::ORIGIN).unwrap().contains(id));
    }

    #[test]
    fn materialize_returns_existing_location() {
        let mut w = World::new();
        let id = CreatureId::new();
        w.materialize(Coordinate::new(0, 2)).add_creature(id);
        assert!(w.materialize(Coordinate::new(0, 2)).contains(id));
        assert_eq!(w.location_count(), 1);
    }

    #[test]
    fn expand_touches_no_other_coordinate() {
        let mut w = World::new();
        w.expand(Coordinate::new(5, 5));
        assert!(!w.contains(Coordinate::new(5, 4)));
        assert!(!w.contains(Coordinate::new(4, 5)));
        assert_eq!(w.location_count(), 1);
    }

    #[test]
    fn unexpanded_location_is_not_found() {
        let w = World::new();
        assert_eq!(
            w.location(Coordinate::new(9, 9)),
            Err(KernelError::LocationNotFound(Coordinate::new(9, 9)))
        );
    }

    #[test]
    fn location_add_remove() {
        let mut loc = Location::new();
        let a = CreatureId::new();
        let b = CreatureId::new();
        loc.add_creature(a);
        loc.add_creature(a);
        loc.add_creature(b);
        assert_eq!(loc.occupant_count(), 2);

        assert!(loc.remove_creature(a));
        assert!(!loc.remove_creature(a)); // absent: no-op
        assert!(!loc.contains(a));
        assert!(loc.contains(b));
    }

    #[test]
    fn locations_containing_finds_every_copy() {
        let mut w = World::new();
        let id = CreatureId::new();
        for c in [Coordinate::new(0, 0), Coordinate::new(0, 1), Coordinate::new(3, 3)] {
            w.expand(c);
        }
        w.location_mut(Coordinate::new(0, 1)).unwrap().add_creature(id);
        w.location_mut(Coordinate::new(3, 3)).unwrap().add_creature(id);
        assert_eq!(
            w.locations_containing(id),
            vec![Coordinate::new(0, 1), Coordinate::new(3, 3)]
        );
    }

    #[test]
    fn btreemap_gives_deterministic_iteration() {
        let mut w = World::new();
        for (x, y) in [(3, 1), (-2, 0), (0, 5), (-2, -7)] {
            w.expand(Coordinate::new(x, y));
        }
        let keys: Vec<Coordinate> = w.locations().map(|(c, _)| c).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
