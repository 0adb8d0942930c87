use dungeon_common::{Coordinate, CreatureId, Direction};

/// Errors raised by the kernel.
///
/// Apart from `EdgeOfWorld`, every variant is an invariant violation: the
/// orchestration sequence went wrong or a restored save is corrupt. None of
/// them is recovered from locally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    #[error("no location at {0}: coordinate was never expanded")]
    LocationNotFound(Coordinate),
    #[error("hero {hero:?} is not in the location at its position {position}")]
    HeroMissing {
        hero: CreatureId,
        position: Coordinate,
    },
    #[error("hero {hero:?} occupies {} locations: {locations:?}", .locations.len())]
    HeroDuplicated {
        hero: CreatureId,
        locations: Vec<Coordinate>,
    },
    #[error("hero position {0} is missing from the exploration log")]
    UnvisitedPosition(Coordinate),
    #[error("exploration log disagrees with itself about {0}")]
    InconsistentLog(Coordinate),
    #[error("exploration log lists {0}, which was never expanded")]
    UnexpandedVisit(Coordinate),
    #[error("cannot move {direction} from {from}: edge of the world")]
    EdgeOfWorld {
        from: Coordinate,
        direction: Direction,
    },
}
