//! Error types.
//!
//! [`Rejection`] is the *expected* failure: an intent that the rules do not
//! allow. Rejections never mutate the battle; their `Display` text is the
//! reason handed back to the caller. [`SetupError`] covers battles that cannot
//! be created at all.

use skirmish_grid::{Cell, ObstacleError};
use thiserror::Error;

use crate::condition::{ActionKind, Condition};
use crate::ids::{OwnerId, UnitId};

/// Why an intent was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The battle has ended.
    #[error("battle is not active")]
    BattleNotActive,
    /// Intent from an owner that does not hold the turn.
    #[error("it is not owner {owner}'s turn")]
    NotYourTurn {
        /// Owner that sent the intent.
        owner: OwnerId,
    },
    /// Unknown unit id.
    #[error("unit {0} does not exist")]
    UnitNotFound(UnitId),
    /// The unit belongs to another owner.
    #[error("unit {unit} does not belong to owner {owner}")]
    NotOwner {
        /// Unit named by the intent.
        unit: UnitId,
        /// Owner that sent the intent.
        owner: OwnerId,
    },
    /// The unit is dead.
    #[error("unit {0} is dead")]
    UnitDead(UnitId),
    /// Action intent before any unit was nominated.
    #[error("no unit has been nominated this turn")]
    NoActiveUnit,
    /// Nomination while another unit already holds the turn.
    #[error("unit {0} is already acting this turn")]
    UnitAlreadyActive(UnitId),
    /// Unit at its action-mark cap outside competitive mode.
    #[error("unit {unit} is exhausted ({marks}/{cap} action marks)")]
    Exhausted {
        /// Exhausted unit.
        unit: UnitId,
        /// Current marks.
        marks: u32,
        /// Category cap.
        cap: u32,
    },
    /// Destination off the grid.
    #[error("cell {} is outside the grid", show(.0))]
    OutOfBounds(Cell),
    /// Move to the cell the unit already stands on.
    #[error("unit is already at the destination")]
    SamePosition,
    /// Not enough movement for the distance alone.
    #[error("insufficient movement: need {cost}, have {available}")]
    InsufficientMovement {
        /// Total cost of the move.
        cost: u32,
        /// Movement left.
        available: u32,
    },
    /// The distance is affordable but disengaging is not.
    #[error("blocked by engagement: need {cost} (of which {engagement} to disengage), have {available}")]
    BlockedByEngagement {
        /// Total cost of the move.
        cost: u32,
        /// Engagement share of the cost.
        engagement: u32,
        /// Movement left.
        available: u32,
    },
    /// Both L-routes are obstructed.
    #[error("no clear route to {}", show(.0))]
    PathBlocked(Cell),
    /// A living unit, corpse or obstacle occupies the destination.
    #[error("destination {} is occupied", show(.0))]
    DestinationOccupied(Cell),
    /// Target not adjacent.
    #[error("target is out of range (distance {distance})")]
    OutOfRange {
        /// Footprint distance to the target.
        distance: u32,
    },
    /// No actions left this turn.
    #[error("unit {0} has no actions left")]
    NoActionsLeft(UnitId),
    /// A condition forbids the action.
    #[error("{condition} prevents {action}")]
    ConditionBlocked {
        /// Blocking condition.
        condition: Condition,
        /// Action that was attempted.
        action: ActionKind,
    },
    /// Hostile action against a unit of the same side.
    #[error("unit {0} is friendly")]
    FriendlyTarget(UnitId),
    /// Nothing destructible at the struck cell.
    #[error("nothing to strike at {}", show(.0))]
    NothingToStrike(Cell),
    /// The maneuver needs a different kind of target.
    #[error("invalid target for {0}")]
    InvalidManeuverTarget(&'static str),
    /// Obstacle layout refused the strike.
    #[error(transparent)]
    Obstacle(#[from] ObstacleError),
}

fn show(cell: &Cell) -> String {
    format!("({}, {})", cell.x, cell.y)
}

impl Rejection {
    /// The reason string handed back to callers.
    #[must_use]
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// Why a battle could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// Fewer than two sides have units.
    #[error("a battle needs at least two sides with units")]
    NotEnoughSides,
    /// Zero-sized grid.
    #[error("grid must be at least 1x1")]
    EmptyGrid,
    /// A unit footprint leaves the grid.
    #[error("unit {0} does not fit on the grid")]
    UnitOutOfBounds(UnitId),
    /// Two units overlap, or a unit overlaps a blocking obstacle.
    #[error("unit {0} overlaps another unit or obstacle")]
    Overlap(UnitId),
    /// Two spawns share an id.
    #[error("unit id {0} is used twice")]
    DuplicateUnit(UnitId),
    /// The initiating side has no units.
    #[error("initiator {0} has no units")]
    UnknownInitiator(OwnerId),
}
