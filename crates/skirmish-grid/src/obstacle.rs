//! Obstacle layout supplied by the map generator.
//!
//! The layout is fixed at battle start. The only mutation the engine performs
//! is striking an obstacle: each strike removes HP and an obstacle at 0 HP is
//! destroyed, which clears any path blocking it caused. Destroyed obstacles
//! stay in the layout (with `destroyed == true`) so snapshots keep the full
//! history of the map.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::Cell;

/// Identifier of an obstacle within one layout.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObstacleId(u32);

impl ObstacleId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ObstacleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObstacleId({})", self.0)
    }
}

impl fmt::Display for ObstacleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single-cell obstacle (rock, crate, barricade).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Identifier, unique within the layout.
    pub id: ObstacleId,
    /// Cell the obstacle occupies.
    pub position: Cell,
    /// Remaining hit points.
    pub hp: u32,
    /// Set once `hp` reaches 0. Never reset.
    pub destroyed: bool,
    /// Whether the obstacle stops movement through its cell while standing.
    pub blocks_path: bool,
}

impl Obstacle {
    /// Creates a standing, path-blocking obstacle.
    #[must_use]
    pub fn new(id: ObstacleId, position: Cell, hp: u32) -> Self {
        Self {
            id,
            position,
            hp,
            destroyed: false,
            blocks_path: true,
        }
    }

    /// Returns true if the obstacle currently blocks its cell.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.blocks_path && !self.destroyed
    }
}

/// Result of striking an obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeOutcome {
    /// Obstacle that was struck.
    pub obstacle: ObstacleId,
    /// HP before the strike.
    pub hp_before: u32,
    /// HP after the strike.
    pub hp_after: u32,
    /// True if this strike destroyed the obstacle.
    pub destroyed: bool,
}

/// Errors raised by layout mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObstacleError {
    /// No obstacle with this id.
    #[error("obstacle {0} does not exist")]
    NotFound(ObstacleId),
    /// The obstacle was already destroyed.
    #[error("obstacle {0} is already destroyed")]
    AlreadyDestroyed(ObstacleId),
}

/// All obstacles of one battle map, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleLayout {
    obstacles: BTreeMap<ObstacleId, Obstacle>,
}

impl ObstacleLayout {
    /// Creates an empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a layout from generated obstacles. Later duplicates of an id win.
    #[must_use]
    pub fn from_obstacles(obstacles: impl IntoIterator<Item = Obstacle>) -> Self {
        Self {
            obstacles: obstacles.into_iter().map(|o| (o.id, o)).collect(),
        }
    }

    /// Looks up an obstacle by id.
    #[must_use]
    pub fn get(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.get(&id)
    }

    /// Returns the standing obstacle at a cell, if any.
    #[must_use]
    pub fn standing_at(&self, cell: Cell) -> Option<&Obstacle> {
        self.obstacles
            .values()
            .find(|o| o.position == cell && !o.destroyed)
    }

    /// Returns true if a standing obstacle blocks movement through the cell.
    #[must_use]
    pub fn blocks(&self, cell: Cell) -> bool {
        self.obstacles
            .values()
            .any(|o| o.position == cell && o.is_blocking())
    }

    /// Iterates over all obstacles (standing and destroyed) in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.values()
    }

    /// Number of obstacles in the layout.
    #[must_use]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    /// Returns true if the layout has no obstacles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Applies `damage` to an obstacle, destroying it at 0 HP.
    ///
    /// # Errors
    ///
    /// Returns [`ObstacleError::NotFound`] for an unknown id and
    /// [`ObstacleError::AlreadyDestroyed`] if it is already rubble.
    pub fn strike(&mut self, id: ObstacleId, damage: u32) -> Result<StrikeOutcome, ObstacleError> {
        let obstacle = self
            .obstacles
            .get_mut(&id)
            .ok_or(ObstacleError::NotFound(id))?;
        if obstacle.destroyed {
            return Err(ObstacleError::AlreadyDestroyed(id));
        }
        let hp_before = obstacle.hp;
        obstacle.hp = obstacle.hp.saturating_sub(damage);
        if obstacle.hp == 0 {
            obstacle.destroyed = true;
            debug!(obstacle = %id, "obstacle destroyed");
        }
        Ok(StrikeOutcome {
            obstacle: id,
            hp_before,
            hp_after: obstacle.hp,
            destroyed: obstacle.destroyed,
        })
    }
}
