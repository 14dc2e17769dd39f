//! Vision-filtered read model.
//!
//! A [`BattleView`] is what a decision maker acting for one unit may see:
//! its own side in full, enemies only inside the unit's vision radius.
//! The AI policy gets nothing else. Reachable cells are computed as if
//! unseen units were not on the board, so they reveal nothing either.

use serde::{Deserialize, Serialize};
use skirmish_grid::{in_vision, Cell, GridBounds, Obstacle};

use crate::battle::Battle;
use crate::ids::{BattleId, OwnerId, UnitId};
use crate::movement::legal_destinations;
use crate::unit::CombatUnit;

/// Read-only view of a battle from one unit's eyes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleView {
    /// Battle id.
    pub battle: BattleId,
    /// Round number.
    pub round: u32,
    /// Viewer's side.
    pub owner: OwnerId,
    /// The unit the view was built for.
    pub viewer: UnitId,
    /// Grid size.
    pub bounds: GridBounds,
    /// Visible living units, viewer included, in id order.
    pub units: Vec<CombatUnit>,
    /// Standing obstacles.
    pub obstacles: Vec<Obstacle>,
    /// Anchors the viewer can move to now, with their cost.
    pub reachable: Vec<(Cell, u32)>,
}

impl BattleView {
    /// Builds the view for `viewer`. Returns `None` if the unit is missing or dead.
    #[must_use]
    pub fn for_unit(battle: &Battle, viewer: UnitId) -> Option<Self> {
        let me = battle.unit(viewer).filter(|u| u.is_alive())?;
        let eyes = me.footprint();
        let mut seen = battle.clone();
        seen.units
            .retain(|_, u| u.owner == me.owner || in_vision(&eyes, me.vision, &u.footprint()));
        let units = seen.living_units().cloned().collect();
        Some(Self {
            battle: battle.id,
            round: battle.round,
            owner: me.owner,
            viewer,
            bounds: battle.bounds,
            units,
            obstacles: battle
                .obstacles
                .iter()
                .filter(|o| o.is_blocking())
                .cloned()
                .collect(),
            reachable: legal_destinations(&seen, viewer),
        })
    }

    /// The viewing unit.
    #[must_use]
    pub fn me(&self) -> Option<&CombatUnit> {
        self.units.iter().find(|u| u.id == self.viewer)
    }

    /// Visible enemies.
    pub fn enemies(&self) -> impl Iterator<Item = &CombatUnit> {
        self.units.iter().filter(move |u| u.owner != self.owner)
    }

    /// Living units of the viewer's side, viewer included.
    pub fn allies(&self) -> impl Iterator<Item = &CombatUnit> {
        self.units.iter().filter(move |u| u.owner == self.owner)
    }
}
