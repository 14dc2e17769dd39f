//! Combat units.
//!
//! A [`CombatUnit`] is created from a [`UnitTemplate`] at battle start and
//! lives for the whole battle. The only lifecycle change is death, which is
//! one-way: once [`UnitFlags::DEAD`] is set the unit never acts again and its
//! body stays on the map as a corpse until cleared.
//!
//! # Invariants
//!
//! - `0 <= hp.current <= hp.max`
//! - `is_alive() == (hp.current > 0)`; the transition to dead is one-way
//! - protection pools never go negative and break independently
//! - `action_marks <= mark_cap`

mod template;

pub use template::UnitTemplate;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use skirmish_grid::{Cell, Footprint};
use std::fmt;

use crate::condition::{Condition, ConditionLedger};
use crate::ids::{OwnerId, UnitId};

bitflags! {
    /// Boolean unit state.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct UnitFlags: u8 {
        /// Health reached zero. Terminal.
        const DEAD = 1 << 0;
        /// Nominated this turn; the turn end will charge an action mark.
        const STARTED_ACTION = 1 << 1;
        /// Physical protection was consumed and will not come back.
        const PHYSICAL_BROKEN = 1 << 2;
        /// Magical protection was consumed and will not come back.
        const MAGICAL_BROKEN = 1 << 3;
        /// The corpse was cleared and no longer blocks its cells.
        const CORPSE_CLEARED = 1 << 4;
        /// Closed a turn this round; it does not rest at the rollover.
        const ACTED_THIS_ROUND = 1 << 5;
    }
}

/// Unit category; sets the action-mark cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitCategory {
    /// Expendable troops.
    Minion,
    /// Line troops.
    Soldier,
    /// Heroes and monsters.
    Champion,
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minion => write!(f, "minion"),
            Self::Soldier => write!(f, "soldier"),
            Self::Champion => write!(f, "champion"),
        }
    }
}

/// Base attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attributes {
    /// Hit damage.
    pub combat: u32,
    /// Movement per turn and dodge.
    pub speed: u32,
    /// Vision.
    pub focus: u32,
    /// Physical protection; makes the unit hard to disengage from.
    pub resistance: u32,
    /// Magical protection.
    pub will: u32,
    /// Health.
    pub vitality: u32,
}

/// A bounded, non-negative resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pool {
    /// Current value, `0..=max`.
    pub current: u32,
    /// Maximum value.
    pub max: u32,
}

impl Pool {
    /// A full pool.
    #[must_use]
    pub const fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Removes up to `amount`, returning how much was actually removed.
    pub fn drain(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.current);
        self.current -= taken;
        taken
    }
}

/// A unit on the battle grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatUnit {
    /// Identifier within the battle.
    pub id: UnitId,
    /// Side the unit fights for.
    pub owner: OwnerId,
    /// Display name, from the template.
    pub name: String,
    /// Category, from the template.
    pub category: UnitCategory,
    /// Anchor (top-left) cell.
    pub position: Cell,
    /// Footprint edge length.
    pub size: u32,
    /// Base attributes.
    pub attributes: Attributes,
    /// Health.
    pub hp: Pool,
    /// Physical protection pool.
    pub physical: Pool,
    /// Magical protection pool.
    pub magical: Pool,
    /// Vision radius.
    pub vision: u32,
    /// Movement left this turn.
    pub moves_left: u32,
    /// Actions left this turn.
    pub actions_left: u32,
    /// Exhaustion counter.
    pub action_marks: u32,
    /// Category cap for `action_marks`.
    pub mark_cap: u32,
    /// Boolean state.
    pub flags: UnitFlags,
    /// Active conditions.
    pub conditions: ConditionLedger,
}

impl CombatUnit {
    /// Cells the unit covers.
    #[must_use]
    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.position, self.size)
    }

    /// Returns true while health is above zero.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.flags.contains(UnitFlags::DEAD)
    }

    /// Returns true once the unit has been nominated this turn.
    #[must_use]
    pub fn has_started_action(&self) -> bool {
        self.flags.contains(UnitFlags::STARTED_ACTION)
    }

    /// Returns true for a dead unit whose body still blocks the map.
    #[must_use]
    pub fn is_corpse(&self) -> bool {
        !self.is_alive() && !self.flags.contains(UnitFlags::CORPSE_CLEARED)
    }

    /// Returns true if the unit's cells are blocked for others (living or uncleared corpse).
    #[must_use]
    pub fn blocks_cells(&self) -> bool {
        self.is_alive() || self.is_corpse()
    }

    /// Returns true if the unit has reached its action-mark cap.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.action_marks >= self.mark_cap
    }

    /// Adds one action mark, saturating at the cap.
    pub fn add_mark(&mut self) {
        self.action_marks = (self.action_marks + 1).min(self.mark_cap);
    }

    /// Round rollover: a unit that sat the round out sheds one mark.
    pub fn roll_over_round(&mut self) {
        if !self.flags.contains(UnitFlags::ACTED_THIS_ROUND) {
            self.action_marks = self.action_marks.saturating_sub(1);
        }
        self.flags.remove(UnitFlags::ACTED_THIS_ROUND);
    }

    /// Removes health directly, bypassing protection. Returns true if this
    /// killed the unit. Dead units take no further damage.
    pub fn lose_hp(&mut self, amount: u32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.hp.drain(amount);
        if self.hp.current == 0 {
            self.flags.insert(UnitFlags::DEAD);
            self.moves_left = 0;
            self.actions_left = 0;
            return true;
        }
        false
    }

    /// Snapshot for outbound events.
    #[must_use]
    pub fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            owner: self.owner,
            position: self.position,
            hp: self.hp.current,
            physical: self.physical.current,
            magical: self.magical.current,
            action_marks: self.action_marks,
            alive: self.is_alive(),
            conditions: self.conditions.conditions(),
        }
    }
}

/// Compact, serialisable view of a unit used in events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Unit id.
    pub id: UnitId,
    /// Owner.
    pub owner: OwnerId,
    /// Anchor cell.
    pub position: Cell,
    /// Current health.
    pub hp: u32,
    /// Current physical protection.
    pub physical: u32,
    /// Current magical protection.
    pub magical: u32,
    /// Exhaustion counter.
    pub action_marks: u32,
    /// Alive flag.
    pub alive: bool,
    /// Active conditions.
    pub conditions: Vec<Condition>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn soldier() -> CombatUnit {
        UnitTemplate::new("pike", UnitCategory::Soldier, Attributes {
            combat: 4,
            speed: 3,
            focus: 2,
            resistance: 2,
            will: 1,
            vitality: 1,
        })
        .spawn(UnitId::new(1), OwnerId::new(1), Cell::new(0, 0), &EngineConfig::default())
    }

    #[test]
    fn lose_hp_clamps_and_kills_once() {
        let mut unit = soldier();
        assert_eq!(unit.hp.current, 15);
        assert!(!unit.lose_hp(14));
        assert!(unit.is_alive());
        assert!(unit.lose_hp(100));
        assert_eq!(unit.hp.current, 0);
        assert!(!unit.is_alive());
        assert!(!unit.lose_hp(1), "death is reported once");
    }

    #[test]
    fn corpse_blocks_until_cleared() {
        let mut unit = soldier();
        unit.lose_hp(u32::MAX);
        assert!(unit.is_corpse());
        assert!(unit.blocks_cells());
        unit.flags.insert(UnitFlags::CORPSE_CLEARED);
        assert!(!unit.blocks_cells());
    }

    #[test]
    fn marks_saturate_at_cap() {
        let mut unit = soldier();
        for _ in 0..10 {
            unit.add_mark();
        }
        assert_eq!(unit.action_marks, unit.mark_cap);
        assert!(unit.is_exhausted());
    }

    #[test]
    fn pool_drain_reports_taken() {
        let mut pool = Pool::full(4);
        assert_eq!(pool.drain(3), 3);
        assert_eq!(pool.drain(3), 1);
        assert_eq!(pool.current, 0);
    }
}
