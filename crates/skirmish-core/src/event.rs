//! Outbound domain events.
//!
//! Every accepted intent and every timer tick produces an ordered list of
//! [`BattleEvent`]s. The host fans them out to subscribers; the engine never
//! looks at them again.

use serde::{Deserialize, Serialize};
use skirmish_grid::Cell;

use crate::battle::{BattleOutcome, EndReason};
use crate::combat::{AttackReport, ManeuverReport, StrikeReport};
use crate::condition::Condition;
use crate::ids::{OwnerId, UnitId};
use crate::unit::UnitSnapshot;

/// Something observable that happened in a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BattleEvent {
    /// The countdown moved.
    CountdownTick {
        /// Seconds left.
        seconds: u32,
        /// Owner holding the turn.
        owner: OwnerId,
    },
    /// A unit began its turn.
    UnitNominated {
        /// The unit.
        unit: UnitId,
        /// Movement points granted.
        moves: u32,
        /// Actions granted.
        actions: u32,
        /// The unit was nominated past its mark cap.
        overdrive: bool,
    },
    /// A unit moved.
    UnitMoved {
        /// The unit.
        unit: UnitId,
        /// Previous anchor.
        from: Cell,
        /// New anchor.
        to: Cell,
        /// Movement points left.
        moves_left: u32,
    },
    /// An attack was resolved.
    UnitAttacked(AttackReport),
    /// A special maneuver was resolved.
    ManeuverPerformed(ManeuverReport),
    /// A corpse or obstacle was struck.
    Struck(StrikeReport),
    /// A unit's turn ended.
    UnitTurnEnded {
        /// The unit.
        unit: UnitId,
        /// Action marks after the increment.
        marks: u32,
        /// HP after upkeep damage.
        hp: u32,
        /// Upkeep damage taken.
        upkeep_damage: u32,
        /// Conditions still attached.
        conditions: Vec<Condition>,
    },
    /// A unit died outside an attack (upkeep or overdrive).
    UnitFell {
        /// The unit.
        unit: UnitId,
    },
    /// The turn passed to another owner.
    TurnAdvanced {
        /// New owner.
        owner: OwnerId,
        /// New index into the action order.
        index: usize,
    },
    /// Every side has acted; a new round began.
    RoundAdvanced {
        /// New round number.
        round: u32,
    },
    /// The battle was decided.
    BattleEnded {
        /// Winner or draw.
        outcome: BattleOutcome,
        /// Why.
        reason: EndReason,
        /// Final state of every unit.
        units: Vec<UnitSnapshot>,
    },
    /// Full unit state, sent when subscribers come back after a pause.
    StateResync {
        /// Round number.
        round: u32,
        /// Owner holding the turn.
        owner: Option<OwnerId>,
        /// Seconds left.
        seconds: u32,
        /// Every unit.
        units: Vec<UnitSnapshot>,
    },
}

impl BattleEvent {
    /// Short event name, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CountdownTick { .. } => "countdown_tick",
            Self::UnitNominated { .. } => "unit_nominated",
            Self::UnitMoved { .. } => "unit_moved",
            Self::UnitAttacked(_) => "unit_attacked",
            Self::ManeuverPerformed(_) => "maneuver_performed",
            Self::Struck(_) => "struck",
            Self::UnitTurnEnded { .. } => "unit_turn_ended",
            Self::UnitFell { .. } => "unit_fell",
            Self::TurnAdvanced { .. } => "turn_advanced",
            Self::RoundAdvanced { .. } => "round_advanced",
            Self::BattleEnded { .. } => "battle_ended",
            Self::StateResync { .. } => "state_resync",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tag_matches_log_name() {
        let events = [
            BattleEvent::CountdownTick {
                seconds: 4,
                owner: OwnerId::new(2),
            },
            BattleEvent::UnitFell { unit: UnitId::new(9) },
            BattleEvent::RoundAdvanced { round: 3 },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.name());
            let back: BattleEvent = serde_json::from_value(json).unwrap();
            assert_eq!(back, event);
        }
    }

    #[test]
    fn tick_carries_flat_fields() {
        let json = serde_json::to_value(BattleEvent::CountdownTick {
            seconds: 0,
            owner: OwnerId::new(1),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "type": "countdown_tick", "seconds": 0, "owner": 1 }));
    }
}
