//! Status conditions and their fixed effect table.
//!
//! A [`Condition`] is a closed enum; each variant carries its rules as data
//! through [`Condition::definition`]:
//!
//! - an [`Expiry`] policy,
//! - the [`ActionKinds`] it *affects* (contributes modifiers to),
//! - the [`ActionKinds`] it hard-*blocks*,
//! - a [`Modifiers`] bundle,
//! - optional end-of-turn upkeep damage.
//!
//! Conditions are never edited in place: effects add or remove whole
//! conditions, and the [`ConditionLedger`] strips them by policy.

mod ledger;

pub use ledger::{ActiveCondition, ConditionLedger, Scan};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Set of action kinds, used for the affect and block masks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ActionKinds: u8 {
        /// The bearer's turn begins.
        const TURN_START = 1 << 0;
        /// The bearer moves.
        const MOVE = 1 << 1;
        /// The bearer attacks a unit, corpse or obstacle.
        const ATTACK = 1 << 2;
        /// The bearer is attacked or targeted by a maneuver.
        const DEFEND = 1 << 3;
        /// The bearer performs a special maneuver.
        const SPECIAL = 1 << 4;
        /// The bearer's turn ends.
        const TURN_END = 1 << 5;
    }
}

/// The kind of action being bracketed by a ledger scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Turn begin (resource grant).
    TurnStart,
    /// Movement.
    Move,
    /// Attack or strike.
    Attack,
    /// Being attacked.
    Defend,
    /// Special maneuver.
    Special,
    /// Turn end (upkeep and expiry).
    TurnEnd,
}

impl ActionKind {
    /// The single-kind mask for this action.
    #[must_use]
    pub const fn flag(self) -> ActionKinds {
        match self {
            ActionKind::TurnStart => ActionKinds::TURN_START,
            ActionKind::Move => ActionKinds::MOVE,
            ActionKind::Attack => ActionKinds::ATTACK,
            ActionKind::Defend => ActionKinds::DEFEND,
            ActionKind::Special => ActionKinds::SPECIAL,
            ActionKind::TurnEnd => ActionKinds::TURN_END,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::TurnStart => "turn start",
            ActionKind::Move => "move",
            ActionKind::Attack => "attack",
            ActionKind::Defend => "defend",
            ActionKind::Special => "special maneuver",
            ActionKind::TurnEnd => "turn end",
        };
        f.write_str(name)
    }
}

/// When a condition is removed by policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiry {
    /// Never removed by policy.
    Permanent,
    /// Removed at the end of the bearer's current turn.
    EndOfTurn,
    /// Removed at the end of the bearer's next turn.
    NextTurn,
    /// Removed after the first action it affects.
    OnAction,
}

/// Numeric adjustments a condition folds into action math.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    /// Subtracted from incoming hit damage.
    pub damage_reduction: u32,
    /// Added to dodge chance, in percent points.
    pub dodge_delta: i32,
    /// Positive values make movement cheaper, negative values dearer.
    pub movement_delta: i32,
    /// Added to outgoing hit damage.
    pub bonus_damage: u32,
    /// Extra actions granted when the turn begins.
    pub extra_attacks: u32,
}

impl Modifiers {
    /// No adjustment.
    pub const NONE: Modifiers = Modifiers {
        damage_reduction: 0,
        dodge_delta: 0,
        movement_delta: 0,
        bonus_damage: 0,
        extra_attacks: 0,
    };

    /// Sums two bundles.
    #[must_use]
    pub fn combine(self, other: Modifiers) -> Modifiers {
        Modifiers {
            damage_reduction: self.damage_reduction + other.damage_reduction,
            dodge_delta: self.dodge_delta + other.dodge_delta,
            movement_delta: self.movement_delta + other.movement_delta,
            bonus_damage: self.bonus_damage + other.bonus_damage,
            extra_attacks: self.extra_attacks + other.extra_attacks,
        }
    }
}

/// The fixed rules of one condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionDef {
    /// Removal policy.
    pub expiry: Expiry,
    /// Action kinds this condition contributes modifiers to.
    pub affects: ActionKinds,
    /// Action kinds this condition forbids outright.
    pub blocks: ActionKinds,
    /// Numeric adjustments.
    pub modifiers: Modifiers,
    /// True damage applied to the bearer at the end of each of its turns.
    pub upkeep_damage: u32,
}

/// Every status effect the engine knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Braced stance: reduces incoming damage until the end of the next turn.
    Guarded,
    /// Ready to sidestep: large dodge bonus, spent on the next attack received.
    Evasive,
    /// Heavy armour or cover: permanent flat damage reduction.
    Fortified,
    /// Cheaper movement for the rest of this turn.
    Hasted,
    /// Dearer movement until the end of the next turn.
    Slowed,
    /// Bonus damage on the next attack.
    Empowered,
    /// One extra action when the next turn begins.
    Frenzied,
    /// On the ground: cannot move or maneuver, easier to hit.
    KnockedDown,
    /// Cannot move, attack or maneuver, cannot dodge.
    Stunned,
    /// Cannot move.
    Rooted,
    /// Takes fire damage once, at the end of the bearer's turn.
    Burning,
    /// Takes poison damage at the end of every turn.
    Poisoned,
}

impl Condition {
    /// All conditions, in declaration order.
    pub const ALL: [Condition; 12] = [
        Condition::Guarded,
        Condition::Evasive,
        Condition::Fortified,
        Condition::Hasted,
        Condition::Slowed,
        Condition::Empowered,
        Condition::Frenzied,
        Condition::KnockedDown,
        Condition::Stunned,
        Condition::Rooted,
        Condition::Burning,
        Condition::Poisoned,
    ];

    /// Returns this condition's fixed rules.
    #[must_use]
    pub const fn definition(self) -> ConditionDef {
        const fn def(
            expiry: Expiry,
            affects: ActionKinds,
            blocks: ActionKinds,
            modifiers: Modifiers,
            upkeep_damage: u32,
        ) -> ConditionDef {
            ConditionDef {
                expiry,
                affects,
                blocks,
                modifiers,
                upkeep_damage,
            }
        }
        let none = ActionKinds::empty();
        match self {
            Condition::Guarded => def(
                Expiry::NextTurn,
                ActionKinds::DEFEND,
                none,
                Modifiers { damage_reduction: 3, ..Modifiers::NONE },
                0,
            ),
            Condition::Evasive => def(
                Expiry::OnAction,
                ActionKinds::DEFEND,
                none,
                Modifiers { dodge_delta: 25, ..Modifiers::NONE },
                0,
            ),
            Condition::Fortified => def(
                Expiry::Permanent,
                ActionKinds::DEFEND,
                none,
                Modifiers { damage_reduction: 1, ..Modifiers::NONE },
                0,
            ),
            Condition::Hasted => def(
                Expiry::EndOfTurn,
                ActionKinds::MOVE,
                none,
                Modifiers { movement_delta: 2, ..Modifiers::NONE },
                0,
            ),
            Condition::Slowed => def(
                Expiry::NextTurn,
                ActionKinds::MOVE,
                none,
                Modifiers { movement_delta: -2, ..Modifiers::NONE },
                0,
            ),
            Condition::Empowered => def(
                Expiry::OnAction,
                ActionKinds::ATTACK,
                none,
                Modifiers { bonus_damage: 2, ..Modifiers::NONE },
                0,
            ),
            Condition::Frenzied => def(
                Expiry::OnAction,
                ActionKinds::TURN_START,
                none,
                Modifiers { extra_attacks: 1, ..Modifiers::NONE },
                0,
            ),
            Condition::KnockedDown => def(
                Expiry::NextTurn,
                ActionKinds::DEFEND,
                ActionKinds::MOVE.union(ActionKinds::SPECIAL),
                Modifiers { dodge_delta: -20, ..Modifiers::NONE },
                0,
            ),
            Condition::Stunned => def(
                Expiry::NextTurn,
                ActionKinds::DEFEND,
                ActionKinds::MOVE
                    .union(ActionKinds::ATTACK)
                    .union(ActionKinds::SPECIAL),
                Modifiers { dodge_delta: -100, ..Modifiers::NONE },
                0,
            ),
            Condition::Rooted => def(Expiry::NextTurn, none, ActionKinds::MOVE, Modifiers::NONE, 0),
            Condition::Burning => {
                def(Expiry::EndOfTurn, ActionKinds::TURN_END, none, Modifiers::NONE, 3)
            }
            Condition::Poisoned => {
                def(Expiry::Permanent, ActionKinds::TURN_END, none, Modifiers::NONE, 1)
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Condition::Guarded => "guarded",
            Condition::Evasive => "evasive",
            Condition::Fortified => "fortified",
            Condition::Hasted => "hasted",
            Condition::Slowed => "slowed",
            Condition::Empowered => "empowered",
            Condition::Frenzied => "frenzied",
            Condition::KnockedDown => "knocked down",
            Condition::Stunned => "stunned",
            Condition::Rooted => "rooted",
            Condition::Burning => "burning",
            Condition::Poisoned => "poisoned",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blockers_never_block_turn_end() {
        for condition in Condition::ALL {
            let def = condition.definition();
            assert!(
                !def.blocks.contains(ActionKinds::TURN_END),
                "{condition} would trap its bearer in the turn"
            );
            assert!(!def.blocks.contains(ActionKinds::TURN_START));
        }
    }

    #[test]
    fn upkeep_conditions_affect_turn_end() {
        for condition in Condition::ALL {
            let def = condition.definition();
            if def.upkeep_damage > 0 {
                assert!(def.affects.contains(ActionKinds::TURN_END));
            }
        }
    }

    #[test]
    fn combine_sums_every_field() {
        let a = Condition::Guarded.definition().modifiers;
        let b = Condition::KnockedDown.definition().modifiers;
        let sum = a.combine(b);
        assert_eq!(sum.damage_reduction, 3);
        assert_eq!(sum.dodge_delta, -20);
    }

    #[test]
    fn action_kind_flags_are_distinct() {
        let kinds = [
            ActionKind::TurnStart,
            ActionKind::Move,
            ActionKind::Attack,
            ActionKind::Defend,
            ActionKind::Special,
            ActionKind::TurnEnd,
        ];
        let all = kinds
            .iter()
            .fold(ActionKinds::empty(), |acc, k| acc | k.flag());
        assert_eq!(all, ActionKinds::all());
    }
}
