//! Per-unit condition ledger.
//!
//! Every action is bracketed by the same two calls:
//!
//! 1. [`ConditionLedger::scan`] before the action's math: is the action
//!    hard-blocked, and which modifiers apply?
//! 2. [`ConditionLedger::apply_expiry`] after the action commits: strip the
//!    conditions whose policy says they are spent.
//!
//! A rejected action never reaches step 2, so rejections leave the ledger
//! untouched.
//!
//! ```
//! use skirmish_core::condition::{ActionKind, Condition, ConditionLedger};
//!
//! let mut ledger = ConditionLedger::default();
//! ledger.inflict(Condition::Empowered, true);
//!
//! let scan = ledger.scan(ActionKind::Attack);
//! assert_eq!(scan.modifiers.bonus_damage, 2);
//!
//! let removed = ledger.apply_expiry(&scan);
//! assert_eq!(removed, vec![Condition::Empowered]);
//! assert!(ledger.is_empty());
//! ```

use serde::{Deserialize, Serialize};

use super::{ActionKind, Condition, Expiry, Modifiers};

/// A condition attached to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCondition {
    /// Which condition.
    pub condition: Condition,
    /// Survives the next turn-end sweep. Set for `next_turn` conditions
    /// applied during the bearer's own turn, so they outlast that turn.
    pub fresh: bool,
}

/// Result of a pre-action scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scan {
    /// The action kind that was scanned.
    pub kind: ActionKind,
    /// First condition (in ledger order) that forbids the action.
    pub blocked_by: Option<Condition>,
    /// Sum of the modifiers of every condition affecting this kind.
    pub modifiers: Modifiers,
    /// Upkeep damage due (only non-zero for turn-end scans).
    pub upkeep_damage: u32,
    /// Conditions that contributed to this action, in ledger order.
    pub triggered: Vec<Condition>,
}

impl Scan {
    /// Returns true if a condition forbids the action.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.blocked_by.is_some()
    }
}

/// Ordered set of conditions on one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionLedger {
    active: Vec<ActiveCondition>,
}

impl ConditionLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a condition. A condition already present is not duplicated;
    /// its `fresh` mark is widened instead.
    ///
    /// `on_own_turn` is true when the bearer is the unit currently acting.
    pub fn inflict(&mut self, condition: Condition, on_own_turn: bool) {
        let fresh = on_own_turn && condition.definition().expiry == Expiry::NextTurn;
        if let Some(existing) = self.active.iter_mut().find(|a| a.condition == condition) {
            existing.fresh |= fresh;
            return;
        }
        self.active.push(ActiveCondition { condition, fresh });
    }

    /// Removes a condition directly (effect-driven removal). Returns true if it was present.
    pub fn remove(&mut self, condition: Condition) -> bool {
        let before = self.active.len();
        self.active.retain(|a| a.condition != condition);
        self.active.len() != before
    }

    /// Returns true if the condition is attached.
    #[must_use]
    pub fn contains(&self, condition: Condition) -> bool {
        self.active.iter().any(|a| a.condition == condition)
    }

    /// Attached conditions in ledger order.
    #[must_use]
    pub fn conditions(&self) -> Vec<Condition> {
        self.active.iter().map(|a| a.condition).collect()
    }

    /// Attached conditions with their freshness marks.
    #[must_use]
    pub fn entries(&self) -> &[ActiveCondition] {
        &self.active
    }

    /// Returns true if no condition is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Pre-action scan for `kind`.
    #[must_use]
    pub fn scan(&self, kind: ActionKind) -> Scan {
        let flag = kind.flag();
        let mut scan = Scan {
            kind,
            blocked_by: None,
            modifiers: Modifiers::NONE,
            upkeep_damage: 0,
            triggered: Vec::new(),
        };
        for entry in &self.active {
            let def = entry.condition.definition();
            if scan.blocked_by.is_none() && def.blocks.contains(flag) {
                scan.blocked_by = Some(entry.condition);
            }
            if def.affects.contains(flag) {
                scan.modifiers = scan.modifiers.combine(def.modifiers);
                if kind == ActionKind::TurnEnd {
                    scan.upkeep_damage += def.upkeep_damage;
                }
                scan.triggered.push(entry.condition);
            }
        }
        scan
    }

    /// Post-action expiry sweep. Returns the conditions removed, in ledger order.
    ///
    /// - `on_action` conditions that contributed to the scanned action are spent.
    /// - On a turn-end scan, `end_of_turn` conditions go, stale `next_turn`
    ///   conditions go, and fresh `next_turn` conditions become stale.
    pub fn apply_expiry(&mut self, scan: &Scan) -> Vec<Condition> {
        let turn_end = scan.kind == ActionKind::TurnEnd;
        let mut removed = Vec::new();
        self.active.retain_mut(|entry| {
            let expiry = entry.condition.definition().expiry;
            let spent = match expiry {
                Expiry::Permanent => false,
                Expiry::OnAction => scan.triggered.contains(&entry.condition),
                Expiry::EndOfTurn => turn_end,
                Expiry::NextTurn if turn_end => {
                    if entry.fresh {
                        entry.fresh = false;
                        false
                    } else {
                        true
                    }
                }
                Expiry::NextTurn => false,
            };
            if spent {
                removed.push(entry.condition);
            }
            !spent
        });
        removed
    }
}
