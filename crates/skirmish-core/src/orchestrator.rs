//! Turn and round orchestration.
//!
//! The [`Orchestrator`] is the only entry point that mutates a [`Battle`]
//! after setup. Player intents go through [`Orchestrator::handle`]; the
//! once-per-second countdown goes through [`Orchestrator::tick`]. Both end a
//! turn through the same [`Orchestrator::advance_turn`].
//!
//! # Turn shape
//!
//! ```text
//! Nominate ──▶ (Move | Attack | Strike | Maneuver)* ──▶ EndTurn or timer
//!                                                        │
//!                                                        ▼
//!                                                   advance_turn
//! ```
//!
//! A turn with no nomination can still end by timer (or an explicit pass);
//! that does not count as the owner having acted.
//!
//! # Rounds
//!
//! A round completes when every side that still has living units has
//! finished at least one turn with a nominated unit. The action order is
//! fixed at battle start; eliminated sides are skipped.

use rand::Rng;
use serde::{Deserialize, Serialize};
use skirmish_grid::Cell;
use tracing::{debug, info};

use crate::battle::{Battle, BattleOutcome, BattleStatus, EndReason};
use crate::combat::{resolve_attack, resolve_maneuver, strike, DamageType, ManeuverKind};
use crate::condition::ActionKind;
use crate::config::EngineConfig;
use crate::error::Rejection;
use crate::event::BattleEvent;
use crate::ids::{OwnerId, UnitId};
use crate::movement::{commit_move, destination_free, validate_move};
use crate::unit::{CombatUnit, UnitFlags};

/// What an attack is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackTarget {
    /// A living enemy unit.
    Unit(UnitId),
    /// A cell holding a corpse or obstacle.
    Cell(Cell),
}

/// A request from a player or AI acting for one side.
///
/// Everything but `Nominate` acts on the unit nominated this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    /// Pick the unit that acts this turn.
    Nominate {
        /// The unit.
        unit: UnitId,
    },
    /// Move the active unit's anchor.
    Move {
        /// Destination anchor.
        to: Cell,
    },
    /// Attack with the active unit.
    Attack {
        /// Target.
        target: AttackTarget,
        /// Damage type (ignored for strikes).
        damage_type: DamageType,
    },
    /// Perform a special maneuver with the active unit.
    Maneuver {
        /// Which maneuver.
        kind: ManeuverKind,
        /// Enemy target, for targeted maneuvers.
        target: Option<UnitId>,
    },
    /// End the active unit's turn, or pass if none was nominated.
    EndTurn,
}

/// Sequences turns and rounds for any number of battles.
///
/// Holds only configuration; all battle state lives in the [`Battle`] passed
/// to each call, so one orchestrator can serve every battle in a process.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    config: EngineConfig,
}

impl Orchestrator {
    /// Creates an orchestrator with the given rules.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The rules in use.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Arms the first turn of a freshly created battle.
    pub fn start(&self, battle: &mut Battle) -> Vec<BattleEvent> {
        battle.current_turn_index = 0;
        battle.turn_timer = self.config.turn_seconds;
        let Some(owner) = battle.current_owner() else {
            return Vec::new();
        };
        info!(battle = %battle.id, %owner, order = ?battle.action_order, "battle started");
        vec![BattleEvent::TurnAdvanced { owner, index: 0 }]
    }

    /// Validates and applies one intent from `owner`.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] if the battle is over, it is not `owner`'s
    /// turn, or the intent breaks a rule. A rejected intent leaves the
    /// battle untouched.
    pub fn handle<R: Rng + ?Sized>(
        &self,
        battle: &mut Battle,
        owner: OwnerId,
        intent: Intent,
        rng: &mut R,
    ) -> Result<Vec<BattleEvent>, Rejection> {
        if battle.status != BattleStatus::Active {
            return Err(Rejection::BattleNotActive);
        }
        if battle.current_owner() != Some(owner) {
            return Err(Rejection::NotYourTurn { owner });
        }
        debug!(battle = %battle.id, %owner, ?intent, "handling intent");

        match intent {
            Intent::Nominate { unit } => self.nominate(battle, owner, unit),
            Intent::Move { to } => {
                let unit = active(battle)?;
                let plan = validate_move(battle, unit, to)?;
                if !destination_free(battle, unit, to) {
                    return Err(Rejection::DestinationOccupied(to));
                }
                let outcome = commit_move(battle, &plan)?;
                Ok(vec![BattleEvent::UnitMoved {
                    unit,
                    from: outcome.from,
                    to: outcome.to,
                    moves_left: outcome.moves_left,
                }])
            }
            Intent::Attack {
                target: AttackTarget::Unit(defender),
                damage_type,
            } => {
                let attacker = active(battle)?;
                let report = resolve_attack(battle, attacker, defender, damage_type, rng)?;
                let lethal = report.lethal;
                let mut events = vec![BattleEvent::UnitAttacked(report)];
                if lethal {
                    events.extend(self.check_victory(battle));
                }
                Ok(events)
            }
            Intent::Attack {
                target: AttackTarget::Cell(cell),
                ..
            } => {
                let attacker = active(battle)?;
                let report = strike(battle, attacker, cell, &self.config)?;
                Ok(vec![BattleEvent::Struck(report)])
            }
            Intent::Maneuver { kind, target } => {
                let unit = active(battle)?;
                let report = resolve_maneuver(battle, unit, kind, target, rng)?;
                Ok(vec![BattleEvent::ManeuverPerformed(report)])
            }
            Intent::EndTurn => Ok(self.advance_turn(battle)),
        }
    }

    /// Begins `unit_id`'s turn: grants movement and actions, runs the
    /// turn-start scan, and applies overdrive when the unit is past its cap
    /// in competitive mode.
    fn nominate(
        &self,
        battle: &mut Battle,
        owner: OwnerId,
        unit_id: UnitId,
    ) -> Result<Vec<BattleEvent>, Rejection> {
        if let Some(current) = battle.active_unit {
            return Err(Rejection::UnitAlreadyActive(current));
        }
        let unit = battle
            .unit(unit_id)
            .ok_or(Rejection::UnitNotFound(unit_id))?;
        if unit.owner != owner {
            return Err(Rejection::NotOwner {
                unit: unit_id,
                owner,
            });
        }
        if !unit.is_alive() {
            return Err(Rejection::UnitDead(unit_id));
        }
        let overdrive = unit.is_exhausted();
        if overdrive && !self.config.competitive {
            return Err(Rejection::Exhausted {
                unit: unit_id,
                marks: unit.action_marks,
                cap: unit.mark_cap,
            });
        }

        battle.active_unit = Some(unit_id);
        let unit = battle
            .unit_mut(unit_id)
            .ok_or(Rejection::UnitNotFound(unit_id))?;
        unit.flags.insert(UnitFlags::STARTED_ACTION);
        let scan = unit.conditions.scan(ActionKind::TurnStart);
        unit.moves_left = unit.attributes.speed;
        unit.actions_left = self.config.base_actions + scan.modifiers.extra_attacks;
        unit.conditions.apply_expiry(&scan);

        let mut killed = false;
        if overdrive {
            unit.actions_left += self.config.overdrive_bonus_actions;
            unit.action_marks = 0;
            killed = unit.lose_hp(self.config.overdrive_self_damage);
            info!(unit = %unit_id, killed, "overdrive");
        }

        let mut events = vec![BattleEvent::UnitNominated {
            unit: unit_id,
            moves: unit.moves_left,
            actions: unit.actions_left,
            overdrive,
        }];
        debug!(battle = %battle.id, unit = %unit_id, overdrive, "unit nominated");
        if killed {
            events.push(BattleEvent::UnitFell { unit: unit_id });
            events.extend(self.advance_turn(battle));
        }
        Ok(events)
    }

    /// Ends the current turn. The single path for both an explicit end of
    /// turn and timer expiry.
    ///
    /// 1. Closes out the active unit, if any: turn-end upkeep and expiry,
    ///    one action mark, resources zeroed, its owner recorded as having
    ///    acted this round.
    /// 2. Checks victory; an ended battle stops here.
    /// 3. Moves to the next side that still has living units.
    /// 4. Starts a new round once every living side has acted or is fully
    ///    exhausted. Units that sat the round out shed one action mark.
    /// 5. Re-arms the countdown.
    pub fn advance_turn(&self, battle: &mut Battle) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        if battle.status != BattleStatus::Active {
            return events;
        }

        if let Some(unit_id) = battle.active_unit.take() {
            if let Some(unit) = battle.unit_mut(unit_id) {
                let owner = unit.owner;
                unit.flags.remove(UnitFlags::STARTED_ACTION);
                if unit.is_alive() {
                    let scan = unit.conditions.scan(ActionKind::TurnEnd);
                    let killed = unit.lose_hp(scan.upkeep_damage);
                    unit.conditions.apply_expiry(&scan);
                    unit.add_mark();
                    unit.flags.insert(UnitFlags::ACTED_THIS_ROUND);
                    unit.moves_left = 0;
                    unit.actions_left = 0;
                    events.push(BattleEvent::UnitTurnEnded {
                        unit: unit_id,
                        marks: unit.action_marks,
                        hp: unit.hp.current,
                        upkeep_damage: scan.upkeep_damage,
                        conditions: unit.conditions.conditions(),
                    });
                    if killed {
                        events.push(BattleEvent::UnitFell { unit: unit_id });
                    }
                }
                *battle.acted_this_round.entry(owner).or_insert(0) += 1;
            }
        }

        if let Some(ended) = self.check_victory(battle) {
            events.push(ended);
            return events;
        }

        let living = battle.living_owners();
        let sides = battle.action_order.len();
        for step in 1..=sides {
            let index = (battle.current_turn_index + step) % sides;
            if living.contains(&battle.action_order[index]) {
                battle.current_turn_index = index;
                break;
            }
        }
        let Some(owner) = battle.current_owner() else {
            return events;
        };
        events.push(BattleEvent::TurnAdvanced {
            owner,
            index: battle.current_turn_index,
        });

        let round_complete = battle
            .action_order
            .iter()
            .filter(|side| living.contains(side))
            .all(|&side| {
                battle.acted_this_round.get(&side).copied().unwrap_or(0) >= 1
                    || self.side_exhausted(battle, side)
            });
        if round_complete {
            battle.round += 1;
            battle.acted_this_round.clear();
            for unit in battle.units.values_mut().filter(|u| u.is_alive()) {
                unit.roll_over_round();
            }
            events.push(BattleEvent::RoundAdvanced {
                round: battle.round,
            });
            info!(battle = %battle.id, round = battle.round, "round advanced");
        }

        battle.turn_timer = self.config.turn_seconds;
        debug!(battle = %battle.id, %owner, index = battle.current_turn_index, "turn advanced");
        events
    }

    /// Returns true if `owner` cannot begin any action: outside competitive
    /// mode, every living unit of the side is at its mark cap. Such a side
    /// counts as having acted when deciding whether the round is over.
    #[must_use]
    pub fn side_exhausted(&self, battle: &Battle, owner: OwnerId) -> bool {
        !self.config.competitive
            && battle
                .living_units()
                .filter(|u| u.owner == owner)
                .all(CombatUnit::is_exhausted)
    }

    /// Ends the battle if it is decided. Returns the ending event.
    pub fn check_victory(&self, battle: &mut Battle) -> Option<BattleEvent> {
        let (outcome, reason) = battle.decide()?;
        Some(Self::end(battle, outcome, reason))
    }

    fn end(battle: &mut Battle, outcome: BattleOutcome, reason: EndReason) -> BattleEvent {
        battle.status = BattleStatus::Ended;
        battle.outcome = Some(outcome);
        battle.active_unit = None;
        battle.turn_timer = 0;
        info!(battle = %battle.id, ?outcome, ?reason, round = battle.round, "battle ended");
        BattleEvent::BattleEnded {
            outcome,
            reason,
            units: battle.units.values().map(|u| u.snapshot()).collect(),
        }
    }

    /// One second of countdown. Does nothing while paused or ended; at zero
    /// the turn advances exactly once and the countdown re-arms.
    pub fn tick(&self, battle: &mut Battle) -> Vec<BattleEvent> {
        if battle.status != BattleStatus::Active || battle.timer_paused {
            return Vec::new();
        }
        battle.turn_timer = battle.turn_timer.saturating_sub(1);
        let mut events = Vec::new();
        if let Some(owner) = battle.current_owner() {
            events.push(BattleEvent::CountdownTick {
                seconds: battle.turn_timer,
                owner,
            });
        }
        if battle.turn_timer == 0 {
            debug!(battle = %battle.id, "turn timer expired");
            events.extend(self.advance_turn(battle));
        }
        events
    }

    /// Sets the external pause flag. Returns true if it changed.
    pub fn set_paused(&self, battle: &mut Battle, paused: bool) -> bool {
        let changed = battle.timer_paused != paused;
        battle.timer_paused = paused;
        changed
    }
}

fn active(battle: &Battle) -> Result<UnitId, Rejection> {
    battle.active_unit.ok_or(Rejection::NoActiveUnit)
}
