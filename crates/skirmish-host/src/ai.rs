//! AI turns.
//!
//! An AI side plays through the same intent API as a human. A [`Policy`]
//! sees only a [`BattleView`] (its own side plus enemies in vision) and
//! returns a [`Plan`]: a score and the intents to submit after nominating.
//! The [`AiDriver`] asks the policy about up to `max_units` candidates within
//! the wall-clock budget, plays the best plan, and always ends the turn.
//!
//! A policy that errors or panics costs only that candidate; a turn with no
//! usable plan is a pass.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use rayon::prelude::*;
use skirmish_core::{
    AttackTarget, BattleEvent, BattleId, BattleView, CombatUnit, DamageType, Intent, ManeuverKind,
    OwnerId, Rejection, UnitId,
};
use skirmish_grid::Cell;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::config::TurnBudget;
use crate::error::ServiceError;
use crate::service::BattleService;

/// Why a policy could not produce a plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// The view does not contain the unit it was built for.
    #[error("viewer {0} is not in its own view")]
    MissingViewer(UnitId),
    /// Policy-specific failure.
    #[error("policy failed: {0}")]
    Failed(String),
}

/// What a policy wants one unit to do this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Higher is better; the driver plays the best-scoring candidate.
    pub score: i64,
    /// Intents to submit after the nomination, in order.
    pub intents: Vec<Intent>,
}

/// Decides what one unit should do.
pub trait Policy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Plans a turn for `view.viewer`. The view's reachable cells assume the
    /// unit has just been nominated.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] if no plan can be made.
    fn plan(&self, view: &BattleView) -> Result<Plan, PolicyError>;
}

// ============================================================================
// Default policy
// ============================================================================

/// Walk toward the nearest visible enemy and hit it when adjacent.
///
/// Destinations are scored in parallel and then sorted, so the choice does
/// not depend on thread scheduling.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproachAndStrike;

const ATTACK_BONUS: i64 = 100;

/// Weakest enemy adjacent to a footprint at `anchor`: lowest HP, then lowest id.
fn weakest_adjacent<'a>(
    me: &CombatUnit,
    anchor: Cell,
    enemies: &[&'a CombatUnit],
) -> Option<&'a CombatUnit> {
    let here = me.footprint().at(anchor);
    enemies
        .iter()
        .copied()
        .filter(|e| here.is_adjacent(&e.footprint()))
        .min_by_key(|e| (e.hp.current, e.id))
}

/// Aims at the thinner protection pool.
fn damage_type_against(target: &CombatUnit) -> DamageType {
    if target.physical.current <= target.magical.current {
        DamageType::Physical
    } else {
        DamageType::Magical
    }
}

fn attack(target: &CombatUnit) -> Intent {
    Intent::Attack {
        target: AttackTarget::Unit(target.id),
        damage_type: damage_type_against(target),
    }
}

impl Policy for ApproachAndStrike {
    fn name(&self) -> &str {
        "approach-and-strike"
    }

    fn plan(&self, view: &BattleView) -> Result<Plan, PolicyError> {
        let me = view.me().ok_or(PolicyError::MissingViewer(view.viewer))?;
        let enemies: Vec<&CombatUnit> = view.enemies().collect();
        let brace = Plan {
            score: 0,
            intents: vec![Intent::Maneuver {
                kind: ManeuverKind::Brace,
                target: None,
            }],
        };
        if enemies.is_empty() {
            return Ok(brace);
        }

        if let Some(target) = weakest_adjacent(me, me.position, &enemies) {
            return Ok(Plan {
                score: ATTACK_BONUS * 2,
                intents: vec![attack(target)],
            });
        }

        let mut scored: Vec<(i64, Cell)> = view
            .reachable
            .par_iter()
            .map(|&(cell, cost)| {
                let there = me.footprint().at(cell);
                let nearest = enemies
                    .iter()
                    .map(|e| there.distance(&e.footprint()))
                    .min()
                    .unwrap_or(u32::MAX);
                (-(i64::from(nearest) * 10) - i64::from(cost), cell)
            })
            .collect();
        scored.sort_by(|(sa, ca), (sb, cb)| sb.cmp(sa).then(ca.y.cmp(&cb.y)).then(ca.x.cmp(&cb.x)));

        let Some(&(score, cell)) = scored.first() else {
            return Ok(Plan {
                score: -ATTACK_BONUS,
                ..brace
            });
        };
        let mut intents = vec![Intent::Move { to: cell }];
        let mut score = score;
        if let Some(target) = weakest_adjacent(me, cell, &enemies) {
            intents.push(attack(target));
            score += ATTACK_BONUS;
        }
        Ok(Plan { score, intents })
    }
}

// ============================================================================
// Driver
// ============================================================================

/// What an AI turn did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiTurn {
    /// Unit that acted, if any.
    pub unit: Option<UnitId>,
    /// Planned intents the engine accepted.
    pub accepted: usize,
    /// The rejection that cut the plan short, if any.
    pub rejected: Option<Rejection>,
    /// Candidates skipped because the policy failed or panicked.
    pub faults: usize,
    /// Every event the turn produced, in order.
    pub events: Vec<BattleEvent>,
}

/// Runs AI turns against a [`BattleService`].
#[derive(Clone)]
pub struct AiDriver {
    policy: Arc<dyn Policy>,
    budget: TurnBudget,
}

impl std::fmt::Debug for AiDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiDriver")
            .field("policy", &self.policy.name())
            .field("budget", &self.budget)
            .finish()
    }
}

impl AiDriver {
    /// Creates a driver.
    #[must_use]
    pub fn new(policy: Arc<dyn Policy>, budget: TurnBudget) -> Self {
        Self { policy, budget }
    }

    /// A driver running [`ApproachAndStrike`].
    #[must_use]
    pub fn with_default_policy(budget: TurnBudget) -> Self {
        Self::new(Arc::new(ApproachAndStrike), budget)
    }

    /// Plays `owner`'s current turn in `battle`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownBattle`] if the battle is not loaded,
    /// or the rejection of the final end-of-turn if it is not `owner`'s turn.
    pub async fn play_turn(
        &self,
        service: &BattleService,
        battle: BattleId,
        owner: OwnerId,
    ) -> Result<AiTurn, ServiceError> {
        let started = Instant::now();
        let views = service.candidate_views(battle, owner, self.budget.max_units)?;

        let mut turn = AiTurn::default();
        let mut best: Option<(i64, UnitId, Plan)> = None;
        for view in &views {
            if started.elapsed() > self.budget.max_wall() {
                debug!(battle = %battle, %owner, "AI planning budget exhausted");
                break;
            }
            let plan = match catch_unwind(AssertUnwindSafe(|| self.policy.plan(view))) {
                Ok(Ok(plan)) => plan,
                Ok(Err(error)) => {
                    warn!(battle = %battle, unit = %view.viewer, %error, "policy failed; skipping unit");
                    turn.faults += 1;
                    continue;
                }
                Err(_) => {
                    error!(battle = %battle, unit = %view.viewer, policy = self.policy.name(), "policy panicked; skipping unit");
                    turn.faults += 1;
                    continue;
                }
            };
            if best.as_ref().map_or(true, |(score, _, _)| plan.score > *score) {
                best = Some((plan.score, view.viewer, plan));
            }
        }

        if let Some((_, unit, plan)) = best {
            match service.submit(battle, owner, Intent::Nominate { unit }) {
                Ok(events) => {
                    turn.unit = Some(unit);
                    turn.events.extend(events);
                    for intent in plan.intents {
                        match service.submit(battle, owner, intent) {
                            Ok(events) => {
                                turn.accepted += 1;
                                turn.events.extend(events);
                            }
                            Err(ServiceError::Rejected(rejection)) => {
                                debug!(battle = %battle, %unit, %rejection, "AI intent rejected");
                                turn.rejected = Some(rejection);
                                break;
                            }
                            Err(other) => return Err(other),
                        }
                    }
                }
                Err(ServiceError::Rejected(rejection)) => turn.rejected = Some(rejection),
                Err(other) => return Err(other),
            }
        }

        // A lethal hit or overdrive death may already have ended the turn.
        if service.is_turn_of(battle, owner)? {
            turn.events.extend(service.submit(battle, owner, Intent::EndTurn)?);
        }
        Ok(turn)
    }
}
