//! Movement and engagement validation.
//!
//! A move is validated in a fixed order: bounds, no-op, condition scan,
//! cost, route. Validation never mutates; [`commit_move`] applies a plan that
//! [`validate_move`] produced.
//!
//! # Cost
//!
//! ```text
//! distance   = manhattan(from, to), adjusted by the scan's movement delta (min 1)
//! engagement = Σ max(0, enemy.resistance − unit.speed)
//!              over living enemies adjacent now and not adjacent after the move
//! total      = distance + engagement
//! ```
//!
//! Staying next to an enemy costs nothing extra; only breaking contact does.

use serde::{Deserialize, Serialize};
use skirmish_grid::{first_clear_route, manhattan, Cell, RouteShape};
use tracing::debug;

use crate::battle::Battle;
use crate::condition::{ActionKind, Condition, Scan};
use crate::error::Rejection;
use crate::ids::UnitId;
use crate::unit::CombatUnit;

/// A validated move, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlan {
    /// Unit being moved.
    pub unit: UnitId,
    /// Anchor before the move.
    pub from: Cell,
    /// Anchor after the move.
    pub to: Cell,
    /// Distance part of the cost.
    pub distance_cost: u32,
    /// Disengagement part of the cost.
    pub engagement_cost: u32,
    /// Route that is clear.
    pub route: RouteShape,
    /// Pre-action scan, handed to the expiry sweep on commit.
    pub scan: Scan,
}

impl MovePlan {
    /// Total movement points the move spends.
    #[must_use]
    pub fn total_cost(&self) -> u32 {
        self.distance_cost.saturating_add(self.engagement_cost)
    }
}

/// What a committed move changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Unit that moved.
    pub unit: UnitId,
    /// Previous anchor.
    pub from: Cell,
    /// New anchor.
    pub to: Cell,
    /// Points spent.
    pub cost: u32,
    /// Points left.
    pub moves_left: u32,
    /// Conditions the expiry sweep removed.
    pub expired: Vec<Condition>,
}

/// Extra cost of leaving `unit`'s current engagements by moving to `to`.
#[must_use]
pub fn engagement_cost(battle: &Battle, unit: &CombatUnit, to: Cell) -> u32 {
    let here = unit.footprint();
    let there = here.at(to);
    battle
        .living_units()
        .filter(|other| other.owner != unit.owner)
        .filter(|enemy| {
            let theirs = enemy.footprint();
            here.is_adjacent(&theirs) && !there.is_adjacent(&theirs)
        })
        .map(|enemy| {
            enemy
                .attributes
                .resistance
                .saturating_sub(unit.attributes.speed)
        })
        .fold(0, u32::saturating_add)
}

/// Distance part of the cost after the movement modifier.
fn distance_cost(distance: u32, movement_delta: i32) -> u32 {
    let adjusted = i64::from(distance) - i64::from(movement_delta);
    u32::try_from(adjusted.max(1)).unwrap_or(u32::MAX)
}

/// Checks whether `unit_id` may move its anchor to `to`.
///
/// Destination occupancy is not checked here: a living unit on the target
/// cell is an attack target, which is the caller's decision.
///
/// # Errors
///
/// Returns the first [`Rejection`] in validation order. Cost failures
/// report [`Rejection::BlockedByEngagement`] when the distance alone would
/// have been affordable, [`Rejection::InsufficientMovement`] otherwise.
pub fn validate_move(battle: &Battle, unit_id: UnitId, to: Cell) -> Result<MovePlan, Rejection> {
    let unit = battle
        .unit(unit_id)
        .ok_or(Rejection::UnitNotFound(unit_id))?;
    if !unit.is_alive() {
        return Err(Rejection::UnitDead(unit_id));
    }
    let destination = unit.footprint().at(to);
    if !battle.bounds.contains_footprint(&destination) {
        return Err(Rejection::OutOfBounds(to));
    }
    if to == unit.position {
        return Err(Rejection::SamePosition);
    }

    let scan = unit.conditions.scan(ActionKind::Move);
    if let Some(condition) = scan.blocked_by {
        return Err(Rejection::ConditionBlocked {
            condition,
            action: ActionKind::Move,
        });
    }

    let distance = distance_cost(manhattan(unit.position, to), scan.modifiers.movement_delta);
    let engagement = engagement_cost(battle, unit, to);
    let total = distance.saturating_add(engagement);
    if total > unit.moves_left {
        return Err(if engagement > 0 && distance <= unit.moves_left {
            Rejection::BlockedByEngagement {
                cost: total,
                engagement,
                available: unit.moves_left,
            }
        } else {
            Rejection::InsufficientMovement {
                cost: total,
                available: unit.moves_left,
            }
        });
    }

    let footprint = unit.footprint();
    let route = first_clear_route(unit.position, to, |anchor| {
        battle.footprint_blocked_for(&footprint.at(anchor), unit_id)
    })
    .ok_or(Rejection::PathBlocked(to))?;

    Ok(MovePlan {
        unit: unit_id,
        from: unit.position,
        to,
        distance_cost: distance,
        engagement_cost: engagement,
        route,
        scan,
    })
}

/// Returns true if the footprint at `to` is free of everything but the mover.
#[must_use]
pub fn destination_free(battle: &Battle, unit_id: UnitId, to: Cell) -> bool {
    battle
        .unit(unit_id)
        .is_some_and(|unit| !battle.footprint_blocked_for(&unit.footprint().at(to), unit_id))
}

/// Applies a validated plan: moves the unit, spends the points, runs the
/// expiry sweep.
///
/// # Errors
///
/// Returns [`Rejection::UnitNotFound`] if the unit vanished between
/// validation and commit.
pub fn commit_move(battle: &mut Battle, plan: &MovePlan) -> Result<MoveOutcome, Rejection> {
    let unit = battle
        .unit_mut(plan.unit)
        .ok_or(Rejection::UnitNotFound(plan.unit))?;
    let cost = plan.total_cost();
    unit.position = plan.to;
    unit.moves_left = unit.moves_left.saturating_sub(cost);
    let expired = unit.conditions.apply_expiry(&plan.scan);
    debug!(
        unit = %plan.unit,
        from = ?plan.from,
        to = ?plan.to,
        cost,
        moves_left = unit.moves_left,
        "unit moved"
    );
    Ok(MoveOutcome {
        unit: plan.unit,
        from: plan.from,
        to: plan.to,
        cost,
        moves_left: unit.moves_left,
        expired,
    })
}

/// Every anchor `unit_id` could legally move to right now, with its cost.
///
/// Cells are listed in grid order (row by row). Occupied destinations are
/// excluded.
#[must_use]
pub fn legal_destinations(battle: &Battle, unit_id: UnitId) -> Vec<(Cell, u32)> {
    battle
        .bounds
        .cells()
        .filter(|&cell| destination_free(battle, unit_id, cell))
        .filter_map(|cell| {
            validate_move(battle, unit_id, cell)
                .ok()
                .map(|plan| (cell, plan.total_cost()))
        })
        .collect()
}
