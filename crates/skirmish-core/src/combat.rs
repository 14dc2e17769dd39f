//! Combat resolution.
//!
//! Three entry points share one shape: validate everything, consume the
//! action, compute, then run the expiry sweep on every unit involved.
//!
//! - [`resolve_attack`]: unit against unit, with dodge and typed absorption
//! - [`resolve_maneuver`]: special maneuvers
//! - [`strike`]: the lighter path against corpses and obstacles
//!
//! ## Damage
//!
//! ```text
//! dodge  = clamp(speed × 3 + dodge_delta, 0, 75)       percent
//! raw    = max(1, combat + bonus_damage)
//! final  = raw − damage_reduction                      floored at 0
//! ```
//!
//! Physical damage is drawn from the physical pool first, magical from the
//! magical pool, true damage bypasses both. A pool that takes at least its
//! current value is emptied, marked broken, and the excess carries to HP.

use rand::Rng;
use serde::{Deserialize, Serialize};
use skirmish_grid::{Cell, Footprint, StrikeOutcome};
use std::fmt;
use tracing::{debug, info};

use crate::battle::Battle;
use crate::condition::{ActionKind, Condition, Scan};
use crate::config::EngineConfig;
use crate::error::Rejection;
use crate::ids::UnitId;
use crate::unit::{CombatUnit, Pool, UnitFlags};

/// Highest dodge chance any unit can reach, in percent.
pub const MAX_DODGE: u32 = 75;

// ============================================================================
// Damage math
// ============================================================================

/// The type of incoming damage, which decides the pool it hits first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    /// Absorbed by physical protection.
    Physical,
    /// Absorbed by magical protection.
    Magical,
    /// Goes straight to HP.
    True,
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Physical => write!(f, "physical"),
            Self::Magical => write!(f, "magical"),
            Self::True => write!(f, "true"),
        }
    }
}

/// Dodge chance in percent, always within `0..=MAX_DODGE`.
///
/// # Example
///
/// ```
/// use skirmish_core::combat::dodge_chance;
///
/// assert_eq!(dodge_chance(10, 0), 30);
/// assert_eq!(dodge_chance(40, 0), 75);
/// assert_eq!(dodge_chance(2, -100), 0);
/// ```
#[must_use]
pub fn dodge_chance(speed: u32, dodge_delta: i32) -> u32 {
    let raw = i64::from(speed) * 3 + i64::from(dodge_delta);
    u32::try_from(raw.clamp(0, i64::from(MAX_DODGE))).unwrap_or(0)
}

/// Hit damage before the defender's reduction.
#[must_use]
pub fn raw_damage(combat: u32, bonus: u32) -> u32 {
    combat.saturating_add(bonus).max(1)
}

/// How one hit split between a protection pool and HP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absorption {
    /// Pool value before the hit.
    pub pool_before: u32,
    /// Pool value after the hit.
    pub pool_after: u32,
    /// Damage that carried through to HP.
    pub to_hp: u32,
    /// The hit emptied the pool.
    pub broke: bool,
}

/// Runs `damage` through `pool`.
///
/// A pool with no capacity never breaks; everything goes to HP.
pub fn absorb(pool: &mut Pool, damage: u32) -> Absorption {
    let pool_before = pool.current;
    if damage < pool.current {
        pool.current -= damage;
        return Absorption {
            pool_before,
            pool_after: pool.current,
            to_hp: 0,
            broke: false,
        };
    }
    pool.current = 0;
    Absorption {
        pool_before,
        pool_after: 0,
        to_hp: damage - pool_before,
        broke: pool.max > 0,
    }
}

/// Applies typed damage to a unit: pool first, then HP.
/// Returns the absorption and whether the unit died.
pub fn apply_damage(unit: &mut CombatUnit, damage: u32, damage_type: DamageType) -> (Absorption, bool) {
    let absorption = match damage_type {
        DamageType::Physical => {
            let a = absorb(&mut unit.physical, damage);
            if a.broke {
                unit.flags.insert(UnitFlags::PHYSICAL_BROKEN);
            }
            a
        }
        DamageType::Magical => {
            let a = absorb(&mut unit.magical, damage);
            if a.broke {
                unit.flags.insert(UnitFlags::MAGICAL_BROKEN);
            }
            a
        }
        DamageType::True => Absorption {
            to_hp: damage,
            ..Absorption::default()
        },
    };
    let killed = unit.lose_hp(absorption.to_hp);
    (absorption, killed)
}

// ============================================================================
// Attacks
// ============================================================================

/// Full breakdown of one attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    /// Attacking unit.
    pub attacker: UnitId,
    /// Defending unit.
    pub defender: UnitId,
    /// Type of the hit.
    pub damage_type: DamageType,
    /// Defender's dodge chance, in percent.
    pub dodge_chance: u32,
    /// The d100 roll; the hit is dodged when `roll < dodge_chance`.
    pub roll: u32,
    /// The defender evaded.
    pub dodged: bool,
    /// Damage before reduction (0 when dodged).
    pub raw_damage: u32,
    /// Damage after reduction (0 when dodged).
    pub final_damage: u32,
    /// Pool split.
    pub absorption: Absorption,
    /// Defender HP before.
    pub hp_before: u32,
    /// Defender HP after.
    pub hp_after: u32,
    /// The defender died.
    pub lethal: bool,
    /// Conditions the attacker's sweep removed.
    pub attacker_expired: Vec<Condition>,
    /// Conditions the defender's sweep removed.
    pub defender_expired: Vec<Condition>,
}

/// Actor checks shared by every action: alive, has an action, not blocked.
fn ready_to_act(unit: &CombatUnit, kind: ActionKind) -> Result<Scan, Rejection> {
    if !unit.is_alive() {
        return Err(Rejection::UnitDead(unit.id));
    }
    if unit.actions_left == 0 {
        return Err(Rejection::NoActionsLeft(unit.id));
    }
    let scan = unit.conditions.scan(kind);
    if let Some(condition) = scan.blocked_by {
        return Err(Rejection::ConditionBlocked {
            condition,
            action: kind,
        });
    }
    Ok(scan)
}

/// Checks that `target` is a living enemy adjacent to `actor`.
fn adjacent_enemy<'a>(
    battle: &'a Battle,
    actor: &CombatUnit,
    target: UnitId,
) -> Result<&'a CombatUnit, Rejection> {
    let defender = battle.unit(target).ok_or(Rejection::UnitNotFound(target))?;
    if !defender.is_alive() {
        return Err(Rejection::UnitDead(target));
    }
    if defender.owner == actor.owner {
        return Err(Rejection::FriendlyTarget(target));
    }
    let distance = actor.footprint().distance(&defender.footprint());
    if distance != 1 {
        return Err(Rejection::OutOfRange { distance });
    }
    Ok(defender)
}

/// Rolls a d100 against `chance`.
fn roll_dodge<R: Rng + ?Sized>(rng: &mut R, chance: u32) -> (u32, bool) {
    let roll = rng.gen_range(0..100);
    (roll, roll < chance)
}

/// Resolves `attacker_id` hitting `defender_id`.
///
/// The action is consumed whether or not the hit lands, and both units'
/// expiry sweeps run either way.
///
/// # Errors
///
/// Rejects dead or missing units, friendly targets, targets that are not
/// adjacent, attackers with no actions left, and attacks a condition forbids.
/// A rejected attack changes nothing.
pub fn resolve_attack<R: Rng + ?Sized>(
    battle: &mut Battle,
    attacker_id: UnitId,
    defender_id: UnitId,
    damage_type: DamageType,
    rng: &mut R,
) -> Result<AttackReport, Rejection> {
    let attacker = battle
        .unit(attacker_id)
        .ok_or(Rejection::UnitNotFound(attacker_id))?;
    let attack_scan = ready_to_act(attacker, ActionKind::Attack)?;
    let defender = adjacent_enemy(battle, attacker, defender_id)?;

    let combat = attacker.attributes.combat;
    let defend_scan = defender.conditions.scan(ActionKind::Defend);
    let chance = dodge_chance(defender.attributes.speed, defend_scan.modifiers.dodge_delta);
    let (roll, dodged) = roll_dodge(rng, chance);

    // Committed from here on.
    let attacker = battle
        .unit_mut(attacker_id)
        .ok_or(Rejection::UnitNotFound(attacker_id))?;
    attacker.actions_left -= 1;
    let attacker_expired = attacker.conditions.apply_expiry(&attack_scan);

    let defender = battle
        .unit_mut(defender_id)
        .ok_or(Rejection::UnitNotFound(defender_id))?;
    let hp_before = defender.hp.current;
    let (raw, final_damage, absorption, lethal) = if dodged {
        (0, 0, Absorption::default(), false)
    } else {
        let raw = raw_damage(combat, attack_scan.modifiers.bonus_damage);
        let final_damage = raw.saturating_sub(defend_scan.modifiers.damage_reduction);
        let (absorption, lethal) = apply_damage(defender, final_damage, damage_type);
        (raw, final_damage, absorption, lethal)
    };
    let defender_expired = defender.conditions.apply_expiry(&defend_scan);

    let report = AttackReport {
        attacker: attacker_id,
        defender: defender_id,
        damage_type,
        dodge_chance: chance,
        roll,
        dodged,
        raw_damage: raw,
        final_damage,
        absorption,
        hp_before,
        hp_after: defender.hp.current,
        lethal,
        attacker_expired,
        defender_expired,
    };
    debug!(
        attacker = %attacker_id,
        defender = %defender_id,
        %damage_type,
        dodged,
        final_damage,
        lethal,
        "attack resolved"
    );
    if lethal {
        info!(unit = %defender_id, by = %attacker_id, "unit fell");
    }
    Ok(report)
}

// ============================================================================
// Maneuvers
// ============================================================================

/// Special maneuvers a unit may spend an action on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverKind {
    /// Self: Guarded.
    Brace,
    /// Self: Evasive.
    Sidestep,
    /// Self: Hasted.
    Sprint,
    /// Adjacent enemy, dodgeable: KnockedDown.
    Trip,
    /// Self: Frenzied, paid out as an extra action next turn.
    Rally,
}

impl ManeuverKind {
    /// Condition the maneuver inflicts.
    #[must_use]
    pub const fn condition(self) -> Condition {
        match self {
            Self::Brace => Condition::Guarded,
            Self::Sidestep => Condition::Evasive,
            Self::Sprint => Condition::Hasted,
            Self::Trip => Condition::KnockedDown,
            Self::Rally => Condition::Frenzied,
        }
    }

    /// Returns true if the maneuver needs an enemy target.
    #[must_use]
    pub const fn is_targeted(self) -> bool {
        matches!(self, Self::Trip)
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Brace => "brace",
            Self::Sidestep => "sidestep",
            Self::Sprint => "sprint",
            Self::Trip => "trip",
            Self::Rally => "rally",
        }
    }
}

impl fmt::Display for ManeuverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a maneuver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManeuverReport {
    /// Acting unit.
    pub unit: UnitId,
    /// Maneuver performed.
    pub kind: ManeuverKind,
    /// Target, for targeted maneuvers.
    pub target: Option<UnitId>,
    /// Condition that landed, if any.
    pub inflicted: Option<Condition>,
    /// The target evaded.
    pub dodged: bool,
    /// Conditions the actor's sweep removed.
    pub expired: Vec<Condition>,
}

/// Resolves a special maneuver.
///
/// # Errors
///
/// Same actor checks as an attack (scanned as a special action). Trip
/// additionally needs an adjacent living enemy; self maneuvers reject a
/// target.
pub fn resolve_maneuver<R: Rng + ?Sized>(
    battle: &mut Battle,
    unit_id: UnitId,
    kind: ManeuverKind,
    target: Option<UnitId>,
    rng: &mut R,
) -> Result<ManeuverReport, Rejection> {
    let unit = battle.unit(unit_id).ok_or(Rejection::UnitNotFound(unit_id))?;
    let scan = ready_to_act(unit, ActionKind::Special)?;

    let target = match (kind.is_targeted(), target) {
        (true, Some(target_id)) => {
            let defender = adjacent_enemy(battle, unit, target_id)?;
            let defend_scan = defender.conditions.scan(ActionKind::Defend);
            let chance =
                dodge_chance(defender.attributes.speed, defend_scan.modifiers.dodge_delta);
            let (_, dodged) = roll_dodge(rng, chance);
            Some((target_id, defend_scan, dodged))
        }
        (false, None) => None,
        _ => return Err(Rejection::InvalidManeuverTarget(kind.name())),
    };

    let unit = battle
        .unit_mut(unit_id)
        .ok_or(Rejection::UnitNotFound(unit_id))?;
    unit.actions_left -= 1;

    let target_unit = target.as_ref().map(|(id, _, _)| *id);
    let mut dodged = false;
    let mut inflicted = None;
    match target {
        None => {
            unit.conditions.inflict(kind.condition(), true);
            inflicted = Some(kind.condition());
        }
        Some((target_id, defend_scan, evaded)) => {
            dodged = evaded;
            let defender = battle
                .unit_mut(target_id)
                .ok_or(Rejection::UnitNotFound(target_id))?;
            if !evaded {
                defender.conditions.inflict(kind.condition(), false);
                inflicted = Some(kind.condition());
            }
            defender.conditions.apply_expiry(&defend_scan);
        }
    }

    let unit = battle
        .unit_mut(unit_id)
        .ok_or(Rejection::UnitNotFound(unit_id))?;
    let expired = unit.conditions.apply_expiry(&scan);
    debug!(unit = %unit_id, %kind, ?inflicted, dodged, "maneuver performed");
    Ok(ManeuverReport {
        unit: unit_id,
        kind,
        target: target_unit,
        inflicted,
        dodged,
        expired,
    })
}

// ============================================================================
// Strikes against corpses and obstacles
// ============================================================================

/// Result of striking a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum StrikeReport {
    /// A corpse was struck.
    Corpse {
        /// Striking unit.
        attacker: UnitId,
        /// The dead unit.
        corpse: UnitId,
        /// Damage dealt.
        damage: u32,
        /// The corpse was cleared and stops blocking.
        cleared: bool,
    },
    /// An obstacle was struck.
    Obstacle {
        /// Striking unit.
        attacker: UnitId,
        /// Obstacle HP change.
        outcome: StrikeOutcome,
    },
}

/// Strikes whatever blocks `cell`: a corpse first, then an obstacle.
///
/// # Errors
///
/// Same actor checks as an attack; the cell must be adjacent and hold an
/// uncleared corpse or a standing obstacle.
pub fn strike(
    battle: &mut Battle,
    attacker_id: UnitId,
    cell: Cell,
    config: &EngineConfig,
) -> Result<StrikeReport, Rejection> {
    let attacker = battle
        .unit(attacker_id)
        .ok_or(Rejection::UnitNotFound(attacker_id))?;
    let scan = ready_to_act(attacker, ActionKind::Attack)?;
    let distance = attacker.footprint().distance(&Footprint::cell(cell));
    if distance != 1 {
        return Err(Rejection::OutOfRange { distance });
    }
    let damage = raw_damage(attacker.attributes.combat, scan.modifiers.bonus_damage);
    let corpse = battle.corpse_at(cell).map(|u| u.id);
    let obstacle = battle.obstacles.standing_at(cell).map(|o| o.id);

    let report = if let Some(corpse) = corpse {
        let cleared = damage >= config.corpse_clear_threshold;
        if cleared {
            if let Some(body) = battle.unit_mut(corpse) {
                body.flags.insert(UnitFlags::CORPSE_CLEARED);
            }
        }
        StrikeReport::Corpse {
            attacker: attacker_id,
            corpse,
            damage,
            cleared,
        }
    } else if let Some(obstacle) = obstacle {
        let outcome = battle.obstacles.strike(obstacle, damage)?;
        StrikeReport::Obstacle {
            attacker: attacker_id,
            outcome,
        }
    } else {
        return Err(Rejection::NothingToStrike(cell));
    };

    let attacker = battle
        .unit_mut(attacker_id)
        .ok_or(Rejection::UnitNotFound(attacker_id))?;
    attacker.actions_left -= 1;
    attacker.conditions.apply_expiry(&scan);
    debug!(attacker = %attacker_id, ?cell, ?report, "strike resolved");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::OwnerId;
    use crate::tests::helpers::{place, skirmish, template, FixedRoll};
    use skirmish_grid::{Obstacle, ObstacleId, ObstacleLayout};

    const ME: OwnerId = OwnerId::new(1);
    const THEM: OwnerId = OwnerId::new(2);

    fn duel(attacker_combat: u32, defender_speed: u32, defender_resistance: u32) -> Battle {
        let mut battle = skirmish(vec![
            place(1, ME, template(attacker_combat, 3, 1), 2, 2),
            place(2, THEM, template(1, defender_speed, defender_resistance), 3, 2),
        ]);
        battle.unit_mut(UnitId::new(1)).unwrap().actions_left = 1;
        battle
    }

    mod math_tests {
        use super::*;

        #[test]
        fn dodge_scales_with_speed() {
            assert_eq!(dodge_chance(10, 0), 30);
            assert_eq!(dodge_chance(0, 0), 0);
            assert_eq!(dodge_chance(10, 25), 55);
            assert_eq!(dodge_chance(100, 0), MAX_DODGE);
            assert_eq!(dodge_chance(1, -20), 0);
        }

        #[test]
        fn absorption_reduces_pool_below_threshold() {
            let mut pool = Pool::full(6);
            let a = absorb(&mut pool, 4);
            assert_eq!((a.pool_after, a.to_hp, a.broke), (2, 0, false));
        }

        #[test]
        fn absorption_breaks_and_carries() {
            let mut pool = Pool::full(4);
            let a = absorb(&mut pool, 5);
            assert_eq!((a.pool_before, a.pool_after, a.to_hp, a.broke), (4, 0, 1, true));

            let mut pool = Pool::full(4);
            let a = absorb(&mut pool, 4);
            assert_eq!((a.pool_after, a.to_hp, a.broke), (0, 0, true));
        }

        #[test]
        fn empty_pool_never_breaks() {
            let mut pool = Pool::full(0);
            let a = absorb(&mut pool, 3);
            assert_eq!((a.to_hp, a.broke), (3, false));
        }

        #[test]
        fn raw_damage_is_at_least_one() {
            assert_eq!(raw_damage(0, 0), 1);
            assert_eq!(raw_damage(5, 2), 7);
        }
    }

    mod attack_tests {
        use super::*;

        #[test]
        fn hit_breaks_physical_pool_and_carries_to_hp() {
            // Resistance 2 gives a physical pool of 4.
            let mut battle = duel(5, 0, 2);
            let report = resolve_attack(
                &mut battle,
                UnitId::new(1),
                UnitId::new(2),
                DamageType::Physical,
                &mut FixedRoll(99),
            )
            .unwrap();
            assert!(!report.dodged);
            assert_eq!(report.final_damage, 5);
            assert_eq!(report.absorption.pool_after, 0);
            assert_eq!(report.hp_before - report.hp_after, 1);
            let defender = battle.unit(UnitId::new(2)).unwrap();
            assert!(defender.flags.contains(UnitFlags::PHYSICAL_BROKEN));
            assert_eq!(battle.unit(UnitId::new(1)).unwrap().actions_left, 0);
        }

        #[test]
        fn dodge_still_consumes_the_action() {
            let mut battle = duel(5, 10, 2);
            let report = resolve_attack(
                &mut battle,
                UnitId::new(1),
                UnitId::new(2),
                DamageType::Physical,
                &mut FixedRoll(0),
            )
            .unwrap();
            assert!(report.dodged);
            assert_eq!(report.dodge_chance, 30);
            assert_eq!(report.final_damage, 0);
            assert_eq!(report.hp_after, report.hp_before);
            assert_eq!(battle.unit(UnitId::new(1)).unwrap().actions_left, 0);
        }

        #[test]
        fn true_damage_bypasses_pools() {
            let mut battle = duel(5, 0, 2);
            let report = resolve_attack(
                &mut battle,
                UnitId::new(1),
                UnitId::new(2),
                DamageType::True,
                &mut FixedRoll(99),
            )
            .unwrap();
            assert_eq!(report.hp_before - report.hp_after, 5);
            assert_eq!(battle.unit(UnitId::new(2)).unwrap().physical.current, 4);
        }

        #[test]
        fn conditions_fold_into_damage_and_expire() {
            let mut battle = duel(5, 0, 0);
            battle
                .unit_mut(UnitId::new(1))
                .unwrap()
                .conditions
                .inflict(Condition::Empowered, true);
            battle
                .unit_mut(UnitId::new(2))
                .unwrap()
                .conditions
                .inflict(Condition::Guarded, false);
            let report = resolve_attack(
                &mut battle,
                UnitId::new(1),
                UnitId::new(2),
                DamageType::True,
                &mut FixedRoll(99),
            )
            .unwrap();
            assert_eq!(report.raw_damage, 7);
            assert_eq!(report.final_damage, 4);
            assert_eq!(report.attacker_expired, vec![Condition::Empowered]);
            assert!(report.defender_expired.is_empty());
        }

        #[test]
        fn lethal_hit_marks_death() {
            let mut battle = duel(40, 0, 0);
            let report = resolve_attack(
                &mut battle,
                UnitId::new(1),
                UnitId::new(2),
                DamageType::Physical,
                &mut FixedRoll(99),
            )
            .unwrap();
            assert!(report.lethal);
            assert_eq!(report.hp_after, 0);
            assert!(!battle.unit(UnitId::new(2)).unwrap().is_alive());
        }

        #[test]
        fn rejections_leave_state_alone() {
            let mut battle = duel(5, 0, 2);
            let before = battle.clone();
            battle.unit_mut(UnitId::new(2)).unwrap().position = Cell::new(5, 4);
            let moved = battle.clone();
            assert!(matches!(
                resolve_attack(&mut battle, UnitId::new(1), UnitId::new(2), DamageType::Physical, &mut FixedRoll(99)),
                Err(Rejection::OutOfRange { distance: 5 })
            ));
            assert_eq!(battle, moved);

            let mut battle = before.clone();
            battle.unit_mut(UnitId::new(1)).unwrap().actions_left = 0;
            assert_eq!(
                resolve_attack(&mut battle, UnitId::new(1), UnitId::new(2), DamageType::Physical, &mut FixedRoll(99)),
                Err(Rejection::NoActionsLeft(UnitId::new(1)))
            );

            let mut battle = before;
            battle
                .unit_mut(UnitId::new(1))
                .unwrap()
                .conditions
                .inflict(Condition::Stunned, false);
            let blocked = battle.clone();
            assert!(matches!(
                resolve_attack(&mut battle, UnitId::new(1), UnitId::new(2), DamageType::Physical, &mut FixedRoll(99)),
                Err(Rejection::ConditionBlocked { condition: Condition::Stunned, .. })
            ));
            assert_eq!(battle, blocked);
        }

        #[test]
        fn friendly_fire_is_rejected() {
            let mut battle = skirmish(vec![
                place(1, ME, template(5, 3, 1), 2, 2),
                place(2, ME, template(1, 1, 1), 3, 2),
                place(3, THEM, template(1, 1, 1), 7, 7),
            ]);
            battle.unit_mut(UnitId::new(1)).unwrap().actions_left = 1;
            assert_eq!(
                resolve_attack(&mut battle, UnitId::new(1), UnitId::new(2), DamageType::Physical, &mut FixedRoll(99)),
                Err(Rejection::FriendlyTarget(UnitId::new(2)))
            );
        }
    }

    mod maneuver_tests {
        use super::*;

        #[test]
        fn brace_guards_self() {
            let mut battle = duel(5, 0, 2);
            let report =
                resolve_maneuver(&mut battle, UnitId::new(1), ManeuverKind::Brace, None, &mut FixedRoll(0))
                    .unwrap();
            assert_eq!(report.target, None);
            assert_eq!(report.inflicted, Some(Condition::Guarded));
            let unit = battle.unit(UnitId::new(1)).unwrap();
            assert!(unit.conditions.contains(Condition::Guarded));
            assert_eq!(unit.actions_left, 0);
        }

        #[test]
        fn trip_knocks_down_unless_dodged() {
            let mut battle = duel(5, 10, 2);
            let report = resolve_maneuver(
                &mut battle,
                UnitId::new(1),
                ManeuverKind::Trip,
                Some(UnitId::new(2)),
                &mut FixedRoll(99),
            )
            .unwrap();
            assert_eq!(report.target, Some(UnitId::new(2)));
            assert_eq!(report.inflicted, Some(Condition::KnockedDown));
            assert!(battle
                .unit(UnitId::new(2))
                .unwrap()
                .conditions
                .contains(Condition::KnockedDown));

            let mut battle = duel(5, 10, 2);
            let report = resolve_maneuver(
                &mut battle,
                UnitId::new(1),
                ManeuverKind::Trip,
                Some(UnitId::new(2)),
                &mut FixedRoll(0),
            )
            .unwrap();
            assert!(report.dodged);
            assert_eq!(report.target, Some(UnitId::new(2)));
            assert_eq!(report.inflicted, None);
        }

        #[test]
        fn target_shape_must_match() {
            let mut battle = duel(5, 0, 2);
            assert_eq!(
                resolve_maneuver(&mut battle, UnitId::new(1), ManeuverKind::Trip, None, &mut FixedRoll(0)),
                Err(Rejection::InvalidManeuverTarget("trip"))
            );
            assert_eq!(
                resolve_maneuver(
                    &mut battle,
                    UnitId::new(1),
                    ManeuverKind::Brace,
                    Some(UnitId::new(2)),
                    &mut FixedRoll(0)
                ),
                Err(Rejection::InvalidManeuverTarget("brace"))
            );
        }

        #[test]
        fn knocked_down_blocks_maneuvers() {
            let mut battle = duel(5, 0, 2);
            battle
                .unit_mut(UnitId::new(1))
                .unwrap()
                .conditions
                .inflict(Condition::KnockedDown, false);
            assert!(matches!(
                resolve_maneuver(&mut battle, UnitId::new(1), ManeuverKind::Sprint, None, &mut FixedRoll(0)),
                Err(Rejection::ConditionBlocked { .. })
            ));
        }
    }

    mod strike_tests {
        use super::*;

        #[test]
        fn obstacles_lose_hp_until_destroyed() {
            let mut battle = duel(3, 0, 0);
            battle.obstacles =
                ObstacleLayout::from_obstacles([Obstacle::new(ObstacleId::new(1), Cell::new(2, 3), 5)]);
            let config = EngineConfig::default();

            let report = strike(&mut battle, UnitId::new(1), Cell::new(2, 3), &config).unwrap();
            assert!(matches!(report, StrikeReport::Obstacle { outcome, .. } if outcome.hp_after == 2 && !outcome.destroyed));

            battle.unit_mut(UnitId::new(1)).unwrap().actions_left = 1;
            let report = strike(&mut battle, UnitId::new(1), Cell::new(2, 3), &config).unwrap();
            assert!(matches!(report, StrikeReport::Obstacle { outcome, .. } if outcome.destroyed));
            assert!(!battle.obstacles.blocks(Cell::new(2, 3)));
        }

        #[test]
        fn corpse_clears_at_threshold() {
            let mut battle = duel(2, 0, 0);
            battle.unit_mut(UnitId::new(2)).unwrap().lose_hp(u32::MAX);
            let config = EngineConfig::default();

            let report = strike(&mut battle, UnitId::new(1), Cell::new(3, 2), &config).unwrap();
            assert!(matches!(report, StrikeReport::Corpse { cleared: false, .. }));

            let unit = battle.unit_mut(UnitId::new(1)).unwrap();
            unit.actions_left = 1;
            unit.conditions.inflict(Condition::Empowered, true);
            let report = strike(&mut battle, UnitId::new(1), Cell::new(3, 2), &config).unwrap();
            assert!(matches!(report, StrikeReport::Corpse { cleared: true, .. }));
            assert!(battle.corpse_at(Cell::new(3, 2)).is_none());
        }

        #[test]
        fn empty_cell_is_rejected() {
            let mut battle = duel(3, 0, 0);
            assert_eq!(
                strike(&mut battle, UnitId::new(1), Cell::new(1, 2), &EngineConfig::default()),
                Err(Rejection::NothingToStrike(Cell::new(1, 2)))
            );
        }
    }
}
