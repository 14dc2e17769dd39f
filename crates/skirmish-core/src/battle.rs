//! The battle aggregate.
//!
//! A [`Battle`] is the single mutable state of one fight. It is owned by
//! exactly one writer at a time (the orchestrator, under the host's
//! per-battle lock) and is fully serialisable so it can be snapshotted and
//! rehydrated.
//!
//! Units are stored in a `BTreeMap` keyed by [`UnitId`], so every scan over
//! units runs in the same order on every platform.

use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use skirmish_grid::{Cell, Footprint, GridBounds, Obstacle, ObstacleLayout};

use crate::config::EngineConfig;
use crate::error::SetupError;
use crate::ids::{BattleId, OwnerId, UnitId};
use crate::unit::{CombatUnit, UnitTemplate};

/// Lifecycle of a battle inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleStatus {
    /// Turns are being played.
    Active,
    /// Decided; no further intents are accepted.
    Ended,
}

/// How a battle was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    /// Exactly one side has living units.
    Winner(OwnerId),
    /// No side has living units.
    Draw,
}

/// Why a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Every other side was wiped out.
    Elimination,
    /// The last units of every side fell together.
    MutualDestruction,
}

/// One unit to place at battle start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpawn {
    /// Id the unit will carry.
    pub id: UnitId,
    /// Owning side.
    pub owner: OwnerId,
    /// Template to spawn from.
    pub template: UnitTemplate,
    /// Anchor cell.
    pub position: Cell,
}

/// Everything the lobby hands over once both sides are ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSetup {
    /// Battle id.
    pub id: BattleId,
    /// Grid width.
    pub width: u32,
    /// Grid height.
    pub height: u32,
    /// Seed for the battle's random rolls.
    pub seed: u64,
    /// The side that started the fight; wins speed ties in the action order.
    pub initiator: OwnerId,
    /// Units to place.
    pub spawns: Vec<UnitSpawn>,
    /// Obstacle layout from the map generator.
    pub obstacles: Vec<Obstacle>,
}

/// The authoritative state of one battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    /// Battle id.
    pub id: BattleId,
    /// Grid size.
    pub bounds: GridBounds,
    /// Seed for random rolls.
    pub seed: u64,
    /// Round number, starting at 1.
    pub round: u32,
    /// Index into `action_order` of the owner holding the turn.
    pub current_turn_index: usize,
    /// Lifecycle.
    pub status: BattleStatus,
    /// Set when `status` becomes `Ended`.
    pub outcome: Option<BattleOutcome>,
    /// Seconds left on the turn countdown.
    pub turn_timer: u32,
    /// External pause: the countdown holds its value while set.
    pub timer_paused: bool,
    /// Side that started the fight.
    pub initiator: OwnerId,
    /// One entry per side, by descending summed speed.
    pub action_order: Vec<OwnerId>,
    /// All units, dead or alive.
    pub units: BTreeMap<UnitId, CombatUnit>,
    /// Unit currently mid-turn.
    pub active_unit: Option<UnitId>,
    /// Turns each side has completed this round.
    pub acted_this_round: BTreeMap<OwnerId, u32>,
    /// Obstacles; only destruction mutates them.
    pub obstacles: ObstacleLayout,
}

impl Battle {
    /// Validates a setup and places every unit. The battle is `Active` at
    /// round 1 with the action order computed; the orchestrator's `start`
    /// arms the first turn.
    ///
    /// # Errors
    ///
    /// Returns a [`SetupError`] for empty grids, fewer than two sides,
    /// duplicate ids, off-grid or overlapping units, or an initiator with no
    /// units.
    pub fn from_setup(setup: BattleSetup, config: &EngineConfig) -> Result<Self, SetupError> {
        if setup.width == 0 || setup.height == 0 {
            return Err(SetupError::EmptyGrid);
        }
        let bounds = GridBounds::new(setup.width, setup.height);
        let obstacles = ObstacleLayout::from_obstacles(setup.obstacles);

        let mut units: BTreeMap<UnitId, CombatUnit> = BTreeMap::new();
        for spawn in setup.spawns {
            let unit = spawn
                .template
                .spawn(spawn.id, spawn.owner, spawn.position, config);
            let footprint = unit.footprint();
            if !bounds.contains_footprint(&footprint) {
                return Err(SetupError::UnitOutOfBounds(unit.id));
            }
            if units.contains_key(&unit.id) {
                return Err(SetupError::DuplicateUnit(unit.id));
            }
            let overlaps_unit = units.values().any(|u| u.footprint().overlaps(&footprint));
            let overlaps_obstacle = footprint.cells().any(|c| obstacles.blocks(c));
            if overlaps_unit || overlaps_obstacle {
                return Err(SetupError::Overlap(unit.id));
            }
            units.insert(unit.id, unit);
        }

        let owners: BTreeSet<OwnerId> = units.values().map(|u| u.owner).collect();
        if owners.len() < 2 {
            return Err(SetupError::NotEnoughSides);
        }
        if !owners.contains(&setup.initiator) {
            return Err(SetupError::UnknownInitiator(setup.initiator));
        }

        let mut battle = Battle {
            id: setup.id,
            bounds,
            seed: setup.seed,
            round: 1,
            current_turn_index: 0,
            status: BattleStatus::Active,
            outcome: None,
            turn_timer: config.turn_seconds,
            timer_paused: false,
            initiator: setup.initiator,
            action_order: Vec::new(),
            units,
            active_unit: None,
            acted_this_round: BTreeMap::new(),
            obstacles,
        };
        battle.action_order = battle.compute_action_order();
        Ok(battle)
    }

    /// A fresh random stream for this battle, seeded from its seed and round.
    ///
    /// Rehydrated battles get the same stream they would have had at the
    /// start of the round they were saved in.
    #[must_use]
    pub fn seeded_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed ^ u64::from(self.round).rotate_left(32))
    }

    /// Looks up a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&CombatUnit> {
        self.units.get(&id)
    }

    /// Looks up a unit mutably.
    #[must_use]
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut CombatUnit> {
        self.units.get_mut(&id)
    }

    /// Living units in id order.
    pub fn living_units(&self) -> impl Iterator<Item = &CombatUnit> {
        self.units.values().filter(|u| u.is_alive())
    }

    /// Returns true while the battle accepts intents.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == BattleStatus::Active
    }

    /// Owner holding the turn.
    #[must_use]
    pub fn current_owner(&self) -> Option<OwnerId> {
        self.action_order.get(self.current_turn_index).copied()
    }

    /// Sides that still have at least one living unit.
    #[must_use]
    pub fn living_owners(&self) -> BTreeSet<OwnerId> {
        self.living_units().map(|u| u.owner).collect()
    }

    /// Sides ordered by descending summed speed of their living units.
    ///
    /// Ties go to the initiator; remaining ties keep owner id order.
    #[must_use]
    pub fn compute_action_order(&self) -> Vec<OwnerId> {
        let mut speed: BTreeMap<OwnerId, u32> = BTreeMap::new();
        for unit in self.units.values() {
            let entry = speed.entry(unit.owner).or_insert(0);
            if unit.is_alive() {
                *entry += unit.attributes.speed;
            }
        }
        let mut order: Vec<(OwnerId, u32)> = speed.into_iter().collect();
        order.sort_by(|(a_owner, a_speed), (b_owner, b_speed)| {
            b_speed
                .cmp(a_speed)
                .then_with(|| (*b_owner == self.initiator).cmp(&(*a_owner == self.initiator)))
                .then_with(|| a_owner.cmp(b_owner))
        });
        order.into_iter().map(|(owner, _)| owner).collect()
    }

    /// Victory rule: one side left wins, none left is a draw, otherwise `None`.
    #[must_use]
    pub fn decide(&self) -> Option<(BattleOutcome, EndReason)> {
        let living = self.living_owners();
        match living.len() {
            0 => Some((BattleOutcome::Draw, EndReason::MutualDestruction)),
            1 => living
                .into_iter()
                .next()
                .map(|owner| (BattleOutcome::Winner(owner), EndReason::Elimination)),
            _ => None,
        }
    }

    /// Returns true if `cell` is blocked for `mover`: covered by another
    /// living unit or uncleared corpse, or by a standing blocking obstacle.
    #[must_use]
    pub fn cell_blocked_for(&self, cell: Cell, mover: UnitId) -> bool {
        if self.obstacles.blocks(cell) {
            return true;
        }
        self.units
            .values()
            .any(|u| u.id != mover && u.blocks_cells() && u.footprint().covers(cell))
    }

    /// Returns true if any cell of `footprint` is blocked for `mover`.
    #[must_use]
    pub fn footprint_blocked_for(&self, footprint: &Footprint, mover: UnitId) -> bool {
        footprint.cells().any(|c| self.cell_blocked_for(c, mover))
    }

    /// Living unit covering `cell`, if any.
    #[must_use]
    pub fn living_unit_at(&self, cell: Cell) -> Option<&CombatUnit> {
        self.living_units().find(|u| u.footprint().covers(cell))
    }

    /// Uncleared corpse covering `cell`, if any.
    #[must_use]
    pub fn corpse_at(&self, cell: Cell) -> Option<&CombatUnit> {
        self.units
            .values()
            .find(|u| u.is_corpse() && u.footprint().covers(cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::helpers::{duel_setup, template};
    use skirmish_grid::ObstacleId;

    #[test]
    fn setup_places_units_and_orders_sides() {
        let battle = Battle::from_setup(duel_setup(), &EngineConfig::default()).unwrap();
        assert_eq!(battle.round, 1);
        assert_eq!(battle.units.len(), 2);
        assert!(battle.is_active());
        // Side 2's unit is faster.
        assert_eq!(battle.action_order, vec![OwnerId::new(2), OwnerId::new(1)]);
    }

    #[test]
    fn speed_tie_favours_initiator() {
        let mut setup = duel_setup();
        for spawn in &mut setup.spawns {
            spawn.template.attributes.speed = 4;
        }
        setup.initiator = OwnerId::new(2);
        let battle = Battle::from_setup(setup.clone(), &EngineConfig::default()).unwrap();
        assert_eq!(battle.action_order[0], OwnerId::new(2));

        setup.initiator = OwnerId::new(1);
        let battle = Battle::from_setup(setup, &EngineConfig::default()).unwrap();
        assert_eq!(battle.action_order[0], OwnerId::new(1));
    }

    #[test]
    fn setup_rejects_single_side() {
        let mut setup = duel_setup();
        setup.spawns.truncate(1);
        assert_eq!(
            Battle::from_setup(setup, &EngineConfig::default()),
            Err(SetupError::NotEnoughSides)
        );
    }

    #[test]
    fn setup_rejects_overlap_and_bounds() {
        let mut setup = duel_setup();
        setup.spawns[1].position = setup.spawns[0].position;
        assert!(matches!(
            Battle::from_setup(setup, &EngineConfig::default()),
            Err(SetupError::Overlap(_))
        ));

        let mut setup = duel_setup();
        setup.spawns[0].position = Cell::new(50, 0);
        assert!(matches!(
            Battle::from_setup(setup, &EngineConfig::default()),
            Err(SetupError::UnitOutOfBounds(_))
        ));

        let mut setup = duel_setup();
        setup.obstacles = vec![Obstacle::new(ObstacleId::new(1), setup.spawns[0].position, 3)];
        assert!(matches!(
            Battle::from_setup(setup, &EngineConfig::default()),
            Err(SetupError::Overlap(_))
        ));
    }

    #[test]
    fn setup_rejects_duplicate_ids() {
        let mut setup = duel_setup();
        setup.spawns[1].id = setup.spawns[0].id;
        setup.spawns[1].position = Cell::new(7, 7);
        assert!(matches!(
            Battle::from_setup(setup, &EngineConfig::default()),
            Err(SetupError::DuplicateUnit(_))
        ));
    }

    #[test]
    fn decide_follows_living_sides() {
        let mut battle = Battle::from_setup(duel_setup(), &EngineConfig::default()).unwrap();
        assert_eq!(battle.decide(), None);

        let first = *battle.units.keys().next().unwrap();
        battle.unit_mut(first).unwrap().lose_hp(u32::MAX);
        assert_eq!(
            battle.decide(),
            Some((BattleOutcome::Winner(OwnerId::new(2)), EndReason::Elimination))
        );

        for unit in battle.units.values_mut() {
            unit.lose_hp(u32::MAX);
        }
        assert_eq!(
            battle.decide(),
            Some((BattleOutcome::Draw, EndReason::MutualDestruction))
        );
    }

    #[test]
    fn corpses_block_cells_until_cleared() {
        let mut setup = duel_setup();
        setup.spawns.push(UnitSpawn {
            id: UnitId::new(9),
            owner: OwnerId::new(1),
            template: template(1, 1, 1),
            position: Cell::new(4, 4),
        });
        let mut battle = Battle::from_setup(setup, &EngineConfig::default()).unwrap();
        let mover = UnitId::new(1);
        battle.unit_mut(UnitId::new(9)).unwrap().lose_hp(u32::MAX);
        assert!(battle.cell_blocked_for(Cell::new(4, 4), mover));
        assert!(battle.corpse_at(Cell::new(4, 4)).is_some());
        assert!(battle.living_unit_at(Cell::new(4, 4)).is_none());
    }
}
