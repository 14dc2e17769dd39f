//! Test factories for units, setups and battles.

use rand::RngCore;
use skirmish_grid::Cell;

use crate::battle::{Battle, BattleSetup, UnitSpawn};
use crate::config::EngineConfig;
use crate::ids::{BattleId, OwnerId, UnitId};
use crate::unit::{Attributes, UnitCategory, UnitTemplate};

// =============================================================================
// Sides
// =============================================================================

/// First side; initiator in every helper setup.
pub const P1: OwnerId = OwnerId::new(1);
/// Second side.
pub const P2: OwnerId = OwnerId::new(2);

// =============================================================================
// Units and setups
// =============================================================================

/// A soldier with the given combat, speed and resistance. Vitality 2 (20 HP),
/// focus 2, will 1.
pub fn template(combat: u32, speed: u32, resistance: u32) -> UnitTemplate {
    UnitTemplate::new("soldier", UnitCategory::Soldier, Attributes {
        combat,
        speed,
        focus: 2,
        resistance,
        will: 1,
        vitality: 2,
    })
}

/// A spawn entry at `(x, y)`.
pub fn place(id: u64, owner: OwnerId, template: UnitTemplate, x: i32, y: i32) -> UnitSpawn {
    UnitSpawn {
        id: UnitId::new(id),
        owner,
        template,
        position: Cell::new(x, y),
    }
}

/// One unit per side on an 8x8 grid: unit 1 (P1, speed 3) at the top left,
/// unit 2 (P2, speed 5) at the bottom right. P2 acts first.
pub fn duel_setup() -> BattleSetup {
    BattleSetup {
        id: BattleId::new(1),
        width: 8,
        height: 8,
        seed: 7,
        initiator: P1,
        spawns: vec![
            place(1, P1, template(4, 3, 2), 0, 0),
            place(2, P2, template(4, 5, 2), 7, 7),
        ],
        obstacles: Vec::new(),
    }
}

/// [`duel_setup`] as a battle.
pub fn duel() -> Battle {
    Battle::from_setup(duel_setup(), &EngineConfig::default()).unwrap()
}

/// An 8x8 battle with the given spawns and no obstacles. P1 is the initiator.
pub fn skirmish(spawns: Vec<UnitSpawn>) -> Battle {
    let setup = BattleSetup {
        id: BattleId::new(1),
        width: 8,
        height: 8,
        seed: 7,
        initiator: P1,
        spawns,
        obstacles: Vec::new(),
    };
    Battle::from_setup(setup, &EngineConfig::default()).unwrap()
}

// =============================================================================
// Rolls
// =============================================================================

/// An RNG whose every `gen_range(0..100)` yields the wrapped value.
///
/// The raw output is the smallest `u32` whose widening multiply by 100 lands
/// in the wanted bucket, which keeps it clear of the rejection zone.
#[derive(Debug, Clone, Copy)]
pub struct FixedRoll(pub u32);

impl RngCore for FixedRoll {
    fn next_u32(&mut self) -> u32 {
        let bucket = u64::from(self.0.min(99));
        u32::try_from(((bucket << 32) / 100) + 1).unwrap_or(u32::MAX)
    }

    fn next_u64(&mut self) -> u64 {
        u64::from(self.next_u32())
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
