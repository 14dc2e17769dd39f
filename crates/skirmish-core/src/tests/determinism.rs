//! Same seed, same intents, same battle.

use rand::Rng;

use super::helpers::{place, skirmish, P1, P2};
use crate::battle::Battle;
use crate::combat::DamageType;
use crate::config::EngineConfig;
use crate::ids::UnitId;
use crate::orchestrator::{AttackTarget, Intent, Orchestrator};
use crate::unit::{Attributes, UnitCategory, UnitTemplate};

fn brawler(speed: u32) -> UnitTemplate {
    UnitTemplate::new("brawler", UnitCategory::Champion, Attributes {
        combat: 3,
        speed,
        focus: 0,
        resistance: 1,
        will: 1,
        vitality: 4,
    })
}

/// Two adjacent units trade blows until one falls or 40 turns pass.
fn slugfest(seed: u64) -> Battle {
    let orch = Orchestrator::new(EngineConfig {
        competitive: true,
        ..EngineConfig::default()
    });
    let mut battle = skirmish(vec![
        place(1, P1, brawler(9), 3, 3),
        place(2, P2, brawler(8), 4, 3),
    ]);
    battle.seed = seed;
    let mut rng = battle.seeded_rng();
    orch.start(&mut battle);

    for _ in 0..40 {
        let Some(owner) = battle.current_owner() else { break };
        if !battle.is_active() {
            break;
        }
        let (me, them) = if owner == P1 {
            (UnitId::new(1), UnitId::new(2))
        } else {
            (UnitId::new(2), UnitId::new(1))
        };
        let damage_type = if rng.gen_bool(0.5) {
            DamageType::Physical
        } else {
            DamageType::Magical
        };
        let _ = orch.handle(&mut battle, owner, Intent::Nominate { unit: me }, &mut rng);
        let _ = orch.handle(
            &mut battle,
            owner,
            Intent::Attack {
                target: AttackTarget::Unit(them),
                damage_type,
            },
            &mut rng,
        );
        let _ = orch.handle(&mut battle, owner, Intent::EndTurn, &mut rng);
    }
    battle
}

#[test]
fn same_seed_same_battle() {
    assert_eq!(slugfest(11), slugfest(11));
}

#[test]
fn seed_drives_the_rolls() {
    let outcomes: Vec<Battle> = (0..8).map(slugfest).collect();
    assert!(
        outcomes.windows(2).any(|w| w[0].units != w[1].units),
        "eight seeds should not all play out identically"
    );
}
