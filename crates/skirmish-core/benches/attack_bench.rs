use criterion::{black_box, criterion_group, criterion_main, Criterion};
use skirmish_core::combat::{resolve_attack, DamageType};
use skirmish_core::movement::legal_destinations;
use skirmish_core::{
    Attributes, Battle, BattleId, BattleSetup, EngineConfig, OwnerId, UnitCategory, UnitId,
    UnitSpawn, UnitTemplate,
};
use skirmish_grid::Cell;

fn brute() -> UnitTemplate {
    UnitTemplate::new("brute", UnitCategory::Champion, Attributes {
        combat: 4,
        speed: 6,
        focus: 2,
        resistance: 3,
        will: 2,
        vitality: 200,
    })
}

fn arena(width: u32, height: u32) -> Battle {
    let setup = BattleSetup {
        id: BattleId::new(1),
        width,
        height,
        seed: 9,
        initiator: OwnerId::new(1),
        spawns: vec![
            UnitSpawn {
                id: UnitId::new(1),
                owner: OwnerId::new(1),
                template: brute(),
                position: Cell::new(5, 5),
            },
            UnitSpawn {
                id: UnitId::new(2),
                owner: OwnerId::new(2),
                template: brute(),
                position: Cell::new(6, 5),
            },
        ],
        obstacles: Vec::new(),
    };
    Battle::from_setup(setup, &EngineConfig::default()).expect("bench setup is valid")
}

fn bench_resolve_attack(c: &mut Criterion) {
    let base = arena(16, 16);
    let mut rng = base.seeded_rng();

    c.bench_function("resolve_attack", |b| {
        b.iter(|| {
            let mut battle = base.clone();
            if let Some(unit) = battle.unit_mut(UnitId::new(1)) {
                unit.actions_left = 1;
            }
            black_box(resolve_attack(
                &mut battle,
                UnitId::new(1),
                UnitId::new(2),
                DamageType::Physical,
                &mut rng,
            ))
        })
    });
}

fn bench_legal_destinations(c: &mut Criterion) {
    let mut battle = arena(32, 32);
    if let Some(unit) = battle.unit_mut(UnitId::new(1)) {
        unit.moves_left = 8;
    }

    c.bench_function("legal_destinations_32x32", |b| {
        b.iter(|| black_box(legal_destinations(&battle, black_box(UnitId::new(1)))))
    });
}

criterion_group!(benches, bench_resolve_attack, bench_legal_destinations);
criterion_main!(benches);
