//! Runs an AI-versus-AI skirmish on the battle host and logs the result.
//!
//! ```text
//! skirmish-host [config.toml]
//! ```
//!
//! Without a config file the host runs on defaults and keeps snapshots in
//! memory.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use skirmish_core::{
    Attributes, BattleId, BattleSetup, BattleStatus, OwnerId, UnitCategory, UnitId, UnitSpawn,
    UnitTemplate,
};
use skirmish_grid::{Cell, Obstacle, ObstacleId};
use skirmish_host::{telemetry, AiDriver, AiTurn, BattleService, HostConfig, JsonDirStore, MemoryStore, SnapshotStore};
use tracing::{info, warn};

const MAX_TURNS: u32 = 400;

fn templates() -> [UnitTemplate; 3] {
    [
        UnitTemplate::new("skirmisher", UnitCategory::Minion, Attributes {
            combat: 3,
            speed: 5,
            focus: 1,
            resistance: 1,
            will: 1,
            vitality: 1,
        }),
        UnitTemplate::new("spearman", UnitCategory::Soldier, Attributes {
            combat: 4,
            speed: 3,
            focus: 2,
            resistance: 2,
            will: 1,
            vitality: 2,
        }),
        UnitTemplate::new("warden", UnitCategory::Champion, Attributes {
            combat: 5,
            speed: 2,
            focus: 3,
            resistance: 3,
            will: 2,
            vitality: 3,
        }),
    ]
}

fn demo_setup(seed: u64) -> BattleSetup {
    let red = OwnerId::new(1);
    let blue = OwnerId::new(2);
    let mut spawns = Vec::new();
    for (template, (row, id)) in templates().into_iter().zip([(1, 1), (5, 2), (9, 3)]) {
        spawns.push(UnitSpawn {
            id: UnitId::new(id),
            owner: red,
            template: template.clone(),
            position: Cell::new(0, row),
        });
        spawns.push(UnitSpawn {
            id: UnitId::new(id + 10),
            owner: blue,
            template,
            position: Cell::new(11, row),
        });
    }
    BattleSetup {
        id: BattleId::new(seed),
        width: 12,
        height: 12,
        seed,
        initiator: red,
        spawns,
        obstacles: vec![
            Obstacle::new(ObstacleId::new(1), Cell::new(5, 5), 6),
            Obstacle::new(ObstacleId::new(2), Cell::new(6, 6), 6),
        ],
    }
}

fn log_turn(owner: OwnerId, turn: &AiTurn) {
    if turn.faults > 0 {
        warn!(%owner, faults = turn.faults, "policy faults this turn");
    }
    info!(
        %owner,
        unit = ?turn.unit,
        accepted = turn.accepted,
        rejected = ?turn.rejected,
        "turn played"
    );
}

fn load_config() -> Result<HostConfig> {
    match std::env::args().nth(1) {
        Some(path) => HostConfig::load(&path).with_context(|| format!("loading {path}")),
        None => Ok(HostConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init("info");
    let config = load_config()?;

    let store: Arc<dyn SnapshotStore> = match &config.snapshot_dir {
        Some(dir) => Arc::new(JsonDirStore::new(dir)),
        None => Arc::new(MemoryStore::new()),
    };
    let driver = AiDriver::with_default_policy(config.ai);
    let service = BattleService::new(config, store);

    let resumed = service.rehydrate().await.context("rehydrating snapshots")?;
    for &id in &resumed {
        for owner in service.snapshot(id)?.action_order {
            service.set_reachable(id, owner, true)?;
        }
    }

    let battle = match resumed.first() {
        Some(&id) => id,
        None => {
            let setup = demo_setup(7);
            let id = setup.id;
            service.create(setup).context("creating demo battle")?;
            id
        }
    };
    info!(%battle, "battle running");

    for _ in 0..MAX_TURNS {
        let state = service.snapshot(battle)?;
        if state.status == BattleStatus::Ended {
            break;
        }
        let Some(owner) = state.current_owner() else {
            bail!("battle {battle} is active without a side to play");
        };
        let turn = driver
            .play_turn(&service, battle, owner)
            .await
            .with_context(|| format!("AI turn for {owner}"))?;
        log_turn(owner, &turn);
    }

    let state = service.snapshot(battle)?;
    match state.outcome {
        Some(outcome) => info!(?outcome, round = state.round, "battle over"),
        None => warn!(round = state.round, "turn limit reached without a result"),
    }
    service.discard(battle)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::Rejection;

    #[test]
    fn turns_with_rejections_and_faults_log() {
        telemetry::init("debug");
        let turn = AiTurn {
            unit: Some(UnitId::new(3)),
            accepted: 1,
            rejected: Some(Rejection::UnitNotFound(UnitId::new(9))),
            faults: 2,
            events: Vec::new(),
        };
        log_turn(OwnerId::new(1), &turn);
        log_turn(OwnerId::new(2), &AiTurn::default());
    }

    #[test]
    fn demo_setup_builds_a_battle() {
        let setup = demo_setup(3);
        assert_eq!(setup.id, BattleId::new(3));
        assert!(skirmish_core::Battle::from_setup(setup, &HostConfig::default().engine).is_ok());
    }
}
