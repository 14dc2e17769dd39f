//! The per-battle countdown task.
//!
//! One task per battle calls [`Orchestrator::tick`] once per period under the
//! battle's lock and publishes what it returns. Each task carries the
//! countdown generation it was started with; once the slot has moved on
//! (restart, stop, discard) the task exits at its next tick without touching
//! the battle. When the battle ends the task releases its own handle, then
//! exits.

use std::sync::Arc;
use std::time::Duration;

use skirmish_core::{BattleEvent, Orchestrator};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::persistence::SnapshotWriter;
use crate::registry::{BattleEntry, BattleSlot};

/// Spawns the countdown for `entry` as `generation`. The first tick lands one
/// period from now.
pub fn spawn_countdown(
    entry: Arc<BattleEntry>,
    orchestrator: Arc<Orchestrator>,
    period: Duration,
    writer: SnapshotWriter,
    generation: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let (events, ended) = {
                let mut slot = entry.slot.lock();
                if !slot.countdown_is_current(generation) {
                    debug!(battle = %entry.id, generation, "stale countdown exits");
                    break;
                }
                let events = orchestrator.tick(&mut slot.battle);
                let turned = events.iter().any(|e| {
                    matches!(
                        e,
                        BattleEvent::TurnAdvanced { .. } | BattleEvent::BattleEnded { .. }
                    )
                });
                if turned {
                    writer.save(slot.battle.clone());
                }
                let ended = !slot.battle.is_active();
                if ended {
                    entry.release_timer();
                }
                (events, ended)
            };
            entry.publish(events);
            if ended {
                debug!(battle = %entry.id, "countdown finished");
                break;
            }
        }
    })
}

/// Restarts the countdown for `entry`, replacing any running one. `slot` must
/// be the entry's locked slot.
pub fn restart(
    entry: &Arc<BattleEntry>,
    slot: &mut BattleSlot,
    orchestrator: &Arc<Orchestrator>,
    period: Duration,
    writer: &SnapshotWriter,
) {
    let generation = slot.next_countdown();
    let task = spawn_countdown(
        Arc::clone(entry),
        Arc::clone(orchestrator),
        period,
        writer.clone(),
        generation,
    );
    entry.replace_timer(task);
    debug!(battle = %entry.id, generation, "countdown started");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use skirmish_core::{
        Attributes, Battle, BattleId, BattleSetup, EngineConfig, OwnerId, UnitCategory, UnitId,
        UnitSpawn, UnitTemplate,
    };
    use skirmish_grid::Cell;
    use tokio::time::sleep;

    use crate::persistence::{MemoryStore, SnapshotStore};

    const PERIOD: Duration = Duration::from_secs(1);

    fn entry() -> Arc<BattleEntry> {
        let t = UnitTemplate::new("scout", UnitCategory::Minion, Attributes {
            speed: 2,
            vitality: 1,
            ..Attributes::default()
        });
        let setup = BattleSetup {
            id: BattleId::new(1),
            width: 4,
            height: 4,
            seed: 1,
            initiator: OwnerId::new(1),
            spawns: vec![
                UnitSpawn { id: UnitId::new(1), owner: OwnerId::new(1), template: t.clone(), position: Cell::new(0, 0) },
                UnitSpawn { id: UnitId::new(2), owner: OwnerId::new(2), template: t, position: Cell::new(3, 3) },
            ],
            obstacles: Vec::new(),
        };
        let mut battle = Battle::from_setup(setup, &EngineConfig::default()).unwrap();
        Orchestrator::new(EngineConfig::default()).start(&mut battle);
        let rng = battle.seeded_rng();
        Arc::new(BattleEntry::new(battle, rng, BTreeSet::new(), 8))
    }

    fn parts() -> (Arc<Orchestrator>, SnapshotWriter, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn SnapshotStore> = store.clone();
        let (writer, _) = SnapshotWriter::spawn(dyn_store);
        (Arc::new(Orchestrator::new(EngineConfig::default())), writer, store)
    }

    #[tokio::test(start_paused = true)]
    async fn current_countdown_ticks() {
        let entry = entry();
        let (orch, writer, _) = parts();
        restart(&entry, &mut entry.slot.lock(), &orch, PERIOD, &writer);

        sleep(PERIOD * 2 + PERIOD / 2).await;
        assert_eq!(entry.slot.lock().battle.turn_timer, 28);
        assert!(entry.timer_running());
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_generation_never_ticks() {
        let entry = entry();
        let (orch, writer, _) = parts();
        let stale = entry.slot.lock().countdown();
        // Started with a generation the slot has already left behind.
        entry.slot.lock().next_countdown();
        let task = spawn_countdown(Arc::clone(&entry), orch, PERIOD, writer, stale);

        sleep(PERIOD * 3).await;
        assert!(task.is_finished());
        assert_eq!(entry.slot.lock().battle.turn_timer, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn discarded_battle_is_neither_ticked_nor_saved() {
        let entry = entry();
        let (orch, writer, store) = parts();
        let task = {
            let mut slot = entry.slot.lock();
            let generation = slot.next_countdown();
            slot.battle.turn_timer = 1;
            let task = spawn_countdown(Arc::clone(&entry), orch, PERIOD, writer, generation);
            slot.discarded = true;
            task
        };

        sleep(PERIOD * 3).await;
        assert!(task.is_finished());
        let slot = entry.slot.lock();
        assert_eq!(slot.battle.turn_timer, 1);
        assert_eq!(slot.battle.current_turn_index, 0);
        assert!(store.is_empty());
    }
}
