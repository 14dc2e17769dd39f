//! The battle service: the host's single entry point.
//!
//! [`BattleService`] owns the registry, the orchestrator, and the snapshot
//! writer. Every call that touches a battle takes that battle's lock for the
//! whole read-modify-write, including starting or stopping its countdown and
//! queueing its snapshot, so those stay ordered with a concurrent discard.
//! Events are published after the lock is released.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::MutexGuard;
use skirmish_core::{
    Battle, BattleEvent, BattleId, BattleSetup, BattleView, Intent, Orchestrator, OwnerId, UnitId,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::HostConfig;
use crate::error::ServiceError;
use crate::persistence::{JsonDirStore, MemoryStore, SnapshotStore, SnapshotWriter};
use crate::registry::{BattleEntry, BattleSlot, Registry};
use crate::timer;

/// Hosts any number of battles.
#[derive(Debug)]
pub struct BattleService {
    config: HostConfig,
    orchestrator: Arc<Orchestrator>,
    registry: Registry,
    writer: SnapshotWriter,
}

fn turn_changed(events: &[BattleEvent]) -> bool {
    events
        .iter()
        .any(|e| matches!(e, BattleEvent::TurnAdvanced { .. }))
}

impl BattleService {
    /// Creates a service writing snapshots to `store`.
    ///
    /// Must be called inside a Tokio runtime: the snapshot writer is spawned
    /// here.
    #[must_use]
    pub fn new(config: HostConfig, store: Arc<dyn SnapshotStore>) -> Self {
        let (writer, _task) = SnapshotWriter::spawn(store);
        Self {
            orchestrator: Arc::new(Orchestrator::new(config.engine.clone())),
            config,
            registry: Registry::new(),
            writer,
        }
    }

    /// Creates a service with the store the configuration names: a JSON
    /// directory if `snapshot_dir` is set, memory otherwise.
    #[must_use]
    pub fn from_config(config: HostConfig) -> Self {
        let store: Arc<dyn SnapshotStore> = match &config.snapshot_dir {
            Some(dir) => Arc::new(JsonDirStore::new(dir)),
            None => Arc::new(MemoryStore::new()),
        };
        Self::new(config, store)
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Loaded battle ids.
    #[must_use]
    pub fn battles(&self) -> Vec<BattleId> {
        self.registry.ids()
    }

    fn entry(&self, id: BattleId) -> Result<Arc<BattleEntry>, ServiceError> {
        self.registry.get(id).ok_or(ServiceError::UnknownBattle(id))
    }

    /// Locks a battle that has not been discarded.
    fn lock<'a>(&self, entry: &'a BattleEntry) -> Result<MutexGuard<'a, BattleSlot>, ServiceError> {
        let slot = entry.slot.lock();
        if slot.discarded {
            return Err(ServiceError::UnknownBattle(entry.id));
        }
        Ok(slot)
    }

    fn start_timer(&self, entry: &Arc<BattleEntry>, slot: &mut BattleSlot) {
        timer::restart(
            entry,
            slot,
            &self.orchestrator,
            self.config.tick_period(),
            &self.writer,
        );
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Creates a battle from a lobby setup, arms its first turn and starts
    /// its countdown. Every side starts out reachable.
    ///
    /// The returned receiver sees every event from the first turn on.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Setup`] for an invalid setup,
    /// [`ServiceError::DuplicateBattle`] if the id is taken.
    pub fn create(&self, setup: BattleSetup) -> Result<broadcast::Receiver<BattleEvent>, ServiceError> {
        let mut battle = Battle::from_setup(setup, self.orchestrator.config())?;
        if self.registry.get(battle.id).is_some() {
            return Err(ServiceError::DuplicateBattle(battle.id));
        }
        let rng = battle.seeded_rng();
        let events = self.orchestrator.start(&mut battle);
        let reachable: BTreeSet<OwnerId> = battle.action_order.iter().copied().collect();
        let snapshot = battle.clone();
        let id = battle.id;

        let entry = Arc::new(BattleEntry::new(
            battle,
            rng,
            reachable,
            self.config.event_capacity,
        ));
        let receiver = entry.subscribe();
        if !self.registry.insert(Arc::clone(&entry)) {
            return Err(ServiceError::DuplicateBattle(id));
        }
        {
            let mut slot = self.lock(&entry)?;
            self.writer.save(snapshot);
            self.start_timer(&entry, &mut slot);
        }
        entry.publish(events);
        info!(battle = %id, "battle created");
        Ok(receiver)
    }

    /// Stops a battle's countdown and unloads it. Its snapshot is removed.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnknownBattle`] if it is not loaded.
    pub fn discard(&self, id: BattleId) -> Result<(), ServiceError> {
        let entry = self.entry(id)?;
        {
            let mut slot = self.lock(&entry)?;
            slot.discarded = true;
            entry.stop_timer(&mut slot);
            self.writer.remove(id);
        }
        self.registry.remove(id);
        info!(battle = %id, "battle discarded");
        Ok(())
    }

    /// Loads every active battle from the store. Battles already loaded are
    /// left alone. Rehydrated battles wait, timer stopped, until a side
    /// reports reachable.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Store`] if the store cannot be read.
    pub async fn rehydrate(&self) -> Result<Vec<BattleId>, ServiceError> {
        let mut loaded = Vec::new();
        for battle in self.writer.load_all().await? {
            if !battle.is_active() || self.registry.get(battle.id).is_some() {
                continue;
            }
            let id = battle.id;
            let rng = battle.seeded_rng();
            let entry = BattleEntry::new(battle, rng, BTreeSet::new(), self.config.event_capacity);
            if self.registry.insert(Arc::new(entry)) {
                loaded.push(id);
            }
        }
        info!(count = loaded.len(), "rehydrated battles");
        Ok(loaded)
    }

    /// Stops every countdown. Battles stay loaded.
    pub fn shutdown(&self) {
        for id in self.registry.ids() {
            if let Some(entry) = self.registry.get(id) {
                let mut slot = entry.slot.lock();
                entry.stop_timer(&mut slot);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Intents
    // ------------------------------------------------------------------------

    /// Applies one intent from `owner`.
    ///
    /// Returns the events it produced; subscribers receive the same events.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Rejected`] if the rules refuse it (the battle is
    /// unchanged), [`ServiceError::UnknownBattle`] if it is not loaded.
    pub fn submit(
        &self,
        id: BattleId,
        owner: OwnerId,
        intent: Intent,
    ) -> Result<Vec<BattleEvent>, ServiceError> {
        let entry = self.entry(id)?;
        let events = {
            let mut slot = self.lock(&entry)?;
            let BattleSlot {
                battle,
                rng,
                reachable,
                ..
            } = &mut *slot;
            let events = self.orchestrator.handle(battle, owner, intent, rng)?;
            let ended = !battle.is_active();
            let ticking = !reachable.is_empty();
            self.writer.save(battle.clone());
            if ended {
                entry.stop_timer(&mut slot);
            } else if ticking && turn_changed(&events) {
                // Full periods for the new turn.
                self.start_timer(&entry, &mut slot);
            }
            events
        };
        entry.publish(events.iter().cloned());
        Ok(events)
    }

    /// Returns true if it is `owner`'s turn in an active battle.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnknownBattle`] if it is not loaded.
    pub fn is_turn_of(&self, id: BattleId, owner: OwnerId) -> Result<bool, ServiceError> {
        let entry = self.entry(id)?;
        let slot = self.lock(&entry)?;
        Ok(slot.battle.is_active() && slot.battle.current_owner() == Some(owner))
    }

    // ------------------------------------------------------------------------
    // Timer control
    // ------------------------------------------------------------------------

    /// Records whether any connection of `owner` is live.
    ///
    /// When the last side becomes unreachable the countdown stops. When
    /// the first side comes back it restarts and a
    /// [`BattleEvent::StateResync`] is published.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnknownBattle`] if it is not loaded.
    pub fn set_reachable(&self, id: BattleId, owner: OwnerId, reachable: bool) -> Result<(), ServiceError> {
        let entry = self.entry(id)?;
        let resync = {
            let mut slot = self.lock(&entry)?;
            let was = !slot.reachable.is_empty();
            if reachable {
                slot.reachable.insert(owner);
            } else {
                slot.reachable.remove(&owner);
            }
            let now = !slot.reachable.is_empty();
            if was && !now {
                entry.stop_timer(&mut slot);
                info!(battle = %id, "nobody reachable; countdown stopped");
            }
            let battle = &slot.battle;
            let resync = (battle.is_active() && !was && now).then(|| BattleEvent::StateResync {
                round: battle.round,
                owner: battle.current_owner(),
                seconds: battle.turn_timer,
                units: battle.units.values().map(|u| u.snapshot()).collect(),
            });
            if resync.is_some() {
                self.start_timer(&entry, &mut slot);
                info!(battle = %id, %owner, "side reachable again; countdown resumed");
            }
            resync
        };
        entry.publish(resync);
        Ok(())
    }

    /// Sets the external pause flag. The countdown keeps running but holds
    /// its value; on resume it restarts so the next second is a full period.
    /// Returns true if the flag changed.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnknownBattle`] if it is not loaded.
    pub fn set_paused(&self, id: BattleId, paused: bool) -> Result<bool, ServiceError> {
        let entry = self.entry(id)?;
        let mut slot = self.lock(&entry)?;
        let changed = self.orchestrator.set_paused(&mut slot.battle, paused);
        if changed && !paused && slot.battle.is_active() && !slot.reachable.is_empty() {
            self.start_timer(&entry, &mut slot);
        }
        Ok(changed)
    }

    /// Returns true while `id` has a running countdown.
    #[must_use]
    pub fn timer_running(&self, id: BattleId) -> bool {
        self.registry.get(id).is_some_and(|e| e.timer_running())
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// A new receiver for a battle's events.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnknownBattle`] if it is not loaded.
    pub fn subscribe(&self, id: BattleId) -> Result<broadcast::Receiver<BattleEvent>, ServiceError> {
        Ok(self.entry(id)?.subscribe())
    }

    /// A copy of the battle.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnknownBattle`] if it is not loaded.
    pub fn snapshot(&self, id: BattleId) -> Result<Battle, ServiceError> {
        Ok(self.entry(id)?.slot.lock().battle.clone())
    }

    /// The vision-filtered view for one unit.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnknownBattle`] if it is not loaded.
    pub fn view(&self, id: BattleId, unit: UnitId) -> Result<Option<BattleView>, ServiceError> {
        let entry = self.entry(id)?;
        let slot = entry.slot.lock();
        Ok(BattleView::for_unit(&slot.battle, unit))
    }

    /// Views for up to `limit` units of `owner` that could be nominated now,
    /// each built as if that unit had just received its movement.
    ///
    /// Empty when it is not `owner`'s turn.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnknownBattle`] if it is not loaded.
    pub fn candidate_views(
        &self,
        id: BattleId,
        owner: OwnerId,
        limit: usize,
    ) -> Result<Vec<BattleView>, ServiceError> {
        let entry = self.entry(id)?;
        let mut scratch = {
            let slot = entry.slot.lock();
            if !slot.battle.is_active()
                || slot.battle.current_owner() != Some(owner)
                || slot.battle.active_unit.is_some()
            {
                return Ok(Vec::new());
            }
            slot.battle.clone()
        };

        let competitive = self.orchestrator.config().competitive;
        let candidates: Vec<UnitId> = scratch
            .living_units()
            .filter(|u| u.owner == owner && (competitive || !u.is_exhausted()))
            .map(|u| u.id)
            .take(limit)
            .collect();

        let mut views = Vec::with_capacity(candidates.len());
        for unit in candidates {
            let Some(u) = scratch.unit_mut(unit) else {
                warn!(battle = %id, %unit, "candidate vanished");
                continue;
            };
            u.moves_left = u.attributes.speed;
            views.extend(BattleView::for_unit(&scratch, unit));
            if let Some(u) = scratch.unit_mut(unit) {
                u.moves_left = 0;
            }
        }
        Ok(views)
    }
}

impl Drop for BattleService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
