//! Loaded battles, one lock each.
//!
//! Every battle lives in a [`BattleEntry`]: the battle and its RNG behind a
//! single mutex, a broadcast channel for its events, and the handle of its
//! countdown task. Player intents and timer ticks take the same mutex, so
//! they never interleave. The lock is never held across an `.await`.
//!
//! Starting, stopping and discarding all happen under that mutex. Each start
//! or stop bumps the slot's countdown generation; a tick from an older
//! generation, or on a discarded battle, exits without touching anything.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand_chacha::ChaCha8Rng;
use skirmish_core::{Battle, BattleEvent, BattleId, OwnerId};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::trace;

/// The mutable part of a loaded battle.
#[derive(Debug)]
pub struct BattleSlot {
    /// The battle.
    pub battle: Battle,
    /// Random stream for dodge rolls.
    pub rng: ChaCha8Rng,
    /// Sides with at least one live connection.
    pub reachable: BTreeSet<OwnerId>,
    /// Set once by discard; every later call treats the battle as gone.
    pub discarded: bool,
    countdown: u64,
}

impl BattleSlot {
    /// The current countdown generation.
    #[must_use]
    pub fn countdown(&self) -> u64 {
        self.countdown
    }

    /// Starts a new countdown generation and returns it.
    pub(crate) fn next_countdown(&mut self) -> u64 {
        self.countdown += 1;
        self.countdown
    }

    /// Returns true if a countdown of `generation` may still tick.
    #[must_use]
    pub fn countdown_is_current(&self, generation: u64) -> bool {
        !self.discarded && self.countdown == generation
    }
}

/// One loaded battle.
#[derive(Debug)]
pub struct BattleEntry {
    /// Battle id.
    pub id: BattleId,
    /// Battle state; the single-writer lock.
    pub slot: Mutex<BattleSlot>,
    events: broadcast::Sender<BattleEvent>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl BattleEntry {
    /// Wraps a battle. The countdown is not running yet.
    #[must_use]
    pub fn new(battle: Battle, rng: ChaCha8Rng, reachable: BTreeSet<OwnerId>, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            id: battle.id,
            slot: Mutex::new(BattleSlot {
                battle,
                rng,
                reachable,
                discarded: false,
                countdown: 0,
            }),
            events,
            timer: Mutex::new(None),
        }
    }

    /// A new receiver for this battle's events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BattleEvent> {
        self.events.subscribe()
    }

    /// Sends events to every subscriber. Having none is fine.
    pub fn publish(&self, events: impl IntoIterator<Item = BattleEvent>) {
        for event in events {
            trace!(battle = %self.id, event = event.name(), "publish");
            let _ = self.events.send(event);
        }
    }

    /// Installs a countdown task, aborting any previous one first.
    pub fn replace_timer(&self, task: JoinHandle<()>) {
        if let Some(old) = self.timer.lock().replace(task) {
            old.abort();
        }
    }

    /// Stops the countdown. `slot` must be this entry's locked slot, so a
    /// tick already waiting on the lock sees the new generation and exits.
    /// A no-op on the task if none is running.
    pub fn stop_timer(&self, slot: &mut BattleSlot) {
        slot.next_countdown();
        if let Some(task) = self.timer.lock().take() {
            task.abort();
        }
    }

    /// Forgets the countdown handle without aborting it. Used by the task
    /// itself when it finishes, under the slot lock.
    pub(crate) fn release_timer(&self) {
        self.timer.lock().take();
    }

    /// Returns true while a countdown task is installed.
    #[must_use]
    pub fn timer_running(&self) -> bool {
        self.timer
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

/// Every loaded battle, by id.
#[derive(Debug, Default)]
pub struct Registry {
    battles: RwLock<BTreeMap<BattleId, Arc<BattleEntry>>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. Returns false (and keeps the old one) if the id is taken.
    pub fn insert(&self, entry: Arc<BattleEntry>) -> bool {
        let mut battles = self.battles.write();
        if battles.contains_key(&entry.id) {
            return false;
        }
        battles.insert(entry.id, entry);
        true
    }

    /// Looks up an entry.
    #[must_use]
    pub fn get(&self, id: BattleId) -> Option<Arc<BattleEntry>> {
        self.battles.read().get(&id).cloned()
    }

    /// Removes an entry.
    pub fn remove(&self, id: BattleId) -> Option<Arc<BattleEntry>> {
        self.battles.write().remove(&id)
    }

    /// Loaded battle ids, in order.
    #[must_use]
    pub fn ids(&self) -> Vec<BattleId> {
        self.battles.read().keys().copied().collect()
    }

    /// Number of loaded battles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.battles.read().len()
    }

    /// Returns true if nothing is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.battles.read().is_empty()
    }
}
