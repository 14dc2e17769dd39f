//! Battle snapshots.
//!
//! Snapshots are written through after each accepted mutation and read back
//! once at start-up. Writes go through a [`SnapshotWriter`]: a channel into
//! one background task that applies them in order. Sending never waits, and
//! a failed write is logged and dropped. In-memory state is the source of
//! truth; the store only has to catch up eventually.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use skirmish_core::{Battle, BattleId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::StoreError;

/// Durable home for battle snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync + 'static {
    /// Writes (or overwrites) one battle.
    async fn save(&self, battle: &Battle) -> Result<(), StoreError>;

    /// Drops one battle.
    async fn remove(&self, id: BattleId) -> Result<(), StoreError>;

    /// Every stored battle, in id order.
    async fn load_all(&self) -> Result<Vec<Battle>, StoreError>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// Keeps snapshots in a map. Used in tests and when no directory is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    battles: Mutex<BTreeMap<BattleId, Battle>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored battles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.battles.lock().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.battles.lock().is_empty()
    }

    /// A copy of one stored battle.
    #[must_use]
    pub fn get(&self, id: BattleId) -> Option<Battle> {
        self.battles.lock().get(&id).cloned()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn save(&self, battle: &Battle) -> Result<(), StoreError> {
        self.battles.lock().insert(battle.id, battle.clone());
        Ok(())
    }

    async fn remove(&self, id: BattleId) -> Result<(), StoreError> {
        self.battles.lock().remove(&id);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Battle>, StoreError> {
        Ok(self.battles.lock().values().cloned().collect())
    }
}

// ============================================================================
// JSON directory store
// ============================================================================

/// One `battle-<id>.json` file per battle in a directory.
///
/// Files are written to a temporary name and renamed into place, so a crash
/// mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Uses `dir`, creating it on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory in use.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: BattleId) -> PathBuf {
        self.dir.join(format!("battle-{}.json", id.as_u64()))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl SnapshotStore for JsonDirStore {
    async fn save(&self, battle: &Battle) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(io_error(&self.dir))?;
        let path = self.path_for(battle.id);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(battle)?;
        tokio::fs::write(&tmp, bytes).await.map_err(io_error(&tmp))?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_error(&path))?;
        Ok(())
    }

    async fn remove(&self, id: BattleId) -> Result<(), StoreError> {
        let path = self.path_for(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    async fn load_all(&self) -> Result<Vec<Battle>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.dir)(e)),
        };
        let mut battles = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error(&self.dir))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await.map_err(io_error(&path))?;
            battles.push(serde_json::from_slice::<Battle>(&bytes)?);
        }
        battles.sort_by_key(|b| b.id);
        Ok(battles)
    }
}

// ============================================================================
// Background writer
// ============================================================================

enum Write {
    Save(Box<Battle>),
    Remove(BattleId),
}

/// Non-blocking handle to the snapshot writer task.
#[derive(Clone)]
pub struct SnapshotWriter {
    tx: mpsc::UnboundedSender<Write>,
    store: Arc<dyn SnapshotStore>,
}

impl std::fmt::Debug for SnapshotWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotWriter")
            .field("closed", &self.tx.is_closed())
            .finish_non_exhaustive()
    }
}

impl SnapshotWriter {
    /// Spawns the writer task on the current runtime.
    ///
    /// The task exits once every handle is dropped.
    pub fn spawn(store: Arc<dyn SnapshotStore>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Write>();
        let sink = Arc::clone(&store);
        let task = tokio::spawn(async move {
            while let Some(write) = rx.recv().await {
                let result = match &write {
                    Write::Save(battle) => sink.save(battle).await,
                    Write::Remove(id) => sink.remove(*id).await,
                };
                match (result, write) {
                    (Ok(()), Write::Save(battle)) => {
                        debug!(battle = %battle.id, round = battle.round, "snapshot saved");
                    }
                    (Ok(()), Write::Remove(id)) => debug!(battle = %id, "snapshot removed"),
                    (Err(error), Write::Save(battle)) => {
                        warn!(battle = %battle.id, %error, "snapshot save failed");
                    }
                    (Err(error), Write::Remove(id)) => {
                        warn!(battle = %id, %error, "snapshot remove failed");
                    }
                }
            }
        });
        (Self { tx, store }, task)
    }

    /// Queues a snapshot of `battle`.
    pub fn save(&self, battle: Battle) {
        if self.tx.send(Write::Save(Box::new(battle))).is_err() {
            warn!("snapshot writer is gone; dropping snapshot");
        }
    }

    /// Queues removal of a battle's snapshot.
    pub fn remove(&self, id: BattleId) {
        if self.tx.send(Write::Remove(id)).is_err() {
            warn!(battle = %id, "snapshot writer is gone; dropping removal");
        }
    }

    /// Reads every stored battle, bypassing the queue.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn load_all(&self) -> Result<Vec<Battle>, StoreError> {
        self.store.load_all().await
    }
}
