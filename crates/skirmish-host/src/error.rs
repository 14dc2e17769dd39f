//! Host errors.

use std::path::PathBuf;

use skirmish_core::{BattleId, Rejection, SetupError};
use thiserror::Error;

/// Snapshot store failures. Logged by the writer, never surfaced to players.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("snapshot i/o at {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A snapshot could not be encoded or decoded.
    #[error("snapshot encoding: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of a [`crate::BattleService`] call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No battle with this id is loaded.
    #[error("battle {0} is not loaded")]
    UnknownBattle(BattleId),
    /// A battle with this id is already loaded.
    #[error("battle {0} already exists")]
    DuplicateBattle(BattleId),
    /// The setup was invalid.
    #[error(transparent)]
    Setup(#[from] SetupError),
    /// The intent broke a rule; the battle is unchanged.
    #[error("rejected: {0}")]
    Rejected(#[from] Rejection),
    /// Rehydration could not read the store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// The rule rejection, if that is what this is.
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(r) => Some(r),
            _ => None,
        }
    }
}
