//! # Skirmish Host
//!
//! Runs [`skirmish_core`] battles as long-lived services.
//!
//! - [`BattleService`]: create, drive and discard battles; every call on a
//!   battle holds that battle's lock for its whole read-modify-write.
//! - A countdown task per battle ticks the turn timer once per period and
//!   stops when the battle ends, is discarded, or nobody is reachable.
//! - Snapshots go to a [`SnapshotStore`] through an ordered background
//!   writer and are rehydrated on restart.
//! - [`AiDriver`] plays a side's turn under a unit and wall-clock budget.
//!
//! ## Example
//!
//! ```no_run
//! use skirmish_host::{BattleService, HostConfig};
//!
//! # async fn run(setup: skirmish_core::BattleSetup) -> Result<(), skirmish_host::ServiceError> {
//! let service = BattleService::from_config(HostConfig::default());
//! let mut events = service.create(setup)?;
//! while let Ok(event) = events.recv().await {
//!     println!("{}", event.name());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod ai;
pub mod config;
pub mod error;
pub mod persistence;
pub mod registry;
pub mod service;
pub mod telemetry;
pub mod timer;

pub use ai::{AiDriver, AiTurn, ApproachAndStrike, Plan, Policy, PolicyError};
pub use config::{HostConfig, TurnBudget};
pub use error::{ServiceError, StoreError};
pub use persistence::{JsonDirStore, MemoryStore, SnapshotStore, SnapshotWriter};
pub use registry::{BattleEntry, BattleSlot, Registry};
pub use service::BattleService;
