//! # Skirmish Core
//!
//! Rules engine for turn-based grid-tactics battles.
//!
//! The engine owns whose turn it is, what a unit may legally do, and how an
//! accepted action changes the battle. It has no clock and no I/O: the host
//! calls [`Orchestrator::tick`] once a second and hands every player intent to
//! [`Orchestrator::handle`].
//!
//! ## Components
//!
//! Leaves first; each layer only calls the ones above it in this list.
//!
//! - **Condition ledger** ([`condition`]): per-unit status effects. Every
//!   action is bracketed by a `scan` before and an `apply_expiry` after.
//! - **Movement** ([`movement`]): cost with engagement friction, L-route
//!   path checks, legal destinations.
//! - **Combat** ([`combat`]): dodge, typed damage against dual protection
//!   pools, maneuvers, strikes against corpses and obstacles.
//! - **Orchestrator** ([`orchestrator`]): nominations, the single
//!   `advance_turn`, rounds, victory, the countdown.
//!
//! ## Usage
//!
//! ```
//! use skirmish_core::{
//!     Attributes, Battle, BattleId, BattleSetup, EngineConfig, Intent, Orchestrator, OwnerId,
//!     UnitCategory, UnitId, UnitSpawn, UnitTemplate,
//! };
//! use skirmish_grid::Cell;
//!
//! let grunt = UnitTemplate::new("grunt", UnitCategory::Soldier, Attributes {
//!     combat: 3,
//!     speed: 3,
//!     ..Attributes::default()
//! });
//! let setup = BattleSetup {
//!     id: BattleId::new(1),
//!     width: 8,
//!     height: 8,
//!     seed: 42,
//!     initiator: OwnerId::new(1),
//!     spawns: vec![
//!         UnitSpawn { id: UnitId::new(1), owner: OwnerId::new(1), template: grunt.clone(), position: Cell::new(0, 0) },
//!         UnitSpawn { id: UnitId::new(2), owner: OwnerId::new(2), template: grunt, position: Cell::new(7, 7) },
//!     ],
//!     obstacles: Vec::new(),
//! };
//!
//! let orchestrator = Orchestrator::new(EngineConfig::default());
//! let mut battle = Battle::from_setup(setup, orchestrator.config()).unwrap();
//! let mut rng = battle.seeded_rng();
//! orchestrator.start(&mut battle);
//!
//! let owner = battle.current_owner().unwrap();
//! orchestrator.handle(&mut battle, owner, Intent::Nominate { unit: UnitId::new(1) }, &mut rng).unwrap();
//! orchestrator.handle(&mut battle, owner, Intent::Move { to: Cell::new(2, 1) }, &mut rng).unwrap();
//! orchestrator.handle(&mut battle, owner, Intent::EndTurn, &mut rng).unwrap();
//!
//! assert_eq!(battle.current_owner(), Some(OwnerId::new(2)));
//! ```
//!
//! ## Determinism
//!
//! Units live in a `BTreeMap` and every random roll comes from the caller's
//! RNG, so the same seed and the same intents replay to the same battle.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod battle;
pub mod combat;
pub mod condition;
pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod movement;
pub mod orchestrator;
pub mod unit;
pub mod view;

#[cfg(test)]
mod tests;

pub use battle::{Battle, BattleOutcome, BattleSetup, BattleStatus, EndReason, UnitSpawn};
pub use combat::{AttackReport, DamageType, ManeuverKind, ManeuverReport, StrikeReport};
pub use condition::{ActionKind, Condition, ConditionLedger, Modifiers, Scan};
pub use config::{ConfigError, EngineConfig, MarkCaps};
pub use error::{Rejection, SetupError};
pub use event::BattleEvent;
pub use ids::{BattleId, OwnerId, UnitId};
pub use orchestrator::{AttackTarget, Intent, Orchestrator};
pub use unit::{Attributes, CombatUnit, UnitCategory, UnitFlags, UnitSnapshot, UnitTemplate};
pub use view::BattleView;
