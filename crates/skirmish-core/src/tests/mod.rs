//! Cross-module tests for the rules engine.
//!
//! - `scenarios.rs`: the worked examples for movement, combat and turn flow
//! - `properties.rs`: proptest properties over the core arithmetic
//! - `determinism.rs`: same seed and intents, same battle
//! - `helpers.rs`: factories for units and battles

mod determinism;
pub(crate) mod helpers;
