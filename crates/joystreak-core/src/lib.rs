//! Daily progression and leveling engine.
//!
//! The engine converts qualifying daily actions into experience points,
//! consecutive-day streaks, levels, hit points, coins, and a one-time
//! class unlock -- all through a single optimistic-concurrency
//! transaction path against a pluggable [`store::ProgressionStore`].
//!
//! The surrounding chat-platform integration (event dispatch, command
//! parsing, message formatting) is an external collaborator: it feeds
//! normalized events in and renders the plain-data outcomes this crate
//! returns. No formatted text is produced here.
//!
//! # Modules
//!
//! - [`clock`] -- Time-zone-aware resolution of timestamps to epoch days
//! - [`config`] -- Typed configuration with YAML loading and validation
//! - [`policy`] -- Pure reward/penalty/streak decision rules
//! - [`leveling`] -- XP-to-level curve and HP derivation
//! - [`store`] -- The persistence contract plus an in-memory store
//! - [`engine`] -- The transactional orchestrator tying it all together
//! - [`error`] -- The engine error taxonomy

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod leveling;
pub mod policy;
pub mod store;

// Re-export primary types for convenience.
pub use clock::EpochResolver;
pub use config::ProgressionConfig;
pub use engine::ProgressionEngine;
pub use error::EngineError;
pub use leveling::LevelCurve;
pub use policy::RewardDecision;
pub use store::{CasResult, CreateResult, MemoryStore, ProgressionStore, StoreError};
