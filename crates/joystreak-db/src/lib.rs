//! `PostgreSQL` persistence for the Joystreak progression engine.
//!
//! The engine's storage contract
//! ([`joystreak_core::store::ProgressionStore`]) is compare-and-swap
//! over one record per (guild, user). This crate implements it against
//! a single `user_progression` table where a `version` column guards
//! every write, plus the read-only leaderboard query the platform
//! collaborator renders from.
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`progression_store`] -- The store implementation and row mapping
//! - [`error`] -- Shared error types

pub mod error;
pub mod postgres;
pub mod progression_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};
pub use progression_store::{LeaderboardSort, PgProgressionStore};
