//! Shared type definitions for the Joystreak progression engine.
//!
//! This crate is the single source of truth for the types that cross the
//! boundaries of the workspace: the platform collaborator hands in events
//! built from these types, the engine hands back outcome structs, and the
//! store persists the [`UserProgression`] record.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for guild and user identifiers
//! - [`epoch`] -- The [`EpochDay`] calendar-day unit used for all
//!   day-boundary logic
//! - [`enums`] -- Character classes and channel classifications
//! - [`progression`] -- The per-user [`UserProgression`] record
//! - [`outcomes`] -- Plain-data results returned to the collaborator

pub mod enums;
pub mod epoch;
pub mod ids;
pub mod outcomes;
pub mod progression;

// Re-export all public types at crate root for convenience.
pub use enums::{ChannelKind, CharacterClass};
pub use epoch::EpochDay;
pub use ids::{GuildId, UserId};
pub use outcomes::{
    ClaimOutcome, ClassOutcome, GrantOutcome, ResetReport, RewardOutcome, UserResetOutcome,
};
pub use progression::UserProgression;
