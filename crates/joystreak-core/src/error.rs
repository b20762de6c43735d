//! Error taxonomy for the progression engine.
//!
//! Fatal configuration problems are separated from recoverable per-event
//! conditions. Everything user-facing (`AlreadyClaimed`, `GateNotMet`,
//! `AlreadySelected`) is an expected outcome the collaborator reports
//! verbatim, not a bug. All domain checks run before any write, so a
//! rejected operation never leaves partial state.

use joystreak_types::{CharacterClass, EpochDay};

use crate::store::StoreError;

/// Errors produced by the progression engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Invalid configuration (unknown time zone, malformed reward
    /// tables). Fatal at startup; never produced per event.
    #[error("invalid configuration: {reason}")]
    Configuration {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },

    /// An event arrived for a day earlier than one already processed
    /// for this user. The event is dropped without mutation.
    #[error("stale event: {event_day} is before last processed {last_action_day}")]
    StaleEvent {
        /// Day of the rejected event.
        event_day: EpochDay,
        /// Most recent day already processed for the user.
        last_action_day: EpochDay,
    },

    /// The bounded optimistic-concurrency retry budget was exhausted.
    /// The caller should ask the actor to retry the originating action.
    #[error("transaction failed after {attempts} attempts, try again")]
    ConcurrencyExhausted {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// Daily coins were already claimed today.
    #[error("coins already claimed on {claim_day}")]
    AlreadyClaimed {
        /// The day the existing claim was recorded.
        claim_day: EpochDay,
    },

    /// Class selection attempted below the unlock level.
    #[error("class selection requires level {required}, currently level {level}")]
    GateNotMet {
        /// The user's current level.
        level: u32,
        /// The configured unlock level.
        required: u32,
    },

    /// Class selection attempted when a class is already set.
    #[error("class already selected: {class}")]
    AlreadySelected {
        /// The previously selected class.
        class: CharacterClass,
    },

    /// The store was unavailable and bounded retries did not recover.
    #[error("progression store unavailable: {reason}")]
    StoreUnavailable {
        /// Description of the underlying failure.
        reason: String,
    },
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable { reason } => Self::StoreUnavailable { reason },
        }
    }
}
