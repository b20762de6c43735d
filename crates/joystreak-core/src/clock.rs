//! Time-zone-aware resolution of timestamps to epoch days.
//!
//! All day-boundary logic in the engine operates on [`EpochDay`], never
//! on raw timestamps. The resolver is the single place a time zone is
//! consulted, and it is pure: the timestamp is always injected by the
//! caller, never read from a process clock.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use joystreak_types::EpochDay;

use crate::error::EngineError;

/// Resolves UTC timestamps to local calendar days under a fixed zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochResolver {
    zone: Tz,
}

impl EpochResolver {
    /// Create a resolver for an IANA time zone identifier.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if the identifier is not
    /// a known zone. This is a fatal startup error, not a per-event
    /// condition.
    pub fn new(zone: &str) -> Result<Self, EngineError> {
        let zone = zone.parse::<Tz>().map_err(|_err| EngineError::Configuration {
            reason: format!("unknown time zone: {zone}"),
        })?;
        Ok(Self { zone })
    }

    /// Return the configured zone.
    pub const fn zone(&self) -> Tz {
        self.zone
    }

    /// Map a UTC instant to the local calendar day it falls in.
    ///
    /// Two instants map to the same [`EpochDay`] iff they share a local
    /// calendar day under the configured zone.
    pub fn epoch_day(&self, timestamp: DateTime<Utc>) -> EpochDay {
        EpochDay::from_date(timestamp.with_timezone(&self.zone).date_naive())
    }
}
