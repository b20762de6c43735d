//! Type-safe identifier wrappers for guilds and users.
//!
//! The chat platform hands us opaque numeric snowflake identifiers. Each
//! gets a strongly-typed wrapper to prevent accidental mixing of guild
//! and user IDs at compile time. The values are immutable and never
//! interpreted -- the engine only uses them as record keys.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `u64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw platform identifier.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Return the raw identifier value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a guild (server).
    GuildId
}

define_id! {
    /// Unique identifier for a user within the platform.
    UserId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_roundtrip_raw_value() {
        let guild = GuildId::new(123_456_789);
        assert_eq!(guild.into_inner(), 123_456_789);
        assert_eq!(u64::from(guild), 123_456_789);
    }

    #[test]
    fn id_display_matches_raw() {
        let user = UserId::new(42);
        assert_eq!(user.to_string(), "42");
    }

    #[test]
    fn id_serde_is_transparent() {
        let user = UserId::new(987);
        let json = serde_json::to_string(&user).ok();
        assert_eq!(json.as_deref(), Some("987"));
    }
}
