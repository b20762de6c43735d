//! The per-user progression record.

use serde::{Deserialize, Serialize};

use crate::enums::CharacterClass;
use crate::epoch::EpochDay;
use crate::ids::{GuildId, UserId};

/// One user's durable progression state within a guild.
///
/// A record is created lazily on the first qualifying event or first
/// admin grant for a (guild, user) pair, and is mutated exclusively
/// through the engine's atomic transaction path.
///
/// # Invariants (hold after every committed write)
///
/// - `level == level_for(xp)` for the active leveling curve.
/// - `hp == hp_for(level, class)` for the active class formulas.
/// - `streak > 0` implies `last_qualifying_day` is set.
/// - `class` is only ever set while `level` is at or above the
///   configured unlock level.
///
/// The record's optimistic-concurrency version is not part of this
/// struct; the store carries it alongside (`get` returns both, and
/// `compare_and_swap` takes the expected value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgression {
    /// Guild this record belongs to.
    pub guild_id: GuildId,
    /// User this record belongs to.
    pub user_id: UserId,
    /// Cumulative experience points. Non-negative; only an admin reset
    /// moves it backwards.
    pub xp: u64,
    /// Current level, derived from `xp`. Persisted for fast reads.
    pub level: u32,
    /// Count of consecutive qualifying days.
    pub streak: u32,
    /// Last day a qualifying action was credited.
    pub last_qualifying_day: Option<EpochDay>,
    /// Last day any qualifying action was observed. Used to detect
    /// same-day repeats, which break the streak without re-crediting.
    pub last_action_day: Option<EpochDay>,
    /// Selected character class, if the user has passed the gate.
    pub class: Option<CharacterClass>,
    /// Maximum hit points, derived from (`level`, `class`).
    pub hp: u32,
    /// Coin balance. Changes only via daily claim, admin grant, or
    /// admin reset.
    pub coins: u64,
    /// Last day the user claimed daily coins.
    pub last_claim_day: Option<EpochDay>,
}

impl UserProgression {
    /// Creation-default record for a (guild, user) pair.
    ///
    /// `hp` starts at 0 here; the engine re-derives `level` and `hp`
    /// from the leveling curve before any record is persisted, so the
    /// stored default always satisfies the invariants above.
    pub const fn new(guild_id: GuildId, user_id: UserId) -> Self {
        Self {
            guild_id,
            user_id,
            xp: 0,
            level: 1,
            streak: 0,
            last_qualifying_day: None,
            last_action_day: None,
            class: None,
            hp: 0,
            coins: 0,
            last_claim_day: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_has_creation_state() {
        let record = UserProgression::new(GuildId::new(1), UserId::new(2));
        assert_eq!(record.xp, 0);
        assert_eq!(record.level, 1);
        assert_eq!(record.streak, 0);
        assert_eq!(record.coins, 0);
        assert!(record.class.is_none());
        assert!(record.last_qualifying_day.is_none());
        assert!(record.last_action_day.is_none());
        assert!(record.last_claim_day.is_none());
    }

    #[test]
    fn record_roundtrips_through_json() {
        let mut record = UserProgression::new(GuildId::new(7), UserId::new(8));
        record.xp = 120;
        record.level = 3;
        record.streak = 4;
        record.class = Some(CharacterClass::ChudWarrior);
        record.last_qualifying_day = Some(EpochDay::new(20_000));

        let json = serde_json::to_string(&record).ok();
        let restored: Option<UserProgression> =
            json.as_deref().and_then(|j| serde_json::from_str(j).ok());
        assert_eq!(restored.as_ref(), Some(&record));
    }
}
