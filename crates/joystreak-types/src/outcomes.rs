//! Plain-data outcome structs returned to the platform collaborator.
//!
//! The engine emits no formatted text. Every entry point returns one of
//! these structs describing exactly what changed, and the collaborator
//! decides how (or whether) to render it.

use serde::{Deserialize, Serialize};

use crate::enums::CharacterClass;
use crate::ids::UserId;

/// Result of processing a qualifying-action event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardOutcome {
    /// Net XP change (negative for penalties).
    pub xp_delta: i64,
    /// Level after the event.
    pub new_level: u32,
    /// Whether the event crossed a level threshold upwards.
    pub leveled_up: bool,
    /// Streak after the event.
    pub streak: u32,
    /// Whether this was a wrong-channel penalty.
    pub penalty: bool,
    /// Whether a same-day repeat broke the streak.
    pub streak_broken: bool,
    /// Whether a missed day was detected (streak restarted at 1 and the
    /// missed-day XP penalty applied).
    pub missed_day: bool,
    /// Whether the new streak is a milestone (7, 30, 100, 365 days).
    pub milestone: bool,
    /// Whether this event lifted the user across the class-unlock level.
    pub class_unlocked: bool,
}

/// Result of a successful daily coin claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    /// Coins credited by this claim.
    pub coins_earned: u64,
    /// Coin balance after the claim.
    pub total_coins: u64,
    /// Level the claim was computed from.
    pub level: u32,
}

/// Result of a successful class selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassOutcome {
    /// The class that was selected.
    pub class: CharacterClass,
    /// Maximum HP after the selection.
    pub hp: u32,
}

/// Result of an admin grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantOutcome {
    /// XP after the grant.
    pub xp: u64,
    /// Level after the grant.
    pub new_level: u32,
    /// Whether the grant crossed a level threshold upwards.
    pub leveled_up: bool,
    /// Coin balance after the grant.
    pub coins: u64,
}

/// Per-user entry in a bulk reset report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResetOutcome {
    /// The user the reset was attempted for.
    pub user_id: UserId,
    /// `None` on success, otherwise a description of the failure.
    pub error: Option<String>,
}

/// Report for a bulk (guild-wide) admin reset.
///
/// Resets are transactional per user: a failure for one user never
/// aborts the rest of the batch, it is simply recorded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResetReport {
    /// One entry per user the reset was attempted for.
    pub outcomes: Vec<UserResetOutcome>,
}

impl ResetReport {
    /// Number of users successfully reset.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_none()).count()
    }

    /// Number of users whose reset failed.
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_report_counts_outcomes() {
        let report = ResetReport {
            outcomes: vec![
                UserResetOutcome {
                    user_id: UserId::new(1),
                    error: None,
                },
                UserResetOutcome {
                    user_id: UserId::new(2),
                    error: Some("store unavailable".to_owned()),
                },
                UserResetOutcome {
                    user_id: UserId::new(3),
                    error: None,
                },
            ],
        };
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
    }
}
