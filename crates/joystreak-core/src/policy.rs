//! Pure reward policy: maps (record, event day, channel) to a decision.
//!
//! No I/O and no side effects here. The engine applies the returned
//! decision inside its transaction path; this module only decides what
//! should happen.
//!
//! Rule order matters and is deliberate: the wrong-channel penalty
//! dominates the same-day repeat check, so a misplaced action is always
//! penalized regardless of what already happened today.

use joystreak_types::{ChannelKind, EpochDay, UserProgression};

use crate::config::ProgressionConfig;
use crate::error::EngineError;

/// The state delta a qualifying-action event should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardDecision {
    /// Wrong channel: deduct XP, leave streak and day fields untouched.
    Penalty {
        /// XP to deduct (floored at zero by the engine).
        xp_loss: u64,
    },

    /// First same-day repeat: the streak is forfeited, XP unchanged,
    /// day fields unchanged.
    StreakBroken {
        /// The streak value before it was broken.
        previous_streak: u32,
    },

    /// A further same-day repeat with the streak already at zero:
    /// nothing changes.
    RepeatNoop,

    /// First qualifying action of a new day: credit XP and advance the
    /// streak.
    Credit {
        /// Streak after this credit.
        new_streak: u32,
        /// Base XP granted.
        xp_gain: u64,
        /// XP deducted because a day was missed since the last credit.
        missed_day_xp_loss: u64,
        /// Whether a missed day was detected.
        missed_day: bool,
        /// Whether `new_streak` is a configured milestone.
        milestone: bool,
    },
}

/// Evaluate the reward policy for one event.
///
/// # Errors
///
/// Returns [`EngineError::StaleEvent`] if the event's day is strictly
/// before the last day already processed for this user. Ordering within
/// a user is required, not assumed from delivery order.
pub fn evaluate(
    record: &UserProgression,
    event_day: EpochDay,
    channel: ChannelKind,
    config: &ProgressionConfig,
) -> Result<RewardDecision, EngineError> {
    // Rule 1: wrong channel. Penalty dominates everything else.
    if channel != ChannelKind::Qualifying {
        return Ok(RewardDecision::Penalty {
            xp_loss: config.penalties.wrong_channel_xp_loss,
        });
    }

    if let Some(last_action) = record.last_action_day {
        // Out-of-order delivery: reject without mutation.
        if event_day < last_action {
            return Err(EngineError::StaleEvent {
                event_day,
                last_action_day: last_action,
            });
        }

        // Rule 2: same-day repeat. Only the first repeat of a day
        // forfeits the streak; once the streak is already zero the
        // repeat is a no-op.
        if event_day == last_action {
            return Ok(if record.streak > 0 {
                RewardDecision::StreakBroken {
                    previous_streak: record.streak,
                }
            } else {
                RewardDecision::RepeatNoop
            });
        }
    }

    // Rule 3: first qualifying action of a new day.
    let continued = record
        .last_qualifying_day
        .is_some_and(|last| last.is_day_before(event_day));
    let new_streak = if continued {
        record.streak.saturating_add(1)
    } else {
        1
    };

    // A missed day is a last credit strictly before yesterday. A last
    // credit of today (possible after an admin force_new_day) or of
    // yesterday is not a gap, and a fresh user has nothing to miss.
    let missed_day = record
        .last_qualifying_day
        .is_some_and(|last| last < event_day.prev());

    Ok(RewardDecision::Credit {
        new_streak,
        xp_gain: config.rewards.base_xp,
        missed_day_xp_loss: if missed_day {
            config.penalties.missed_day_xp_loss
        } else {
            0
        },
        missed_day,
        milestone: config.streak.milestones.contains(&new_streak),
    })
}
