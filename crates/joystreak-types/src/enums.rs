//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};

/// The unlockable character classes.
///
/// Classes gate on level (the engine enforces the unlock level from its
/// configuration) and are set-once: a selected class is immutable until
/// an admin reset clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    /// Balanced support class.
    JoyKeeper,
    /// Tanky frontline class with the highest HP growth.
    ChudWarrior,
    /// Versatile all-rounder.
    AchievementHunter,
    /// Fragile caster with the lowest HP growth.
    PitWizard,
    /// Durable melee class.
    GladiatorOfThePit,
}

impl CharacterClass {
    /// All classes, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::JoyKeeper,
        Self::ChudWarrior,
        Self::AchievementHunter,
        Self::PitWizard,
        Self::GladiatorOfThePit,
    ];

    /// Stable string form, used for configuration keys and storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JoyKeeper => "joy_keeper",
            Self::ChudWarrior => "chud_warrior",
            Self::AchievementHunter => "achievement_hunter",
            Self::PitWizard => "pit_wizard",
            Self::GladiatorOfThePit => "gladiator_of_the_pit",
        }
    }

    /// Parse the stable string form back into a class.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl core::fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel classification supplied by the platform collaborator.
///
/// The collaborator maps raw channel identifiers to this closed set; the
/// engine never inspects channel IDs itself. Any classification other
/// than [`ChannelKind::Qualifying`] triggers the wrong-channel penalty
/// for a qualifying action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// The designated daily-action channel.
    Qualifying,
    /// Any other channel.
    NonQualifying,
}
