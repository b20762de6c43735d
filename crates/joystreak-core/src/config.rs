//! Configuration loading and typed config structures for the engine.
//!
//! The configuration is supplied once at startup by the deploying
//! collaborator (typically from a YAML file) and treated as immutable
//! for the process lifetime. Every field has a default matching the
//! production values, so an empty document is a valid configuration.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use joystreak_types::CharacterClass;

use crate::error::EngineError;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProgressionConfig {
    /// IANA time zone identifier used for all day-boundary arithmetic.
    #[serde(default)]
    pub time: TimeConfig,

    /// XP and coin reward amounts.
    #[serde(default)]
    pub rewards: RewardConfig,

    /// XP penalty amounts.
    #[serde(default)]
    pub penalties: PenaltyConfig,

    /// Level threshold table.
    #[serde(default)]
    pub leveling: LevelingConfig,

    /// Class unlock gate and HP formulas.
    #[serde(default)]
    pub classes: ClassConfig,

    /// Streak milestone days.
    #[serde(default)]
    pub streak: StreakConfig,

    /// Bounded-retry behavior for the transactional apply path.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ProgressionConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if the file cannot be
    /// read or is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Configuration {
            reason: format!("failed to read config file: {e}"),
        })?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if the string is not
    /// valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, EngineError> {
        serde_yml::from_str(yaml).map_err(|e| EngineError::Configuration {
            reason: format!("failed to parse config YAML: {e}"),
        })
    }

    /// Validate the reward tables and retry bounds.
    ///
    /// The time zone identifier is validated separately when the
    /// [`EpochResolver`](crate::clock::EpochResolver) is constructed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] describing the first
    /// problem found.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.leveling.validate()?;
        if self.classes.unlock_level == 0 {
            return Err(EngineError::Configuration {
                reason: "classes.unlock_level must be at least 1".to_owned(),
            });
        }
        if self.classes.classless_hp_per_level == 0 {
            return Err(EngineError::Configuration {
                reason: "classes.classless_hp_per_level must be positive".to_owned(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(EngineError::Configuration {
                reason: "retry.max_attempts must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Time zone configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimeConfig {
    /// IANA zone identifier (e.g. `America/New_York`).
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

/// Reward amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RewardConfig {
    /// XP granted for the first qualifying action of a day.
    #[serde(default = "default_base_xp")]
    pub base_xp: u64,

    /// Coins credited per level by the daily claim.
    #[serde(default = "default_coins_per_level")]
    pub coins_per_level: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            base_xp: default_base_xp(),
            coins_per_level: default_coins_per_level(),
        }
    }
}

/// Penalty amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PenaltyConfig {
    /// XP deducted for a qualifying action in the wrong channel.
    #[serde(default = "default_wrong_channel_xp_loss")]
    pub wrong_channel_xp_loss: u64,

    /// XP deducted when a qualifying action follows a missed day.
    #[serde(default = "default_missed_day_xp_loss")]
    pub missed_day_xp_loss: u64,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            wrong_channel_xp_loss: default_wrong_channel_xp_loss(),
            missed_day_xp_loss: default_missed_day_xp_loss(),
        }
    }
}

/// One band of the level cost table: every level up to and including
/// `up_to_level` costs `xp_per_level` XP to reach from the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LevelBand {
    /// Highest level this band applies to.
    pub up_to_level: u32,
    /// XP cost of each level-up within the band.
    pub xp_per_level: u64,
}

/// Level threshold table.
///
/// Levels beyond the last band cost `xp_after_bands` each, so the curve
/// is total over all XP values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LevelingConfig {
    /// Cost bands in ascending `up_to_level` order.
    #[serde(default = "default_level_bands")]
    pub bands: Vec<LevelBand>,

    /// XP cost of each level-up beyond the last band.
    #[serde(default = "default_xp_after_bands")]
    pub xp_after_bands: u64,
}

impl LevelingConfig {
    /// Check that the band table is strictly ascending with positive
    /// costs.
    fn validate(&self) -> Result<(), EngineError> {
        let mut previous = 1_u32;
        for band in &self.bands {
            if band.up_to_level <= previous {
                return Err(EngineError::Configuration {
                    reason: format!(
                        "leveling.bands must be strictly ascending, got up_to_level {} after {previous}",
                        band.up_to_level
                    ),
                });
            }
            if band.xp_per_level == 0 {
                return Err(EngineError::Configuration {
                    reason: format!(
                        "leveling.bands xp_per_level must be positive (band up to {})",
                        band.up_to_level
                    ),
                });
            }
            previous = band.up_to_level;
        }
        if self.xp_after_bands == 0 {
            return Err(EngineError::Configuration {
                reason: "leveling.xp_after_bands must be positive".to_owned(),
            });
        }
        Ok(())
    }
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            bands: default_level_bands(),
            xp_after_bands: default_xp_after_bands(),
        }
    }
}

/// HP formula parameters for one class: `base + (level - unlock_level)
/// * per_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HpFormula {
    /// HP at the unlock level.
    pub base: u32,
    /// HP gained per level beyond the unlock level.
    pub per_level: u32,
}

/// Class gating and HP configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClassConfig {
    /// Level at which class selection unlocks.
    #[serde(default = "default_unlock_level")]
    pub unlock_level: u32,

    /// HP per level for classless users (and everyone below the gate).
    #[serde(default = "default_classless_hp_per_level")]
    pub classless_hp_per_level: u32,

    /// HP formula per class. Classes missing from the map fall back to
    /// the classless formula.
    #[serde(default = "default_hp_formulas")]
    pub hp_formulas: BTreeMap<CharacterClass, HpFormula>,
}

impl Default for ClassConfig {
    fn default() -> Self {
        Self {
            unlock_level: default_unlock_level(),
            classless_hp_per_level: default_classless_hp_per_level(),
            hp_formulas: default_hp_formulas(),
        }
    }
}

/// Streak milestone configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreakConfig {
    /// Streak lengths reported as milestones.
    #[serde(default = "default_milestones")]
    pub milestones: Vec<u32>,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            milestones: default_milestones(),
        }
    }
}

/// Bounds for the optimistic-concurrency retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryConfig {
    /// Maximum read-modify-write attempts per operation.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff between attempts, in milliseconds. Scales linearly
    /// with the attempt number.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_timezone() -> String {
    "America/New_York".to_owned()
}

const fn default_base_xp() -> u64 {
    30
}

const fn default_coins_per_level() -> u64 {
    1
}

const fn default_wrong_channel_xp_loss() -> u64 {
    5
}

const fn default_missed_day_xp_loss() -> u64 {
    5
}

fn default_level_bands() -> Vec<LevelBand> {
    vec![
        LevelBand {
            up_to_level: 16,
            xp_per_level: 60,
        },
        LevelBand {
            up_to_level: 36,
            xp_per_level: 90,
        },
    ]
}

const fn default_xp_after_bands() -> u64 {
    120
}

const fn default_unlock_level() -> u32 {
    3
}

const fn default_classless_hp_per_level() -> u32 {
    10
}

fn default_hp_formulas() -> BTreeMap<CharacterClass, HpFormula> {
    BTreeMap::from([
        (
            CharacterClass::JoyKeeper,
            HpFormula {
                base: 80,
                per_level: 8,
            },
        ),
        (
            CharacterClass::ChudWarrior,
            HpFormula {
                base: 120,
                per_level: 12,
            },
        ),
        (
            CharacterClass::AchievementHunter,
            HpFormula {
                base: 90,
                per_level: 9,
            },
        ),
        (
            CharacterClass::PitWizard,
            HpFormula {
                base: 70,
                per_level: 7,
            },
        ),
        (
            CharacterClass::GladiatorOfThePit,
            HpFormula {
                base: 110,
                per_level: 11,
            },
        ),
    ])
}

fn default_milestones() -> Vec<u32> {
    vec![7, 30, 100, 365]
}

const fn default_max_attempts() -> u32 {
    5
}

const fn default_backoff_ms() -> u64 {
    25
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_valid() {
        let config = ProgressionConfig::parse("{}");
        assert!(config.is_ok());
        let config = config.unwrap_or_default();
        assert_eq!(config.rewards.base_xp, 30);
        assert_eq!(config.penalties.wrong_channel_xp_loss, 5);
        assert_eq!(config.classes.unlock_level, 3);
        assert_eq!(config.time.timezone, "America/New_York");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn yaml_overrides_defaults() {
        let yaml = r"
time:
  timezone: Europe/Oslo
rewards:
  base_xp: 50
penalties:
  missed_day_xp_loss: 0
";
        let config = ProgressionConfig::parse(yaml).unwrap_or_default();
        assert_eq!(config.time.timezone, "Europe/Oslo");
        assert_eq!(config.rewards.base_xp, 50);
        assert_eq!(config.penalties.missed_day_xp_loss, 0);
        // Untouched sections keep their defaults.
        assert_eq!(config.rewards.coins_per_level, 1);
    }

    #[test]
    fn class_formulas_parse_from_yaml() {
        let yaml = r"
classes:
  unlock_level: 5
  hp_formulas:
    pit_wizard:
      base: 60
      per_level: 6
";
        let config = ProgressionConfig::parse(yaml).unwrap_or_default();
        assert_eq!(config.classes.unlock_level, 5);
        assert_eq!(
            config.classes.hp_formulas.get(&CharacterClass::PitWizard),
            Some(&HpFormula {
                base: 60,
                per_level: 6
            })
        );
    }

    #[test]
    fn non_ascending_bands_rejected() {
        let mut config = ProgressionConfig::default();
        config.leveling.bands = vec![
            LevelBand {
                up_to_level: 20,
                xp_per_level: 60,
            },
            LevelBand {
                up_to_level: 10,
                xp_per_level: 90,
            },
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_cost_band_rejected() {
        let mut config = ProgressionConfig::default();
        config.leveling.bands = vec![LevelBand {
            up_to_level: 16,
            xp_per_level: 0,
        }];
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_retry_budget_rejected() {
        let mut config = ProgressionConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
