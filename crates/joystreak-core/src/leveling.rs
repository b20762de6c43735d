//! XP-to-level curve and HP derivation.
//!
//! Both functions are pure, deterministic, and total: `level_for` over
//! all XP values, `hp_for` over all (level, class) pairs. The curve is
//! built once from configuration; the engine only relies on
//! `level_for` being monotonically non-decreasing in XP and `hp_for`
//! being monotonically non-decreasing in level for a fixed class.

use std::collections::BTreeMap;

use joystreak_types::CharacterClass;

use crate::config::{HpFormula, LevelBand, ProgressionConfig};
use crate::error::EngineError;

/// The leveling curve: banded XP costs plus per-class HP formulas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCurve {
    bands: Vec<LevelBand>,
    xp_after_bands: u64,
    unlock_level: u32,
    classless_hp_per_level: u32,
    hp_formulas: BTreeMap<CharacterClass, HpFormula>,
}

impl LevelCurve {
    /// Build the curve from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if the band table is not
    /// strictly ascending or contains a zero cost.
    pub fn from_config(config: &ProgressionConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            bands: config.leveling.bands.clone(),
            xp_after_bands: config.leveling.xp_after_bands,
            unlock_level: config.classes.unlock_level,
            classless_hp_per_level: config.classes.classless_hp_per_level,
            hp_formulas: config.classes.hp_formulas.clone(),
        })
    }

    /// The configured class unlock level.
    pub const fn unlock_level(&self) -> u32 {
        self.unlock_level
    }

    /// XP cost of advancing to `level` from the level below it.
    fn cost_of_level(&self, level: u32) -> u64 {
        self.bands
            .iter()
            .find(|band| level <= band.up_to_level)
            .map_or(self.xp_after_bands, |band| band.xp_per_level)
    }

    /// Cumulative XP required to hold `level`.
    ///
    /// Level 1 requires 0 XP. The collaborator uses this for progress
    /// display; the engine uses it as the inverse of [`level_for`].
    ///
    /// [`level_for`]: LevelCurve::level_for
    pub fn xp_for_level(&self, level: u32) -> u64 {
        let mut total = 0_u64;
        let mut lvl = 2_u32;
        while lvl <= level {
            total = total.saturating_add(self.cost_of_level(lvl));
            lvl = lvl.saturating_add(1);
        }
        total
    }

    /// The level held at a cumulative XP total.
    ///
    /// Total over all XP values and monotonically non-decreasing.
    pub fn level_for(&self, xp: u64) -> u32 {
        let mut level = 1_u32;
        let mut remaining = xp;
        for band in &self.bands {
            let span = u64::from(band.up_to_level.saturating_sub(level));
            let affordable = remaining.checked_div(band.xp_per_level).unwrap_or(0);
            if affordable < span {
                return level.saturating_add(u32::try_from(affordable).unwrap_or(u32::MAX));
            }
            remaining = remaining.saturating_sub(span.saturating_mul(band.xp_per_level));
            level = band.up_to_level;
        }
        let affordable = remaining.checked_div(self.xp_after_bands).unwrap_or(0);
        level.saturating_add(u32::try_from(affordable).unwrap_or(u32::MAX))
    }

    /// Maximum HP at a (level, class) pair.
    ///
    /// Classless users -- and every user below the unlock level -- use
    /// the flat per-level formula. Classed users use their class's
    /// `base + (level - unlock_level) * per_level`.
    pub fn hp_for(&self, level: u32, class: Option<CharacterClass>) -> u32 {
        let formula = if level < self.unlock_level {
            None
        } else {
            class.and_then(|c| self.hp_formulas.get(&c))
        };
        formula.map_or_else(
            || level.saturating_mul(self.classless_hp_per_level),
            |f| {
                level
                    .saturating_sub(self.unlock_level)
                    .saturating_mul(f.per_level)
                    .saturating_add(f.base)
            },
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn curve() -> LevelCurve {
        LevelCurve::from_config(&ProgressionConfig::default()).unwrap()
    }

    #[test]
    fn level_one_needs_no_xp() {
        let curve = curve();
        assert_eq!(curve.xp_for_level(1), 0);
        assert_eq!(curve.level_for(0), 1);
    }

    #[test]
    fn default_band_costs() {
        let curve = curve();
        // Levels 2..=16 cost 60 each, 17..=36 cost 90, beyond cost 120.
        assert_eq!(curve.xp_for_level(2), 60);
        assert_eq!(curve.xp_for_level(3), 120);
        assert_eq!(curve.xp_for_level(16), 60 * 15);
        assert_eq!(curve.xp_for_level(17), 60 * 15 + 90);
        assert_eq!(curve.xp_for_level(37), 60 * 15 + 90 * 20 + 120);
    }

    #[test]
    fn level_for_inverts_xp_for_level() {
        let curve = curve();
        for level in 1..=50_u32 {
            let threshold = curve.xp_for_level(level);
            assert_eq!(curve.level_for(threshold), level);
            // One XP short of the threshold stays below the level.
            if threshold > 0 {
                assert_eq!(curve.level_for(threshold - 1), level - 1);
            }
        }
    }

    #[test]
    fn level_for_is_monotonic() {
        let curve = curve();
        let mut last = 0_u32;
        for xp in (0..5_000_u64).step_by(17) {
            let level = curve.level_for(xp);
            assert!(level >= last);
            last = level;
        }
    }

    #[test]
    fn level_for_is_total_at_extremes() {
        let curve = curve();
        // Saturates at the u32 ceiling instead of overflowing.
        assert_eq!(curve.level_for(u64::MAX), u32::MAX);
    }

    #[test]
    fn classless_hp_is_flat_per_level() {
        let curve = curve();
        assert_eq!(curve.hp_for(1, None), 10);
        assert_eq!(curve.hp_for(5, None), 50);
    }

    #[test]
    fn below_gate_ignores_class() {
        let curve = curve();
        // Level 2 is below the unlock level 3: the classless formula
        // applies even with a class set (only reachable via admin
        // reset edge states, but hp_for is total).
        assert_eq!(curve.hp_for(2, Some(CharacterClass::ChudWarrior)), 20);
    }

    #[test]
    fn class_hp_uses_base_plus_growth() {
        let curve = curve();
        // chud_warrior: 120 base + 12 per level past 3.
        assert_eq!(curve.hp_for(3, Some(CharacterClass::ChudWarrior)), 120);
        assert_eq!(curve.hp_for(10, Some(CharacterClass::ChudWarrior)), 120 + 7 * 12);
        // pit_wizard: 70 base + 7 per level past 3.
        assert_eq!(curve.hp_for(4, Some(CharacterClass::PitWizard)), 77);
    }

    #[test]
    fn hp_is_monotonic_in_level() {
        let curve = curve();
        for class in [None, Some(CharacterClass::JoyKeeper)] {
            let mut last = 0_u32;
            for level in 1..=60 {
                let hp = curve.hp_for(level, class);
                assert!(hp >= last);
                last = hp;
            }
        }
    }
}
