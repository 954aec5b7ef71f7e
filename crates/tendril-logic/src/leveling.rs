//! Experience accumulation and the level-up curve.
//!
//! Reaching level `n` from `n − 1` costs `round(75 · (n² − n))` XP. Level
//! ups are applied eagerly: after any [`LevelMeta::add_xp`] call the stored
//! XP is always below the cost of the next level. Existing save data relies
//! on this exact curve, rounding included.

use serde::{Deserialize, Serialize};

use crate::constants::leveling::{STARTING_LEVEL, XP_CURVE_COEFFICIENT};

/// XP needed to advance from `level − 1` to `level`.
pub fn xp_required_for_level(level: i64) -> i64 {
    let n = level as f64;
    (XP_CURVE_COEFFICIENT * (n * n - n)).round() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelMeta {
    pub level: i64,
    pub xp: i64,
}

impl Default for LevelMeta {
    fn default() -> Self {
        Self {
            level: STARTING_LEVEL,
            xp: 0,
        }
    }
}

impl LevelMeta {
    /// Start at the first level with `bonus_xp` already granted.
    pub fn with_bonus(bonus_xp: i64) -> Self {
        let mut meta = Self::default();
        meta.add_xp(bonus_xp);
        meta
    }

    /// Add XP and apply every level up it pays for. Returns the number of
    /// levels gained.
    pub fn add_xp(&mut self, amount: i64) -> i64 {
        self.xp += amount;

        let mut gained = 0;
        loop {
            let required = xp_required_for_level(self.level + 1);
            if self.xp < required {
                break;
            }
            self.xp -= required;
            self.level += 1;
            gained += 1;
        }
        gained
    }

    /// XP still missing before the next level up.
    pub fn xp_to_next_level(&self) -> i64 {
        xp_required_for_level(self.level + 1) - self.xp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xp_curve_values() {
        assert_eq!(xp_required_for_level(1), 0);
        assert_eq!(xp_required_for_level(2), 150);
        assert_eq!(xp_required_for_level(3), 450);
        assert_eq!(xp_required_for_level(4), 900);
        assert_eq!(xp_required_for_level(10), 6750);
    }

    #[test]
    fn test_default_starts_at_level_one() {
        let meta = LevelMeta::default();
        assert_eq!(meta.level, 1);
        assert_eq!(meta.xp, 0);
    }

    #[test]
    fn test_add_xp_below_threshold() {
        let mut meta = LevelMeta::default();
        assert_eq!(meta.add_xp(30), 0);
        assert_eq!(meta.level, 1);
        assert_eq!(meta.xp, 30);
        assert_eq!(meta.xp_to_next_level(), 120);
    }

    #[test]
    fn test_add_xp_exact_threshold_levels_up() {
        let mut meta = LevelMeta::default();
        assert_eq!(meta.add_xp(150), 1);
        assert_eq!(meta.level, 2);
        assert_eq!(meta.xp, 0);
    }

    #[test]
    fn test_multi_level_up_in_one_grant() {
        // 150 + 450 + 900 = 1500 takes level 1 to level 4
        let mut meta = LevelMeta::default();
        assert_eq!(meta.add_xp(1500 + 17), 3);
        assert_eq!(meta.level, 4);
        assert_eq!(meta.xp, 17);
    }

    #[test]
    fn test_invariant_holds_after_many_grants() {
        let mut meta = LevelMeta::default();
        for _ in 0..200 {
            meta.add_xp(30);
            assert!(meta.xp < xp_required_for_level(meta.level + 1));
            assert!(meta.xp >= 0);
        }
        assert!(meta.level > 1);
    }

    #[test]
    fn test_with_bonus_applies_level_ups() {
        let meta = LevelMeta::with_bonus(25);
        assert_eq!(meta, LevelMeta { level: 1, xp: 25 });

        let big = LevelMeta::with_bonus(160);
        assert_eq!(big, LevelMeta { level: 2, xp: 10 });
    }
}
