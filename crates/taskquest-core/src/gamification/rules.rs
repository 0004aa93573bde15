//! Tunable XP constants and the level threshold table.
//!
//! Everything the XP formula and level lookup read lives here so the rules
//! can be swapped from `config.toml` without touching the algorithms.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::task::Priority;

/// XP needed to reach `level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelThreshold {
    pub level: u32,
    pub xp_required: u64,
}

const fn threshold(level: u32, xp_required: u64) -> LevelThreshold {
    LevelThreshold { level, xp_required }
}

/// Reference level table.
pub const DEFAULT_LEVELS: [LevelThreshold; 15] = [
    threshold(1, 0),
    threshold(2, 100),
    threshold(3, 250),
    threshold(4, 500),
    threshold(5, 1_000),
    threshold(6, 2_000),
    threshold(7, 3_500),
    threshold(8, 5_500),
    threshold(9, 8_500),
    threshold(10, 12_500),
    threshold(11, 18_000),
    threshold(12, 25_000),
    threshold(13, 35_000),
    threshold(14, 50_000),
    threshold(15, 75_000),
];

/// Multipliers applied to time-based XP per priority tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityWeights {
    #[serde(default = "default_low_weight")]
    pub low: f64,
    #[serde(default = "default_medium_weight")]
    pub medium: f64,
    #[serde(default = "default_high_weight")]
    pub high: f64,
}

impl PriorityWeights {
    pub fn weight(&self, priority: Priority) -> f64 {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
        }
    }
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            low: default_low_weight(),
            medium: default_medium_weight(),
            high: default_high_weight(),
        }
    }
}

/// The full XP rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpRules {
    #[serde(default = "default_base_xp")]
    pub base_xp: u32,
    #[serde(default = "default_xp_per_minute")]
    pub xp_per_minute: u32,
    /// Flat bonus for urgent tasks, added after the priority weight.
    #[serde(default = "default_urgent_task_bonus")]
    pub urgent_task_bonus: u32,
    /// Each streak day adds this fraction to the streak multiplier.
    #[serde(default = "default_streak_bonus_per_day")]
    pub streak_bonus_per_day: f64,
    #[serde(default)]
    pub priority_weights: PriorityWeights,
    /// Ordered by level; must start at level 1 with 0 XP.
    #[serde(default = "default_levels")]
    pub levels: Vec<LevelThreshold>,
}

fn default_base_xp() -> u32 {
    10
}
fn default_xp_per_minute() -> u32 {
    2
}
fn default_urgent_task_bonus() -> u32 {
    50
}
fn default_streak_bonus_per_day() -> f64 {
    0.1
}
fn default_low_weight() -> f64 {
    1.0
}
fn default_medium_weight() -> f64 {
    1.5
}
fn default_high_weight() -> f64 {
    2.0
}
fn default_levels() -> Vec<LevelThreshold> {
    DEFAULT_LEVELS.to_vec()
}

impl Default for XpRules {
    fn default() -> Self {
        Self {
            base_xp: default_base_xp(),
            xp_per_minute: default_xp_per_minute(),
            urgent_task_bonus: default_urgent_task_bonus(),
            streak_bonus_per_day: default_streak_bonus_per_day(),
            priority_weights: PriorityWeights::default(),
            levels: default_levels(),
        }
    }
}

impl XpRules {
    /// Check the table shape the level functions rely on.
    ///
    /// Levels must run 1, 2, 3, ... with strictly increasing XP starting at
    /// zero; weights and the streak bonus must be finite and non-negative.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: String| ConfigError::InvalidValue {
            key: format!("gamification.{key}"),
            message,
        };

        let first = self
            .levels
            .first()
            .ok_or_else(|| invalid("levels", "level table is empty".into()))?;
        if first.level != 1 || first.xp_required != 0 {
            return Err(invalid(
                "levels",
                format!(
                    "table must start at level 1 with 0 XP, got level {} at {} XP",
                    first.level, first.xp_required
                ),
            ));
        }
        for pair in self.levels.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if next.level != prev.level + 1 {
                return Err(invalid(
                    "levels",
                    format!("level {} follows level {}", next.level, prev.level),
                ));
            }
            if next.xp_required <= prev.xp_required {
                return Err(invalid(
                    "levels",
                    format!(
                        "level {} needs {} XP, not more than level {} ({} XP)",
                        next.level, next.xp_required, prev.level, prev.xp_required
                    ),
                ));
            }
        }

        let weights = [
            ("priority_weights.low", self.priority_weights.low),
            ("priority_weights.medium", self.priority_weights.medium),
            ("priority_weights.high", self.priority_weights.high),
            ("streak_bonus_per_day", self.streak_bonus_per_day),
        ];
        for (key, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(key, format!("must be a non-negative number, got {value}")));
            }
        }
        Ok(())
    }

    /// Highest level defined by the table.
    pub fn max_level(&self) -> u32 {
        self.levels.last().map(|t| t.level).unwrap_or(1)
    }

    pub(crate) fn threshold_for(&self, level: u32) -> Option<u64> {
        self.levels
            .iter()
            .find(|t| t.level == level)
            .map(|t| t.xp_required)
    }
}
