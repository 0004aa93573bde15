//! XP rewards and level derivation.
//!
//! All functions here are pure: the only input besides their arguments is
//! the [`XpRules`] table they are called on.

use serde::{Deserialize, Serialize};

use super::rules::XpRules;
use crate::task::Priority;

/// Task attributes that feed the XP formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskXpInput {
    pub estimated_minutes: u32,
    pub priority: Priority,
    pub is_urgent: bool,
    pub current_streak_days: u32,
}

const LEVEL_TITLES: [&str; 15] = [
    "Beginner",
    "Novice",
    "Apprentice",
    "Skilled",
    "Expert",
    "Master",
    "Grand Master",
    "Legend",
    "Hero",
    "Champion",
    "Mythic",
    "Legendary",
    "Supreme",
    "Divine",
    "Ascended",
];

impl XpRules {
    /// XP reward for completing a task.
    ///
    /// Steps, in order: base XP, plus minutes times the per-minute rate,
    /// times the priority weight, plus the urgent bonus (not weighted), times
    /// the streak multiplier, rounded half away from zero.
    pub fn calculate_task_xp(&self, input: &TaskXpInput) -> u64 {
        let mut xp = f64::from(self.base_xp);
        xp += f64::from(input.estimated_minutes) * f64::from(self.xp_per_minute);
        xp *= self.priority_weights.weight(input.priority);

        if input.is_urgent {
            xp += f64::from(self.urgent_task_bonus);
        }

        if input.current_streak_days > 0 {
            xp *= self.streak_multiplier(input.current_streak_days);
        }

        xp.round().max(0.0) as u64
    }

    /// `1 + streak * streak_bonus_per_day`. Uncapped.
    pub fn streak_multiplier(&self, current_streak: u32) -> f64 {
        1.0 + f64::from(current_streak) * self.streak_bonus_per_day
    }

    /// Level reached with `total_xp`: the highest threshold not above it.
    pub fn calculate_level(&self, total_xp: u64) -> u32 {
        self.levels
            .iter()
            .rev()
            .find(|t| t.xp_required <= total_xp)
            .map(|t| t.level)
            .unwrap_or(1)
    }

    /// XP needed for the level after `current_level`, or `None` at the top.
    pub fn xp_for_next_level(&self, current_level: u32) -> Option<u64> {
        self.threshold_for(current_level.saturating_add(1))
    }

    /// XP at which `current_level` starts; 0 for levels outside the table.
    pub fn xp_for_current_level(&self, current_level: u32) -> u64 {
        self.threshold_for(current_level).unwrap_or(0)
    }

    /// Fraction of the way from the current level to the next, in `[0, 1]`.
    ///
    /// Returns exactly `1.0` once the top level is reached.
    pub fn calculate_level_progress(&self, total_xp: u64) -> f64 {
        let level = self.calculate_level(total_xp);
        let Some(next) = self.xp_for_next_level(level) else {
            return 1.0;
        };
        let current = self.xp_for_current_level(level);
        let into_level = total_xp.saturating_sub(current) as f64;
        let span = next.saturating_sub(current) as f64;
        if span <= 0.0 {
            return 1.0;
        }
        (into_level / span).clamp(0.0, 1.0)
    }

    /// XP still missing for the next level; 0 at the top.
    pub fn xp_until_next_level(&self, total_xp: u64) -> u64 {
        let level = self.calculate_level(total_xp);
        self.xp_for_next_level(level)
            .map(|next| next.saturating_sub(total_xp))
            .unwrap_or(0)
    }

    pub fn will_level_up(&self, current_xp: u64, xp_to_add: u64) -> bool {
        self.new_level(current_xp, xp_to_add) > self.calculate_level(current_xp)
    }

    pub fn new_level(&self, current_xp: u64, xp_to_add: u64) -> u32 {
        self.calculate_level(current_xp.saturating_add(xp_to_add))
    }
}

/// Display title for a level. Levels beyond the named ones fall back to
/// `"Level N"`.
pub fn level_title(level: u32) -> String {
    level
        .checked_sub(1)
        .and_then(|idx| LEVEL_TITLES.get(idx as usize))
        .map(|title| (*title).to_string())
        .unwrap_or_else(|| format!("Level {level}"))
}

/// Compact XP for display: `999`, `1.5K`, `2.3M`.
pub fn format_xp(xp: u64) -> String {
    if xp >= 1_000_000 {
        format!("{:.1}M", xp as f64 / 1_000_000.0)
    } else if xp >= 1_000 {
        format!("{:.1}K", xp as f64 / 1_000.0)
    } else {
        xp.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(minutes: u32, priority: Priority, urgent: bool, streak: u32) -> TaskXpInput {
        TaskXpInput {
            estimated_minutes: minutes,
            priority,
            is_urgent: urgent,
            current_streak_days: streak,
        }
    }

    #[test]
    fn reference_task_xp_values() {
        let rules = XpRules::default();
        assert_eq!(rules.calculate_task_xp(&input(30, Priority::Medium, false, 0)), 105);
        assert_eq!(rules.calculate_task_xp(&input(30, Priority::High, true, 0)), 190);
        assert_eq!(rules.calculate_task_xp(&input(30, Priority::Medium, false, 5)), 158);
    }

    #[test]
    fn urgent_bonus_is_not_weighted() {
        let rules = XpRules::default();
        // (10 + 0) * 2.0 + 50
        assert_eq!(rules.calculate_task_xp(&input(0, Priority::High, true, 0)), 70);
        // (10 + 20) * 1.0
        assert_eq!(rules.calculate_task_xp(&input(10, Priority::Low, false, 0)), 30);
    }

    #[test]
    fn streak_multiplier_is_uncapped() {
        let rules = XpRules::default();
        assert_eq!(rules.streak_multiplier(0), 1.0);
        assert!((rules.streak_multiplier(100) - 11.0).abs() < 1e-9);
        assert_eq!(rules.calculate_task_xp(&input(0, Priority::Low, false, 100)), 110);
    }

    #[test]
    fn level_lookup_at_thresholds() {
        let rules = XpRules::default();
        assert_eq!(rules.calculate_level(0), 1);
        assert_eq!(rules.calculate_level(99), 1);
        assert_eq!(rules.calculate_level(100), 2);
        assert_eq!(rules.calculate_level(74_999), 14);
        assert_eq!(rules.calculate_level(75_000), 15);
        assert_eq!(rules.calculate_level(u64::MAX), 15);
    }

    #[test]
    fn next_and_current_thresholds() {
        let rules = XpRules::default();
        assert_eq!(rules.xp_for_next_level(1), Some(100));
        assert_eq!(rules.xp_for_next_level(14), Some(75_000));
        assert_eq!(rules.xp_for_next_level(15), None);
        assert_eq!(rules.xp_for_current_level(3), 250);
        assert_eq!(rules.xp_for_current_level(99), 0);
    }

    #[test]
    fn progress_within_level() {
        let rules = XpRules::default();
        assert_eq!(rules.calculate_level_progress(0), 0.0);
        assert_eq!(rules.calculate_level_progress(50), 0.5);
        // level 3 spans 250..500
        assert_eq!(rules.calculate_level_progress(375), 0.5);
        assert_eq!(rules.calculate_level_progress(75_000), 1.0);
        assert_eq!(rules.calculate_level_progress(1_000_000), 1.0);
    }

    #[test]
    fn xp_until_next() {
        let rules = XpRules::default();
        assert_eq!(rules.xp_until_next_level(0), 100);
        assert_eq!(rules.xp_until_next_level(240), 10);
        assert_eq!(rules.xp_until_next_level(80_000), 0);
    }

    #[test]
    fn level_up_detection() {
        let rules = XpRules::default();
        assert!(rules.will_level_up(90, 15));
        assert!(!rules.will_level_up(90, 5));
        assert!(!rules.will_level_up(75_000, 1_000_000));
        assert_eq!(rules.new_level(90, 200), 3);
    }

    #[test]
    fn titles_and_fallback() {
        assert_eq!(level_title(1), "Beginner");
        assert_eq!(level_title(7), "Grand Master");
        assert_eq!(level_title(15), "Ascended");
        assert_eq!(level_title(16), "Level 16");
        assert_eq!(level_title(0), "Level 0");
    }

    #[test]
    fn format_xp_compacts() {
        assert_eq!(format_xp(999), "999");
        assert_eq!(format_xp(1_500), "1.5K");
        assert_eq!(format_xp(2_340_000), "2.3M");
    }

    #[test]
    fn custom_rules_change_only_data() {
        let rules = XpRules {
            base_xp: 0,
            xp_per_minute: 1,
            urgent_task_bonus: 0,
            ..XpRules::default()
        };
        assert_eq!(rules.calculate_task_xp(&input(40, Priority::High, true, 0)), 80);
    }
}
