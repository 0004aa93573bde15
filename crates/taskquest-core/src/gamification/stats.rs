//! The persisted progress record and its presentation view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rules::XpRules;
use super::xp::level_title;

/// Cumulative progress for the single local user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_xp: u64,
    /// Always `calculate_level(total_xp)`; re-derived on load.
    pub level: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_tasks_completed: u64,
    pub total_pomodoros_completed: u64,
    pub last_activity_date: DateTime<Utc>,
}

impl UserStats {
    /// Fresh stats for a first run at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            total_xp: 0,
            level: 1,
            current_streak: 0,
            longest_streak: 0,
            total_tasks_completed: 0,
            total_pomodoros_completed: 0,
            last_activity_date: now,
        }
    }

    /// Restore the derived invariants after reading from storage.
    pub fn normalize(&mut self, rules: &XpRules) {
        self.level = rules.calculate_level(self.total_xp);
        self.longest_streak = self.longest_streak.max(self.current_streak);
    }

    pub fn snapshot(&self, rules: &XpRules) -> LevelSnapshot {
        LevelSnapshot::from_stats(self, rules)
    }
}

/// Level figures a progress screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub total_xp: u64,
    pub current_level: u32,
    /// 0.0 ..= 1.0
    pub level_progress: f64,
    /// `None` once the top level is reached.
    pub xp_for_next_level: Option<u64>,
    pub xp_until_next_level: u64,
    pub level_title: String,
    pub current_streak: u32,
    pub longest_streak: u32,
}

impl LevelSnapshot {
    pub fn from_stats(stats: &UserStats, rules: &XpRules) -> Self {
        let current_level = rules.calculate_level(stats.total_xp);
        Self {
            total_xp: stats.total_xp,
            current_level,
            level_progress: rules.calculate_level_progress(stats.total_xp),
            xp_for_next_level: rules.xp_for_next_level(current_level),
            xp_until_next_level: rules.xp_until_next_level(stats.total_xp),
            level_title: level_title(current_level),
            current_streak: stats.current_streak,
            longest_streak: stats.longest_streak,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rederives_level() {
        let rules = XpRules::default();
        let mut stats = UserStats::new(Utc::now());
        stats.total_xp = 1_200;
        stats.level = 1;
        stats.current_streak = 4;
        stats.longest_streak = 2;
        stats.normalize(&rules);
        assert_eq!(stats.level, 5);
        assert_eq!(stats.longest_streak, 4);
    }

    #[test]
    fn snapshot_mid_level() {
        let rules = XpRules::default();
        let mut stats = UserStats::new(Utc::now());
        stats.total_xp = 175;
        let snap = stats.snapshot(&rules);
        assert_eq!(snap.current_level, 2);
        assert_eq!(snap.level_title, "Novice");
        assert_eq!(snap.xp_for_next_level, Some(250));
        assert_eq!(snap.xp_until_next_level, 75);
        assert_eq!(snap.level_progress, 0.5);
    }

    #[test]
    fn snapshot_at_cap() {
        let rules = XpRules::default();
        let mut stats = UserStats::new(Utc::now());
        stats.total_xp = 90_000;
        let snap = stats.snapshot(&rules);
        assert_eq!(snap.current_level, 15);
        assert_eq!(snap.xp_for_next_level, None);
        assert_eq!(snap.xp_until_next_level, 0);
        assert_eq!(snap.level_progress, 1.0);
    }
}
