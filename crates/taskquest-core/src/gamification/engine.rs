//! Task-completion orchestration.
//!
//! [`Gamification`] owns the stats store behind a mutex so completions run
//! one at a time: each is a load-modify-save on a single record, and two
//! overlapping ones would otherwise lose an update.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::rules::XpRules;
use super::stats::{LevelSnapshot, UserStats};
use super::streak::{self, StreakTransition};
use crate::error::{CoreError, Result};

/// Durable storage for the single [`UserStats`] record.
///
/// `save_user_stats` must be all-or-nothing: after an error the previously
/// saved record is what the next load returns.
pub trait StatsStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load_user_stats(&self) -> Result<Option<UserStats>>;
    fn save_user_stats(&mut self, stats: &UserStats) -> Result<()>;
}

/// In-process store, for embedding and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStatsStore {
    stats: Option<UserStats>,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(stats: UserStats) -> Self {
        Self { stats: Some(stats) }
    }
}

impl StatsStore for MemoryStatsStore {
    fn load_user_stats(&self) -> Result<Option<UserStats>> {
        Ok(self.stats.clone())
    }

    fn save_user_stats(&mut self, stats: &UserStats) -> Result<()> {
        self.stats = Some(stats.clone());
        Ok(())
    }
}

/// Result of recording a task completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    /// Stats as persisted.
    pub stats: UserStats,
    pub xp_gained: u64,
    pub leveled_up: bool,
    pub streak: StreakTransition,
}

/// XP, level and streak bookkeeping over an injected store.
pub struct Gamification<S> {
    store: Mutex<S>,
    rules: XpRules,
}

impl<S: StatsStore> Gamification<S> {
    pub fn new(store: S, rules: XpRules) -> Self {
        Self {
            store: Mutex::new(store),
            rules,
        }
    }

    pub fn rules(&self) -> &XpRules {
        &self.rules
    }

    /// Current stats, creating and saving the first-run record if none exists.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or the first-run record
    /// cannot be written.
    pub fn stats(&self, now: DateTime<Utc>) -> Result<UserStats> {
        let mut store = self.lock()?;
        self.load_or_create(&mut *store, now)
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Result<LevelSnapshot> {
        Ok(self.stats(now)?.snapshot(&self.rules))
    }

    /// Apply a completed task worth `xp_gained`, with the pomodoros spent on
    /// it, at time `now`.
    ///
    /// XP, level, counters and streak are saved together. On a save error
    /// nothing is returned and the stored record is unchanged.
    pub fn record_completion(
        &self,
        xp_gained: u64,
        pomodoros_completed: u64,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        let mut store = self.lock()?;
        let stats = self.load_or_create(&mut *store, now)?;
        let outcome = self.apply_completion(stats, xp_gained, pomodoros_completed, now);

        if let Err(e) = store.save_user_stats(&outcome.stats) {
            warn!(error = %e, xp_gained, "failed to persist completion");
            return Err(e);
        }

        Self::log_level_up(&outcome);
        Ok(outcome)
    }

    /// Drop the current streak to zero. The longest streak is kept.
    pub fn reset_streak(&self, now: DateTime<Utc>) -> Result<UserStats> {
        let mut store = self.lock()?;
        let mut stats = self.load_or_create(&mut *store, now)?;
        stats.current_streak = 0;
        store.save_user_stats(&stats)?;
        info!(longest = stats.longest_streak, "streak reset");
        Ok(stats)
    }

    /// Run `f` with exclusive access to the store.
    ///
    /// Holds the same lock as [`Self::record_completion`].
    pub fn with_store<R>(&self, f: impl FnOnce(&mut S) -> Result<R>) -> Result<R> {
        let mut store = self.lock()?;
        f(&mut *store)
    }

    pub fn into_inner(self) -> Result<S> {
        self.store
            .into_inner()
            .map_err(|_| CoreError::Custom("stats store lock poisoned".into()))
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, S>> {
        self.store
            .lock()
            .map_err(|_| CoreError::Custom("stats store lock poisoned".into()))
    }

    fn load_or_create(&self, store: &mut S, now: DateTime<Utc>) -> Result<UserStats> {
        let existed = store.load_user_stats()?;
        let is_new = existed.is_none();
        let stats = self.prepare_stats(existed, now);
        if is_new {
            store.save_user_stats(&stats)?;
            info!("created initial user stats");
        }
        Ok(stats)
    }

    /// Loaded stats with their level re-derived, or a first-run record.
    pub(crate) fn prepare_stats(
        &self,
        loaded: Option<UserStats>,
        now: DateTime<Utc>,
    ) -> UserStats {
        match loaded {
            Some(mut stats) => {
                stats.normalize(&self.rules);
                stats
            }
            None => UserStats::new(now),
        }
    }

    /// Add one completed task to `stats`. Nothing is persisted here.
    pub(crate) fn apply_completion(
        &self,
        mut stats: UserStats,
        xp_gained: u64,
        pomodoros_completed: u64,
        now: DateTime<Utc>,
    ) -> CompletionOutcome {
        // Level-up is judged against the XP held before this completion.
        let leveled_up = self.rules.will_level_up(stats.total_xp, xp_gained);

        stats.total_xp = stats.total_xp.saturating_add(xp_gained);
        stats.level = self.rules.calculate_level(stats.total_xp);
        stats.total_tasks_completed = stats.total_tasks_completed.saturating_add(1);
        stats.total_pomodoros_completed = stats
            .total_pomodoros_completed
            .saturating_add(pomodoros_completed);
        let streak = streak::advance(&mut stats, now);

        CompletionOutcome {
            stats,
            xp_gained,
            leveled_up,
            streak,
        }
    }

    pub(crate) fn log_level_up(outcome: &CompletionOutcome) {
        if outcome.leveled_up {
            info!(
                level = outcome.stats.level,
                total_xp = outcome.stats.total_xp,
                "level up"
            );
        }
    }
}
