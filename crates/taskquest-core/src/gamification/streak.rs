//! Daily activity streak.
//!
//! Day boundaries are measured as elapsed 24-hour periods since the last
//! activity, not calendar dates. A completion 23 hours after the previous
//! one therefore counts as the same day even if midnight passed in between.

use chrono::{DateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::stats::UserStats;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Local hour after which an idle day puts the streak in danger.
pub const STREAK_DANGER_HOUR: u32 = 20;

/// What a completion did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTransition {
    /// Same day as the last activity.
    Unchanged,
    /// Exactly one day later; streak grew by one.
    Extended,
    /// A gap of two or more days; streak restarted at one.
    Reset,
}

/// Whole days elapsed between `last` and `now`, floored.
///
/// Negative when `now` is before `last`.
pub fn elapsed_days(last: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - last).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

/// Apply one completion at `now` to the streak counters.
///
/// A clock that moved backwards (negative elapsed days) is treated like a
/// gap and resets the streak.
pub fn advance(stats: &mut UserStats, now: DateTime<Utc>) -> StreakTransition {
    let days = elapsed_days(stats.last_activity_date, now);
    let transition = match days {
        0 => StreakTransition::Unchanged,
        1 => {
            stats.current_streak = stats.current_streak.saturating_add(1);
            StreakTransition::Extended
        }
        _ => {
            stats.current_streak = 1;
            StreakTransition::Reset
        }
    };
    stats.longest_streak = stats.longest_streak.max(stats.current_streak);
    stats.last_activity_date = now;

    debug!(
        days,
        ?transition,
        current = stats.current_streak,
        longest = stats.longest_streak,
        "streak advanced"
    );
    transition
}

/// True when nothing was done on `now`'s calendar day and it is already
/// evening there.
pub fn is_streak_in_danger<Tz: TimeZone>(last_activity: DateTime<Utc>, now: &DateTime<Tz>) -> bool {
    let last_local = last_activity.with_timezone(&now.timezone());
    last_local.date_naive() != now.date_naive() && now.hour() >= STREAK_DANGER_HOUR
}
