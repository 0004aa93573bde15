//! Experience points, levels and daily streaks.
//!
//! - [`rules`]: the configurable constants and level table
//! - [`xp`]: pure XP and level functions
//! - [`streak`]: the daily streak state machine
//! - [`stats`]: the persisted [`UserStats`] record
//! - [`engine`]: completion orchestration over a [`StatsStore`]

pub mod engine;
pub mod rules;
pub mod stats;
pub mod streak;
pub mod xp;

pub use engine::{CompletionOutcome, Gamification, MemoryStatsStore, StatsStore};
pub use rules::{LevelThreshold, PriorityWeights, XpRules, DEFAULT_LEVELS};
pub use stats::{LevelSnapshot, UserStats};
pub use streak::{is_streak_in_danger, StreakTransition};
pub use xp::{format_xp, level_title, TaskXpInput};
