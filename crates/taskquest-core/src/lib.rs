//! # TaskQuest Core Library
//!
//! Business logic for TaskQuest, a task manager that rewards finished work
//! with experience points, levels and daily streaks. The CLI is a thin
//! layer over this crate.
//!
//! ## Architecture
//!
//! - **Gamification**: pure XP/level functions over a configurable rule
//!   table, a daily streak state machine, and [`Gamification`], which applies
//!   task completions to the persisted [`UserStats`] one at a time
//! - **Tasks**: the task model with its stored XP reward, categories,
//!   reusable templates, and in-memory filters and queries
//! - **Pomodoro**: focus and break sessions logged against tasks
//! - **Storage**: SQLite for tasks, sessions, templates and stats, TOML for
//!   configuration
//!
//! ## Key Components
//!
//! - [`XpRules`]: XP constants and the level threshold table
//! - [`Gamification`]: completion orchestration over a [`StatsStore`]
//! - [`Database`]: task and stats persistence; completing a task through
//!   `Gamification<Database>` updates both in one transaction
//! - [`Config`]: application configuration management

pub mod error;
pub mod gamification;
pub mod pomodoro;
pub mod storage;
pub mod task;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use gamification::{
    CompletionOutcome, Gamification, LevelSnapshot, LevelThreshold, MemoryStatsStore, StatsStore,
    StreakTransition, TaskXpInput, UserStats, XpRules,
};
pub use pomodoro::{PomodoroSession, SessionKind};
pub use storage::{Config, Database, PomodoroConfig, SettingKey, Settings};
pub use task::{
    Category, NewTask, Priority, RecurringPattern, Task, TaskFilters, TaskStatus, Template,
    TemplateTask,
};
