//! Task model.
//!
//! A task carries the XP reward it will grant on completion. The reward is
//! computed when the task is created or edited (see [`Task::refresh_xp_reward`])
//! and stored with the record, so completing a task never re-runs the XP
//! formula.

pub mod query;
pub mod template;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::gamification::{TaskXpInput, XpRules};

pub use query::TaskFilters;
pub use template::{Template, TemplateTask};

/// Task priority tier. Drives the XP priority weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ValidationError::invalid(
                "priority",
                format!("expected low, medium or high, got '{other}'"),
            )),
        }
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "completed" | "done" => Ok(TaskStatus::Completed),
            other => Err(ValidationError::invalid(
                "status",
                format!("expected todo, in_progress or completed, got '{other}'"),
            )),
        }
    }
}

/// How often a recurring task repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringPattern {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl RecurringPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringPattern::None => "none",
            RecurringPattern::Daily => "daily",
            RecurringPattern::Weekly => "weekly",
            RecurringPattern::Monthly => "monthly",
        }
    }
}

impl FromStr for RecurringPattern {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(RecurringPattern::None),
            "daily" => Ok(RecurringPattern::Daily),
            "weekly" => Ok(RecurringPattern::Weekly),
            "monthly" => Ok(RecurringPattern::Monthly),
            other => Err(ValidationError::invalid(
                "recurring_pattern",
                format!("unknown pattern '{other}'"),
            )),
        }
    }
}

/// A task tracked by the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Estimated effort in minutes.
    pub estimated_minutes: u32,
    pub category: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub deadline: Option<DateTime<Utc>>,
    /// XP granted on completion, fixed at create/update time.
    pub xp_reward: u64,
    pub pomodoros_completed: u32,
    pub is_recurring: bool,
    pub recurring_pattern: RecurringPattern,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Set on tasks created together from a chained template.
    pub chain_id: Option<String>,
    pub chain_order: Option<u32>,
    pub next_task_id: Option<String>,
}

/// User-supplied fields for a new task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub estimated_minutes: u32,
    pub category: String,
    pub priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
    pub recurring_pattern: RecurringPattern,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            estimated_minutes: DEFAULT_ESTIMATED_MINUTES,
            category: DEFAULT_CATEGORY.to_string(),
            priority: Priority::Medium,
            deadline: None,
            recurring_pattern: RecurringPattern::None,
        }
    }
}

/// Estimated time used when the caller gives none.
pub const DEFAULT_ESTIMATED_MINUTES: u32 = 30;

/// Category used when the caller gives none.
pub const DEFAULT_CATEGORY: &str = "personal";

/// Window before a deadline in which a task counts as urgent.
pub const URGENT_WINDOW_HOURS: i64 = 24;

impl Task {
    /// Build a task from user input, computing its XP reward.
    ///
    /// `current_streak` feeds the streak multiplier, so tasks created
    /// during a long streak are worth more.
    ///
    /// # Errors
    /// Returns a validation error if the title is blank.
    pub fn create(
        input: NewTask,
        rules: &XpRules,
        current_streak: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::invalid("title", "must not be empty"));
        }

        let mut task = Task {
            id: Uuid::new_v4().to_string(),
            title,
            description: input.description.filter(|d| !d.trim().is_empty()),
            estimated_minutes: input.estimated_minutes,
            category: input.category,
            priority: input.priority,
            status: TaskStatus::Todo,
            deadline: input.deadline,
            xp_reward: 0,
            pomodoros_completed: 0,
            is_recurring: input.recurring_pattern != RecurringPattern::None,
            recurring_pattern: input.recurring_pattern,
            created_at: now,
            completed_at: None,
            chain_id: None,
            chain_order: None,
            next_task_id: None,
        };
        task.refresh_xp_reward(rules, current_streak, now);
        Ok(task)
    }

    /// Whether the deadline falls inside the urgency window at `now`.
    pub fn is_urgent(&self, now: DateTime<Utc>) -> bool {
        self.deadline
            .map(|deadline| is_deadline_urgent(deadline, now))
            .unwrap_or(false)
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Recompute `xp_reward` from the current attributes.
    pub fn refresh_xp_reward(&mut self, rules: &XpRules, current_streak: u32, now: DateTime<Utc>) {
        let input = TaskXpInput {
            estimated_minutes: self.estimated_minutes,
            priority: self.priority,
            is_urgent: self.is_urgent(now),
            current_streak_days: current_streak,
        };
        self.xp_reward = rules.calculate_task_xp(&input);
    }

    /// Mark the task completed at `now`.
    ///
    /// # Errors
    /// Fails if the task is already completed, so a second completion can't
    /// award XP again.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if self.is_completed() {
            return Err(ValidationError::AlreadyCompleted(self.id.clone()));
        }
        self.status = TaskStatus::Completed;
        self.completed_at = Some(now);
        Ok(())
    }
}

/// A deadline is urgent when it is still ahead of `now` and at most
/// [`URGENT_WINDOW_HOURS`] away.
pub fn is_deadline_urgent(deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let remaining = deadline - now;
    remaining > Duration::zero() && remaining <= Duration::hours(URGENT_WINDOW_HOURS)
}

/// A task category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
}

impl Category {
    /// Build a category, rejecting a blank id or name.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        color: impl Into<String>,
        icon: Option<String>,
    ) -> Result<Self, ValidationError> {
        let id = id.into().trim().to_lowercase();
        let name = name.into().trim().to_string();
        if id.is_empty() {
            return Err(ValidationError::invalid("category.id", "must not be empty"));
        }
        if name.is_empty() {
            return Err(ValidationError::invalid("category.name", "must not be empty"));
        }
        Ok(Self {
            id,
            name,
            color: color.into(),
            icon: icon.filter(|i| !i.trim().is_empty()),
        })
    }
}

/// Categories seeded into a fresh database.
pub fn default_categories() -> Vec<Category> {
    [
        ("work", "Work", "#4A9FFF", "briefcase"),
        ("personal", "Personal", "#00D9A3", "person"),
        ("health", "Health", "#FF6B6B", "heart"),
        ("learning", "Learning", "#FFB800", "book"),
        ("chores", "Chores", "#9B59B6", "home"),
        ("social", "Social", "#E91E63", "people"),
    ]
    .into_iter()
    .map(|(id, name, color, icon)| Category {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
        icon: Some(icon.to_string()),
    })
    .collect()
}
