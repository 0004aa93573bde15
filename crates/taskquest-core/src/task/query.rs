//! In-memory task queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Priority, Task, TaskStatus};

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Filter criteria. Empty lists and `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFilters {
    #[serde(default)]
    pub status: Vec<TaskStatus>,
    #[serde(default)]
    pub priority: Vec<Priority>,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub search_query: Option<String>,
}

impl TaskFilters {
    pub fn matches(&self, task: &Task) -> bool {
        if !self.status.is_empty() && !self.status.contains(&task.status) {
            return false;
        }
        if !self.priority.is_empty() && !self.priority.contains(&task.priority) {
            return false;
        }
        if !self.category.is_empty() && !self.category.contains(&task.category) {
            return false;
        }
        if let Some(range) = self.date_range {
            let date = task.deadline.unwrap_or(task.created_at);
            if date < range.start || date > range.end {
                return false;
            }
        }
        if let Some(query) = self.search_query.as_deref().filter(|q| !q.is_empty()) {
            let query = query.to_lowercase();
            let in_title = task.title.to_lowercase().contains(&query);
            let in_description = task
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&query))
                .unwrap_or(false);
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }
}

pub fn filter<'a>(tasks: &'a [Task], filters: &TaskFilters) -> Vec<&'a Task> {
    tasks.iter().filter(|t| filters.matches(t)).collect()
}

pub fn by_status(tasks: &[Task], status: TaskStatus) -> Vec<&Task> {
    tasks.iter().filter(|t| t.status == status).collect()
}

pub fn by_category<'a>(tasks: &'a [Task], category: &str) -> Vec<&'a Task> {
    tasks.iter().filter(|t| t.category == category).collect()
}

/// Open work: anything not yet completed.
pub fn today(tasks: &[Task]) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| matches!(t.status, TaskStatus::Todo | TaskStatus::InProgress))
        .collect()
}

/// Open tasks that are high priority or have a deadline inside the urgency window.
pub fn urgent(tasks: &[Task], now: DateTime<Utc>) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| !t.is_completed())
        .filter(|t| t.priority == Priority::High || t.is_urgent(now))
        .collect()
}
