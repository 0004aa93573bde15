//! Reusable task routines.
//!
//! A [`Template`] stores task blueprints without ids or timestamps.
//! Using it creates fresh tasks, each with its own XP reward. Tasks from a
//! chained template share a `chain_id` and point at their successor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{NewTask, Priority, RecurringPattern, Task, DEFAULT_CATEGORY, DEFAULT_ESTIMATED_MINUTES};
use crate::error::ValidationError;
use crate::gamification::XpRules;

/// One task inside a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_minutes")]
    pub estimated_minutes: u32,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub recurring_pattern: RecurringPattern,
}

fn default_minutes() -> u32 {
    DEFAULT_ESTIMATED_MINUTES
}
fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}
fn default_priority() -> Priority {
    Priority::Medium
}

impl TemplateTask {
    /// A blueprint with default minutes, category and priority.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            estimated_minutes: DEFAULT_ESTIMATED_MINUTES,
            category: DEFAULT_CATEGORY.to_string(),
            priority: Priority::Medium,
            recurring_pattern: RecurringPattern::None,
        }
    }

    /// Copy the reusable attributes of an existing task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            estimated_minutes: task.estimated_minutes,
            category: task.category.clone(),
            priority: task.priority,
            recurring_pattern: task.recurring_pattern,
        }
    }

    fn to_new_task(&self) -> NewTask {
        NewTask {
            title: self.title.clone(),
            description: self.description.clone(),
            estimated_minutes: self.estimated_minutes,
            category: self.category.clone(),
            priority: self.priority,
            deadline: None,
            recurring_pattern: self.recurring_pattern,
        }
    }
}

/// A named list of task blueprints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub tasks: Vec<TemplateTask>,
    pub is_chained: bool,
    pub created_at: DateTime<Utc>,
}

impl Template {
    /// # Errors
    /// Fails on a blank name, an empty task list, or a blank task title.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        tasks: Vec<TemplateTask>,
        is_chained: bool,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::invalid("template.name", "must not be empty"));
        }
        if tasks.is_empty() {
            return Err(ValidationError::invalid("template.tasks", "needs at least one task"));
        }
        if tasks.iter().any(|t| t.title.trim().is_empty()) {
            return Err(ValidationError::invalid("template.tasks", "task titles must not be empty"));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            description: description.filter(|d| !d.trim().is_empty()),
            tasks,
            is_chained,
            created_at: now,
        })
    }

    /// Build new tasks from this template, in template order.
    ///
    /// Rewards use `current_streak` like any other new task. For a chained
    /// template every call starts a new chain.
    pub fn instantiate(
        &self,
        rules: &XpRules,
        current_streak: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>, ValidationError> {
        let mut tasks = self
            .tasks
            .iter()
            .map(|blueprint| Task::create(blueprint.to_new_task(), rules, current_streak, now))
            .collect::<Result<Vec<_>, _>>()?;

        if self.is_chained {
            let chain_id = Uuid::new_v4().to_string();
            let next_ids: Vec<Option<String>> = tasks
                .iter()
                .skip(1)
                .map(|t| Some(t.id.clone()))
                .chain(std::iter::once(None))
                .collect();
            for (order, (task, next)) in tasks.iter_mut().zip(next_ids).enumerate() {
                task.chain_id = Some(chain_id.clone());
                task.chain_order = Some(order as u32);
                task.next_task_id = next;
            }
        }
        Ok(tasks)
    }
}

/// Starter routines a user can install with one command.
pub fn default_templates(now: DateTime<Utc>) -> Vec<Template> {
    use Priority::{High, Medium};

    let routine = |name: &str, description: &str, chained: bool, items: &[(&str, u32, &str, Priority)]| {
        Template {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: Some(description.to_string()),
            tasks: items
                .iter()
                .map(|&(title, minutes, category, priority)| TemplateTask {
                    title: title.to_string(),
                    description: None,
                    estimated_minutes: minutes,
                    category: category.to_string(),
                    priority,
                    recurring_pattern: RecurringPattern::Daily,
                })
                .collect(),
            is_chained: chained,
            created_at: now,
        }
    };

    vec![
        routine(
            "Morning Routine",
            "Start your day right",
            true,
            &[
                ("Wake up and make bed", 5, "personal", Medium),
                ("Morning exercise", 20, "health", High),
                ("Healthy breakfast", 15, "health", High),
                ("Review daily goals", 10, "personal", High),
            ],
        ),
        routine(
            "Job Search Routine",
            "Daily job hunting tasks",
            false,
            &[
                ("Update resume/CV", 30, "work", High),
                ("Search for job openings", 45, "work", High),
                ("Apply to 3 jobs", 60, "work", High),
                ("Network on LinkedIn", 20, "work", Medium),
            ],
        ),
        routine(
            "Evening Wind-down",
            "Relax and prepare for tomorrow",
            true,
            &[
                ("Review completed tasks", 10, "personal", Medium),
                ("Plan tomorrow", 15, "personal", High),
                ("Relaxation/meditation", 20, "health", Medium),
                ("Prepare for bed", 15, "personal", Medium),
            ],
        ),
    ]
}
