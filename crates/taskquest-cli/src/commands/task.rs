//! Task management commands for CLI.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::Serialize;
use taskquest_core::task::query;
use taskquest_core::{
    CompletionOutcome, NewTask, Priority, RecurringPattern, Task, TaskFilters, TaskStatus,
    ValidationError,
};

use super::open_engine;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Task title
        title: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Estimated minutes (default: 30)
        #[arg(long, default_value = "30")]
        minutes: u32,
        /// Category id (default: personal)
        #[arg(long, default_value = "personal")]
        category: String,
        /// Priority: low, medium or high (default: medium)
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Deadline as RFC 3339, e.g. 2026-01-05T18:00:00Z
        #[arg(long)]
        deadline: Option<String>,
        /// Repeat pattern: none, daily, weekly or monthly
        #[arg(long, default_value = "none")]
        recurring: RecurringPattern,
    },
    /// List tasks, newest first
    List {
        /// Filter by status (todo, in_progress, completed)
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Filter by priority
        #[arg(long)]
        priority: Option<Priority>,
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
        /// Case-insensitive search in title and description
        #[arg(long)]
        search: Option<String>,
        /// Only open tasks that are high priority or due within 24 hours
        #[arg(long)]
        urgent: bool,
        /// Only open tasks (todo or in progress)
        #[arg(long)]
        today: bool,
    },
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Update a task and recompute its XP reward
    Update {
        /// Task ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New estimated minutes
        #[arg(long)]
        minutes: Option<u32>,
        /// New category
        #[arg(long)]
        category: Option<String>,
        /// New priority
        #[arg(long)]
        priority: Option<Priority>,
        /// New deadline as RFC 3339
        #[arg(long, conflicts_with = "clear_deadline")]
        deadline: Option<String>,
        /// Remove the deadline
        #[arg(long)]
        clear_deadline: bool,
        /// New status (todo or in_progress)
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Complete a task and award its XP
    ///
    /// The task and the stats are written together; on failure neither
    /// changes.
    Complete {
        /// Task ID
        id: String,
    },
}

#[derive(Serialize)]
struct CompletionReport<'a> {
    task: &'a Task,
    #[serde(flatten)]
    outcome: &'a CompletionOutcome,
}

fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| ValidationError::invalid("deadline", e.to_string()))
}

fn not_found(id: String) -> ValidationError {
    ValidationError::NotFound { kind: "Task", id }
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    let now = Utc::now();

    match action {
        TaskAction::Create {
            title,
            description,
            minutes,
            category,
            priority,
            deadline,
            recurring,
        } => {
            let input = NewTask {
                title,
                description,
                estimated_minutes: minutes,
                category,
                priority,
                deadline: deadline.as_deref().map(parse_deadline).transpose()?,
                recurring_pattern: recurring,
            };
            let task = engine.create_task(input, now)?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List {
            status,
            priority,
            category,
            search,
            urgent,
            today,
        } => {
            let tasks = engine.with_store(|db| db.list_tasks())?;
            let filters = TaskFilters {
                status: status.into_iter().collect(),
                priority: priority.into_iter().collect(),
                category: category.into_iter().collect(),
                date_range: None,
                search_query: search,
            };
            let mut selected = query::filter(&tasks, &filters);
            if urgent {
                let hot = query::urgent(&tasks, now);
                selected.retain(|t| hot.iter().any(|u| u.id == t.id));
            }
            if today {
                let open = query::today(&tasks);
                selected.retain(|t| open.iter().any(|o| o.id == t.id));
            }
            println!("{}", serde_json::to_string_pretty(&selected)?);
        }
        TaskAction::Get { id } => match engine.with_store(|db| db.get_task(&id))? {
            Some(task) => println!("{}", serde_json::to_string_pretty(&task)?),
            None => return Err(not_found(id).into()),
        },
        TaskAction::Update {
            id,
            title,
            description,
            minutes,
            category,
            priority,
            deadline,
            clear_deadline,
            status,
        } => {
            let mut task = engine
                .with_store(|db| db.get_task(&id))?
                .ok_or_else(|| not_found(id.clone()))?;

            if let Some(t) = title {
                let t = t.trim().to_string();
                if t.is_empty() {
                    return Err(ValidationError::invalid("title", "must not be empty").into());
                }
                task.title = t;
            }
            if let Some(d) = description {
                task.description = Some(d).filter(|d| !d.trim().is_empty());
            }
            if let Some(m) = minutes {
                task.estimated_minutes = m;
            }
            if let Some(c) = category {
                task.category = c;
            }
            if let Some(p) = priority {
                task.priority = p;
            }
            if let Some(d) = deadline {
                task.deadline = Some(parse_deadline(&d)?);
            }
            if clear_deadline {
                task.deadline = None;
            }
            if let Some(s) = status {
                if s == TaskStatus::Completed {
                    return Err("use `taskquest task complete` to complete a task".into());
                }
                if task.is_completed() {
                    return Err(ValidationError::AlreadyCompleted(task.id.clone()).into());
                }
                task.status = s;
            }

            if !task.is_completed() {
                let streak = engine.stats(now)?.current_streak;
                task.refresh_xp_reward(engine.rules(), streak, now);
            }
            engine.with_store(|db| db.update_task(&task))?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::Delete { id } => {
            engine.with_store(|db| db.delete_task(&id))?;
            println!("Task deleted: {id}");
        }
        TaskAction::Complete { id } => {
            let (task, outcome) = engine.complete_task(&id, now)?;
            let report = CompletionReport {
                task: &task,
                outcome: &outcome,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
