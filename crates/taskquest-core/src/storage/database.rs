//! SQLite storage for tasks and the user stats record.
//!
//! Provides persistent storage for:
//! - Tasks (create, update, delete) and their pomodoro sessions
//! - Categories, seeded with the defaults on first open
//! - Task templates
//! - The single [`UserStats`] record, kept in the key-value table
//!
//! Each query lives in a helper taking a `&Connection`, so a
//! [`rusqlite::Transaction`] can run several of them as one unit.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use super::{data_dir, migrations};
use crate::error::{CoreError, DatabaseError, Result, ValidationError};
use crate::gamification::{CompletionOutcome, Gamification, StatsStore, UserStats};
use crate::pomodoro::{PomodoroSession, SessionKind};
use crate::task::{Category, NewTask, Priority, RecurringPattern, Task, TaskStatus, Template};

/// Key of the stats record in the `kv` table.
pub const USER_STATS_KEY: &str = "user_stats";

const TASK_COLUMNS: &str = "id, title, description, estimated_minutes, category, priority,
    status, deadline, xp_reward, pomodoros_completed, is_recurring, recurring_pattern,
    created_at, completed_at, chain_id, chain_order, next_task_id";

const SESSION_COLUMNS: &str =
    "id, task_id, kind, started_at, ended_at, duration_minutes, is_completed";

/// SQLite database handle. The connection closes when the value is dropped.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/taskquest.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("taskquest.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened database");
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Run `f` in one transaction. Nothing is written unless `f` succeeds.
    pub(crate) fn in_transaction<R>(
        &mut self,
        f: impl FnOnce(&Connection) -> Result<R>,
    ) -> Result<R> {
        let tx = self.conn.transaction()?;
        let value = f(&*tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        kv_get(&self.conn, key)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        kv_set(&self.conn, key, value)
    }

    // ── Tasks ──────────────────────────────────────────────────────────

    /// Insert a task.
    ///
    /// # Errors
    /// Returns [`ValidationError::NotFound`] if its category is not stored.
    pub fn create_task(&self, task: &Task) -> Result<()> {
        insert_task(&self.conn, task)
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        get_task(&self.conn, id)
    }

    /// All tasks, newest first.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC, rowid DESC"
        ))?;
        let tasks = stmt
            .query_map([], row_to_task)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Overwrite a stored task.
    ///
    /// # Errors
    /// Returns [`ValidationError::NotFound`] if no task has this id or its
    /// category is not stored.
    pub fn update_task(&self, task: &Task) -> Result<()> {
        update_task(&self.conn, task)
    }

    /// Delete a task together with its sessions.
    pub fn delete_task(&self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(not_found("Task", id));
        }
        Ok(())
    }

    // ── Pomodoro sessions ──────────────────────────────────────────────

    /// Store a session and recount the task's completed focus sessions.
    ///
    /// Returns the task with its refreshed `pomodoros_completed`.
    ///
    /// # Errors
    /// Fails if the task does not exist or is already completed.
    pub fn record_session(&mut self, session: &PomodoroSession) -> Result<Task> {
        self.in_transaction(|conn| {
            let mut task = get_task(conn, &session.task_id)?
                .ok_or_else(|| not_found("Task", &session.task_id))?;
            if task.is_completed() {
                return Err(ValidationError::AlreadyCompleted(task.id).into());
            }

            conn.execute(
                &format!(
                    "INSERT INTO pomodoro_sessions ({SESSION_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                params![
                    session.id,
                    session.task_id,
                    session.kind.as_str(),
                    session.started_at.to_rfc3339(),
                    session.ended_at.map(|d| d.to_rfc3339()),
                    session.duration_minutes,
                    session.is_completed,
                ],
            )?;

            task.pomodoros_completed = count_pomodoros(conn, &task.id)?;
            conn.execute(
                "UPDATE tasks SET pomodoros_completed = ?2 WHERE id = ?1",
                params![task.id, task.pomodoros_completed],
            )?;
            Ok(task)
        })
    }

    /// Sessions for a task, newest first.
    pub fn sessions_for_task(&self, task_id: &str) -> Result<Vec<PomodoroSession>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM pomodoro_sessions
             WHERE task_id = ?1 ORDER BY started_at DESC, rowid DESC"
        ))?;
        let sessions = stmt
            .query_map(params![task_id], row_to_session)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    // ── Categories ─────────────────────────────────────────────────────

    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color, icon FROM categories ORDER BY rowid")?;
        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    color: row.get(2)?,
                    icon: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// # Errors
    /// Fails if a category with the same id exists.
    pub fn create_category(&self, category: &Category) -> Result<()> {
        if category_exists(&self.conn, &category.id)? {
            return Err(ValidationError::invalid(
                "category.id",
                format!("'{}' already exists", category.id),
            )
            .into());
        }
        self.conn.execute(
            "INSERT INTO categories (id, name, color, icon) VALUES (?1, ?2, ?3, ?4)",
            params![category.id, category.name, category.color, category.icon],
        )?;
        Ok(())
    }

    // ── Templates ──────────────────────────────────────────────────────

    pub fn create_template(&self, template: &Template) -> Result<()> {
        let tasks = serde_json::to_string(&template.tasks)?;
        self.conn.execute(
            "INSERT INTO templates (id, name, description, tasks, is_chained, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                template.id,
                template.name,
                template.description,
                tasks,
                template.is_chained,
                template.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_template(&self, id: &str) -> Result<Option<Template>> {
        get_template(&self.conn, id)
    }

    /// All templates, newest first.
    pub fn list_templates(&self) -> Result<Vec<Template>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, tasks, is_chained, created_at
             FROM templates ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map([], template_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(TemplateRow::decode).collect()
    }

    pub fn delete_template(&self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM templates WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(not_found("Template", id));
        }
        Ok(())
    }
}

impl StatsStore for Database {
    fn load_user_stats(&self) -> Result<Option<UserStats>> {
        load_user_stats(&self.conn)
    }

    fn save_user_stats(&mut self, stats: &UserStats) -> Result<()> {
        self.in_transaction(|conn| save_user_stats(conn, stats))
    }
}

/// Task workflows that must see the stats record and the task tables in
/// one transaction.
impl Gamification<Database> {
    /// Create a task whose reward uses the stored current streak.
    pub fn create_task(&self, input: NewTask, now: DateTime<Utc>) -> Result<Task> {
        let db = self.lock()?;
        let streak = current_streak(&db.conn)?;
        let task = Task::create(input, self.rules(), streak, now)?;
        insert_task(&db.conn, &task)?;
        Ok(task)
    }

    /// Mark a task completed and award its XP, all or nothing.
    ///
    /// The task update and the stats write share one transaction: if either
    /// fails the task stays open and the stats are untouched, so the whole
    /// call can be retried.
    ///
    /// # Errors
    /// Fails if the task does not exist or is already completed, or if the
    /// stats record cannot be read or written.
    pub fn complete_task(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<(Task, CompletionOutcome)> {
        let mut db = self.lock()?;
        let result = db.in_transaction(|conn| {
            let mut task = get_task(conn, id)?.ok_or_else(|| not_found("Task", id))?;
            task.complete(now)?;
            update_task(conn, &task)?;

            let stats = self.prepare_stats(load_user_stats(conn)?, now);
            let outcome = self.apply_completion(
                stats,
                task.xp_reward,
                u64::from(task.pomodoros_completed),
                now,
            );
            save_user_stats(conn, &outcome.stats)?;
            Ok((task, outcome))
        });

        match result {
            Ok((task, outcome)) => {
                info!(task = %task.id, xp = outcome.xp_gained, "task completed");
                Self::log_level_up(&outcome);
                Ok((task, outcome))
            }
            Err(e) => {
                warn!(task = %id, error = %e, "task completion rolled back");
                Err(e)
            }
        }
    }

    /// Create every task of a template in one transaction.
    ///
    /// # Errors
    /// Fails if the template does not exist or any of its categories is
    /// unknown. No task is created in that case.
    pub fn use_template(&self, template_id: &str, now: DateTime<Utc>) -> Result<Vec<Task>> {
        let mut db = self.lock()?;
        db.in_transaction(|conn| {
            let template =
                get_template(conn, template_id)?.ok_or_else(|| not_found("Template", template_id))?;
            let streak = current_streak(conn)?;
            let tasks = template.instantiate(self.rules(), streak, now)?;
            for task in &tasks {
                insert_task(conn, task)?;
            }
            debug!(template = %template.name, count = tasks.len(), "template used");
            Ok(tasks)
        })
    }
}

fn not_found(kind: &'static str, id: &str) -> CoreError {
    ValidationError::NotFound {
        kind,
        id: id.to_string(),
    }
    .into()
}

fn kv_get(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get::<_, String>(0)
        })
        .optional()?;
    Ok(value)
}

fn kv_set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

fn load_user_stats(conn: &Connection) -> Result<Option<UserStats>> {
    let Some(raw) = kv_get(conn, USER_STATS_KEY)? else {
        return Ok(None);
    };
    let stats = serde_json::from_str(&raw).map_err(|e| DatabaseError::CorruptRecord {
        key: USER_STATS_KEY.to_string(),
        message: e.to_string(),
    })?;
    Ok(Some(stats))
}

fn save_user_stats(conn: &Connection, stats: &UserStats) -> Result<()> {
    let json = serde_json::to_string(stats)?;
    kv_set(conn, USER_STATS_KEY, &json)
}

/// Stored current streak; 0 before the first stats record exists.
fn current_streak(conn: &Connection) -> Result<u32> {
    Ok(load_user_stats(conn)?.map_or(0, |s| s.current_streak))
}

fn category_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM categories WHERE id = ?1", params![id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn ensure_category(conn: &Connection, id: &str) -> Result<()> {
    if category_exists(conn, id)? {
        Ok(())
    } else {
        Err(not_found("Category", id))
    }
}

fn insert_task(conn: &Connection, task: &Task) -> Result<()> {
    ensure_category(conn, &task.category)?;
    conn.execute(
        &format!(
            "INSERT INTO tasks ({TASK_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
        ),
        params![
            task.id,
            task.title,
            task.description,
            task.estimated_minutes,
            task.category,
            task.priority.as_str(),
            task.status.as_str(),
            task.deadline.map(|d| d.to_rfc3339()),
            task.xp_reward,
            task.pomodoros_completed,
            task.is_recurring,
            task.recurring_pattern.as_str(),
            task.created_at.to_rfc3339(),
            task.completed_at.map(|d| d.to_rfc3339()),
            task.chain_id,
            task.chain_order,
            task.next_task_id,
        ],
    )?;
    Ok(())
}

fn get_task(conn: &Connection, id: &str) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            params![id],
            row_to_task,
        )
        .optional()?;
    Ok(task)
}

fn update_task(conn: &Connection, task: &Task) -> Result<()> {
    ensure_category(conn, &task.category)?;
    let changed = conn.execute(
        "UPDATE tasks
         SET title = ?2, description = ?3, estimated_minutes = ?4, category = ?5,
             priority = ?6, status = ?7, deadline = ?8, xp_reward = ?9,
             pomodoros_completed = ?10, is_recurring = ?11, recurring_pattern = ?12,
             completed_at = ?13, chain_id = ?14, chain_order = ?15, next_task_id = ?16
         WHERE id = ?1",
        params![
            task.id,
            task.title,
            task.description,
            task.estimated_minutes,
            task.category,
            task.priority.as_str(),
            task.status.as_str(),
            task.deadline.map(|d| d.to_rfc3339()),
            task.xp_reward,
            task.pomodoros_completed,
            task.is_recurring,
            task.recurring_pattern.as_str(),
            task.completed_at.map(|d| d.to_rfc3339()),
            task.chain_id,
            task.chain_order,
            task.next_task_id,
        ],
    )?;
    if changed == 0 {
        return Err(not_found("Task", &task.id));
    }
    Ok(())
}

fn count_pomodoros(conn: &Connection, task_id: &str) -> Result<u32> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM pomodoro_sessions
         WHERE task_id = ?1 AND kind = ?2 AND is_completed = 1",
        params![task_id, SessionKind::Focus.as_str()],
        |row| row.get::<_, u32>(0),
    )?;
    Ok(count)
}

fn get_template(conn: &Connection, id: &str) -> Result<Option<Template>> {
    conn.query_row(
        "SELECT id, name, description, tasks, is_chained, created_at
         FROM templates WHERE id = ?1",
        params![id],
        template_row,
    )
    .optional()?
    .map(TemplateRow::decode)
    .transpose()
}

/// A template row before its task list is decoded.
struct TemplateRow {
    id: String,
    name: String,
    description: Option<String>,
    tasks: String,
    is_chained: bool,
    created_at: DateTime<Utc>,
}

impl TemplateRow {
    fn decode(self) -> Result<Template> {
        let tasks = serde_json::from_str(&self.tasks).map_err(|e| DatabaseError::CorruptRecord {
            key: format!("templates/{}", self.id),
            message: e.to_string(),
        })?;
        Ok(Template {
            id: self.id,
            name: self.name,
            description: self.description,
            tasks,
            is_chained: self.is_chained,
            created_at: self.created_at,
        })
    }
}

fn template_row(row: &Row) -> rusqlite::Result<TemplateRow> {
    let created_at: String = row.get(5)?;
    Ok(TemplateRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        tasks: row.get(3)?,
        is_chained: row.get(4)?,
        created_at: parse_timestamp(5, &created_at)?,
    })
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_column<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = ValidationError>,
{
    raw.parse().map_err(|e: ValidationError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let priority: String = row.get(5)?;
    let status: String = row.get(6)?;
    let deadline: Option<String> = row.get(7)?;
    let pattern: String = row.get(11)?;
    let created_at: String = row.get(12)?;
    let completed_at: Option<String> = row.get(13)?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        estimated_minutes: row.get(3)?,
        category: row.get(4)?,
        priority: parse_column::<Priority>(5, &priority)?,
        status: parse_column::<TaskStatus>(6, &status)?,
        deadline: deadline.as_deref().map(|d| parse_timestamp(7, d)).transpose()?,
        xp_reward: row.get(8)?,
        pomodoros_completed: row.get(9)?,
        is_recurring: row.get(10)?,
        recurring_pattern: parse_column::<RecurringPattern>(11, &pattern)?,
        created_at: parse_timestamp(12, &created_at)?,
        completed_at: completed_at
            .as_deref()
            .map(|d| parse_timestamp(13, d))
            .transpose()?,
        chain_id: row.get(14)?,
        chain_order: row.get(15)?,
        next_task_id: row.get(16)?,
    })
}

fn row_to_session(row: &Row) -> rusqlite::Result<PomodoroSession> {
    let kind: String = row.get(2)?;
    let started_at: String = row.get(3)?;
    let ended_at: Option<String> = row.get(4)?;
    Ok(PomodoroSession {
        id: row.get(0)?,
        task_id: row.get(1)?,
        kind: parse_column::<SessionKind>(2, &kind)?,
        started_at: parse_timestamp(3, &started_at)?,
        ended_at: ended_at.as_deref().map(|d| parse_timestamp(4, d)).transpose()?,
        duration_minutes: row.get(5)?,
        is_completed: row.get(6)?,
    })
}
