//! Database schema migrations for taskquest.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};

use crate::task::default_categories;

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = schema_version(conn)?;
    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Current schema version; 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> SqliteResult<i32> {
    Ok(conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0)
        })
        .optional()?
        .flatten()
        .unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// v1: tasks and the key-value table holding the stats record.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id                  TEXT PRIMARY KEY,
            title               TEXT NOT NULL,
            description         TEXT,
            estimated_minutes   INTEGER NOT NULL,
            category            TEXT NOT NULL,
            priority            TEXT NOT NULL,
            status              TEXT NOT NULL DEFAULT 'todo',
            deadline            TEXT,
            xp_reward           INTEGER NOT NULL DEFAULT 0,
            pomodoros_completed INTEGER NOT NULL DEFAULT 0,
            is_recurring        INTEGER NOT NULL DEFAULT 0,
            recurring_pattern   TEXT NOT NULL DEFAULT 'none',
            created_at          TEXT NOT NULL,
            completed_at        TEXT
        );

        CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
        CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at);",
    )?;
    set_schema_version(conn, 1)
}

/// v2: task chains, templates, pomodoro sessions and stored categories.
///
/// Seeds the default categories.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "ALTER TABLE tasks ADD COLUMN chain_id TEXT;
        ALTER TABLE tasks ADD COLUMN chain_order INTEGER;
        ALTER TABLE tasks ADD COLUMN next_task_id TEXT;

        CREATE TABLE IF NOT EXISTS templates (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            description TEXT,
            tasks       TEXT NOT NULL,
            is_chained  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS pomodoro_sessions (
            id               TEXT PRIMARY KEY,
            task_id          TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            kind             TEXT NOT NULL,
            started_at       TEXT NOT NULL,
            ended_at         TEXT,
            duration_minutes INTEGER NOT NULL,
            is_completed     INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS categories (
            id    TEXT PRIMARY KEY,
            name  TEXT NOT NULL,
            color TEXT NOT NULL,
            icon  TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_category ON tasks(category);
        CREATE INDEX IF NOT EXISTS idx_tasks_chain_id ON tasks(chain_id);
        CREATE INDEX IF NOT EXISTS idx_sessions_task_id ON pomodoro_sessions(task_id);",
    )?;

    for category in default_categories() {
        conn.execute(
            "INSERT OR IGNORE INTO categories (id, name, color, icon) VALUES (?1, ?2, ?3, ?4)",
            params![category.id, category.name, category.color, category.icon],
        )?;
    }
    set_schema_version(conn, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(
            {
                create_schema_version_table(&conn).unwrap();
                schema_version(&conn).unwrap()
            },
            0
        );
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn v2_seeds_default_categories_once() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, default_categories().len() as i64);
    }

    #[test]
    fn v1_database_upgrades_in_place() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        conn.execute(
            "INSERT INTO tasks (id, title, estimated_minutes, category, priority, created_at)
             VALUES ('old', 'Old task', 30, 'personal', 'medium', '2026-01-01T00:00:00+00:00')",
            [],
        )
        .unwrap();

        migrate(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 2);
        let chain: Option<String> = conn
            .query_row("SELECT chain_id FROM tasks WHERE id = 'old'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(chain, None);
    }
}
