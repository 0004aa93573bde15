//! Pomodoro session commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;
use taskquest_core::{Config, Database, PomodoroSession, SessionKind, Task};

#[derive(Subcommand)]
pub enum PomodoroAction {
    /// Record a finished session for a task
    Log {
        /// Task ID
        task_id: String,
        /// Session kind: focus, short_break or long_break
        #[arg(long, default_value = "focus")]
        kind: SessionKind,
        /// Length in minutes (default: from config)
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// List a task's sessions, newest first
    List {
        /// Task ID
        task_id: String,
    },
}

#[derive(Serialize)]
struct SessionReport {
    session: PomodoroSession,
    task: Task,
    /// Break due after a focus session.
    #[serde(skip_serializing_if = "Option::is_none")]
    next_break: Option<SessionKind>,
}

pub fn run(action: PomodoroAction) -> Result<(), Box<dyn std::error::Error>> {
    let pomodoro = Config::load()?.pomodoro;
    let mut db = Database::open()?;

    match action {
        PomodoroAction::Log {
            task_id,
            kind,
            minutes,
        } => {
            let minutes = minutes.unwrap_or_else(|| pomodoro.duration_for(kind));
            let session = PomodoroSession::finished(task_id, kind, minutes, Utc::now())?;
            let task = db.record_session(&session)?;
            let next_break =
                (!session.is_break()).then(|| pomodoro.break_after(task.pomodoros_completed));
            let report = SessionReport {
                session,
                task,
                next_break,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        PomodoroAction::List { task_id } => {
            let sessions = db.sessions_for_task(&task_id)?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
    }
    Ok(())
}
