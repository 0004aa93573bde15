//! Pomodoro sessions logged against tasks.
//!
//! A task's `pomodoros_completed` is the number of completed focus sessions
//! recorded for it; breaks are stored but never counted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::storage::PomodoroConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Focus,
    ShortBreak,
    LongBreak,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Focus => "focus",
            SessionKind::ShortBreak => "short_break",
            SessionKind::LongBreak => "long_break",
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, SessionKind::Focus)
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "focus" => Ok(SessionKind::Focus),
            "short_break" | "short" => Ok(SessionKind::ShortBreak),
            "long_break" | "long" => Ok(SessionKind::LongBreak),
            other => Err(ValidationError::invalid(
                "session_kind",
                format!("expected focus, short_break or long_break, got '{other}'"),
            )),
        }
    }
}

/// One focus or break interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroSession {
    pub id: String,
    pub task_id: String,
    pub kind: SessionKind,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Length in minutes.
    pub duration_minutes: u32,
    pub is_completed: bool,
}

impl PomodoroSession {
    /// A completed session of `duration_minutes` that ended at `ended_at`.
    ///
    /// # Errors
    /// Rejects a zero duration.
    pub fn finished(
        task_id: impl Into<String>,
        kind: SessionKind,
        duration_minutes: u32,
        ended_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if duration_minutes == 0 {
            return Err(ValidationError::invalid("duration_minutes", "must be positive"));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            kind,
            started_at: ended_at - Duration::minutes(i64::from(duration_minutes)),
            ended_at: Some(ended_at),
            duration_minutes,
            is_completed: true,
        })
    }

    pub fn is_break(&self) -> bool {
        self.kind.is_break()
    }

    /// Whether this session adds to the task's pomodoro count.
    pub fn counts_as_pomodoro(&self) -> bool {
        self.is_completed && !self.is_break()
    }
}

impl PomodoroConfig {
    /// Configured length of a session kind, in minutes.
    pub fn duration_for(&self, kind: SessionKind) -> u32 {
        match kind {
            SessionKind::Focus => self.focus_duration,
            SessionKind::ShortBreak => self.short_break,
            SessionKind::LongBreak => self.long_break,
        }
    }

    /// Break to take after `focus_done` focus sessions: every
    /// `pomodoros_before_long_break`-th one earns a long break.
    pub fn break_after(&self, focus_done: u32) -> SessionKind {
        let every = self.pomodoros_before_long_break.max(1);
        if focus_done > 0 && focus_done % every == 0 {
            SessionKind::LongBreak
        } else {
            SessionKind::ShortBreak
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 3, 10, 25, 0).unwrap()
    }

    #[test]
    fn finished_session_spans_its_duration() {
        let s = PomodoroSession::finished("t1", SessionKind::Focus, 25, end()).unwrap();
        assert_eq!(s.started_at, Utc.with_ymd_and_hms(2026, 8, 3, 10, 0, 0).unwrap());
        assert_eq!(s.ended_at, Some(end()));
        assert!(s.counts_as_pomodoro());

        let b = PomodoroSession::finished("t1", SessionKind::ShortBreak, 5, end()).unwrap();
        assert!(b.is_break());
        assert!(!b.counts_as_pomodoro());

        assert!(PomodoroSession::finished("t1", SessionKind::Focus, 0, end()).is_err());
    }

    #[test]
    fn long_break_every_nth_focus() {
        let cfg = PomodoroConfig::default();
        assert_eq!(cfg.break_after(1), SessionKind::ShortBreak);
        assert_eq!(cfg.break_after(3), SessionKind::ShortBreak);
        assert_eq!(cfg.break_after(4), SessionKind::LongBreak);
        assert_eq!(cfg.break_after(8), SessionKind::LongBreak);
        assert_eq!(cfg.duration_for(SessionKind::LongBreak), 15);
    }

    #[test]
    fn kind_parsing() {
        assert_eq!("short-break".parse::<SessionKind>().unwrap(), SessionKind::ShortBreak);
        assert_eq!("LONG".parse::<SessionKind>().unwrap(), SessionKind::LongBreak);
        assert!("nap".parse::<SessionKind>().is_err());
    }
}
