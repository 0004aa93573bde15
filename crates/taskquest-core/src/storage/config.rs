//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Pomodoro durations
//! - Notification, sound, reminder and theme toggles
//! - The gamification rule table (XP constants and level thresholds)
//!
//! Configuration is stored at `<data_dir>/config.toml`. [`Config::default`]
//! is the only place defaults are defined.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::gamification::XpRules;

/// Pomodoro timer lengths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    #[serde(default = "default_focus_duration")]
    pub focus_duration: u32,
    #[serde(default = "default_short_break")]
    pub short_break: u32,
    #[serde(default = "default_long_break")]
    pub long_break: u32,
    #[serde(default = "default_pomodoros_before_long_break")]
    pub pomodoros_before_long_break: u32,
}

/// User-facing toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub enable_notifications: bool,
    #[serde(default = "default_true")]
    pub enable_sounds: bool,
    #[serde(default = "default_true")]
    pub streak_reminder_enabled: bool,
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    /// `HH:MM` local time, or `off`.
    #[serde(default = "default_daily_motivation_time")]
    pub daily_motivation_time: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pomodoro: PomodoroConfig,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub gamification: XpRules,
}

// Default functions
fn default_focus_duration() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_pomodoros_before_long_break() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_daily_motivation_time() -> String {
    "09:00".into()
}

/// Value of `daily_motivation_time` that disables the reminder.
pub const MOTIVATION_OFF: &str = "off";

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            focus_duration: default_focus_duration(),
            short_break: default_short_break(),
            long_break: default_long_break(),
            pomodoros_before_long_break: default_pomodoros_before_long_break(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_notifications: true,
            enable_sounds: true,
            streak_reminder_enabled: true,
            dark_mode: true,
            daily_motivation_time: default_daily_motivation_time(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pomodoro: PomodoroConfig::default(),
            settings: Settings::default(),
            gamification: XpRules::default(),
        }
    }
}

impl Settings {
    pub fn set_enable_notifications(&mut self, value: bool) {
        self.enable_notifications = value;
    }

    pub fn set_enable_sounds(&mut self, value: bool) {
        self.enable_sounds = value;
    }

    pub fn set_streak_reminder_enabled(&mut self, value: bool) {
        self.streak_reminder_enabled = value;
    }

    pub fn set_dark_mode(&mut self, value: bool) {
        self.dark_mode = value;
    }

    /// Set or clear (`None`) the daily motivation time.
    ///
    /// # Errors
    /// Rejects anything that is not a valid `HH:MM` time.
    pub fn set_daily_motivation_time(&mut self, value: Option<&str>) -> Result<(), ConfigError> {
        self.daily_motivation_time = match value {
            Some(raw) => {
                let time = NaiveTime::parse_from_str(raw, "%H:%M").map_err(|e| {
                    ConfigError::InvalidValue {
                        key: SettingKey::DailyMotivationTime.to_string(),
                        message: format!("expected HH:MM, got '{raw}' ({e})"),
                    }
                })?;
                time.format("%H:%M").to_string()
            }
            None => MOTIVATION_OFF.to_string(),
        };
        Ok(())
    }

    /// The motivation reminder time, `None` when switched off or unparsable.
    pub fn daily_motivation_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.daily_motivation_time, "%H:%M").ok()
    }
}

/// Every option a user can change from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    EnableNotifications,
    EnableSounds,
    StreakReminderEnabled,
    DarkMode,
    DailyMotivationTime,
    FocusDuration,
    ShortBreak,
    LongBreak,
    PomodorosBeforeLongBreak,
}

impl SettingKey {
    pub const ALL: [SettingKey; 9] = [
        SettingKey::EnableNotifications,
        SettingKey::EnableSounds,
        SettingKey::StreakReminderEnabled,
        SettingKey::DarkMode,
        SettingKey::DailyMotivationTime,
        SettingKey::FocusDuration,
        SettingKey::ShortBreak,
        SettingKey::LongBreak,
        SettingKey::PomodorosBeforeLongBreak,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::EnableNotifications => "settings.enable_notifications",
            SettingKey::EnableSounds => "settings.enable_sounds",
            SettingKey::StreakReminderEnabled => "settings.streak_reminder_enabled",
            SettingKey::DarkMode => "settings.dark_mode",
            SettingKey::DailyMotivationTime => "settings.daily_motivation_time",
            SettingKey::FocusDuration => "pomodoro.focus_duration",
            SettingKey::ShortBreak => "pomodoro.short_break",
            SettingKey::LongBreak => "pomodoro.long_break",
            SettingKey::PomodorosBeforeLongBreak => "pomodoro.pomodoros_before_long_break",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = ConfigError;

    /// Accepts the dotted name or the bare field name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| {
                let full = key.as_str();
                full == s || full.rsplit('.').next() == Some(s)
            })
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

fn parse_bool(key: SettingKey, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected true or false, got '{raw}'"),
        }),
    }
}

fn parse_positive(key: SettingKey, raw: &str) -> Result<u32, ConfigError> {
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a positive whole number, got '{raw}'"),
        }),
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// fails validation, or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.gamification.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Current value of `key`, rendered as text.
    pub fn get(&self, key: SettingKey) -> String {
        match key {
            SettingKey::EnableNotifications => self.settings.enable_notifications.to_string(),
            SettingKey::EnableSounds => self.settings.enable_sounds.to_string(),
            SettingKey::StreakReminderEnabled => self.settings.streak_reminder_enabled.to_string(),
            SettingKey::DarkMode => self.settings.dark_mode.to_string(),
            SettingKey::DailyMotivationTime => self.settings.daily_motivation_time.clone(),
            SettingKey::FocusDuration => self.pomodoro.focus_duration.to_string(),
            SettingKey::ShortBreak => self.pomodoro.short_break.to_string(),
            SettingKey::LongBreak => self.pomodoro.long_break.to_string(),
            SettingKey::PomodorosBeforeLongBreak => {
                self.pomodoro.pomodoros_before_long_break.to_string()
            }
        }
    }

    /// Parse `raw` for `key` and apply it through the matching setter.
    /// Does not save.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if `raw` does not parse for `key`.
    pub fn set(&mut self, key: SettingKey, raw: &str) -> Result<(), ConfigError> {
        match key {
            SettingKey::EnableNotifications => self
                .settings
                .set_enable_notifications(parse_bool(key, raw)?),
            SettingKey::EnableSounds => self.settings.set_enable_sounds(parse_bool(key, raw)?),
            SettingKey::StreakReminderEnabled => self
                .settings
                .set_streak_reminder_enabled(parse_bool(key, raw)?),
            SettingKey::DarkMode => self.settings.set_dark_mode(parse_bool(key, raw)?),
            SettingKey::DailyMotivationTime => {
                let value = (!matches!(raw, "" | MOTIVATION_OFF | "none")).then_some(raw);
                self.settings.set_daily_motivation_time(value)?;
            }
            SettingKey::FocusDuration => self.pomodoro.focus_duration = parse_positive(key, raw)?,
            SettingKey::ShortBreak => self.pomodoro.short_break = parse_positive(key, raw)?,
            SettingKey::LongBreak => self.pomodoro.long_break = parse_positive(key, raw)?,
            SettingKey::PomodorosBeforeLongBreak => {
                self.pomodoro.pomodoros_before_long_break = parse_positive(key, raw)?
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert!(cfg.settings.enable_notifications);
        assert!(cfg.settings.enable_sounds);
        assert!(cfg.settings.streak_reminder_enabled);
        assert!(cfg.settings.dark_mode);
        assert_eq!(cfg.settings.daily_motivation_time, "09:00");
        assert_eq!(
            cfg.settings.daily_motivation_time(),
            NaiveTime::from_hms_opt(9, 0, 0)
        );
        assert_eq!(cfg.pomodoro.focus_duration, 25);
        assert_eq!(cfg.pomodoro.short_break, 5);
        assert_eq!(cfg.pomodoro.long_break, 15);
        assert_eq!(cfg.pomodoro.pomodoros_before_long_break, 4);
        assert_eq!(cfg.gamification, XpRules::default());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn setting_key_accepts_short_and_dotted_names() {
        assert_eq!("dark_mode".parse::<SettingKey>().unwrap(), SettingKey::DarkMode);
        assert_eq!(
            "pomodoro.long_break".parse::<SettingKey>().unwrap(),
            SettingKey::LongBreak
        );
        assert!(matches!(
            "theme".parse::<SettingKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_updates_typed_fields() {
        let mut cfg = Config::default();
        cfg.set(SettingKey::DarkMode, "false").unwrap();
        cfg.set(SettingKey::FocusDuration, "50").unwrap();
        cfg.set(SettingKey::DailyMotivationTime, "7:05").unwrap();
        assert!(!cfg.settings.dark_mode);
        assert_eq!(cfg.pomodoro.focus_duration, 50);
        assert_eq!(cfg.get(SettingKey::DailyMotivationTime), "07:05");

        cfg.set(SettingKey::DailyMotivationTime, "off").unwrap();
        assert_eq!(cfg.settings.daily_motivation_time(), None);
        let reparsed: Config = toml::from_str(&toml::to_string_pretty(&cfg).unwrap()).unwrap();
        assert_eq!(reparsed.settings.daily_motivation_time, MOTIVATION_OFF);
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut cfg = Config::default();
        assert!(cfg.set(SettingKey::EnableSounds, "loud").is_err());
        assert!(cfg.set(SettingKey::ShortBreak, "0").is_err());
        assert!(cfg.set(SettingKey::DailyMotivationTime, "25:00").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn count_settings_report_a_count_error() {
        let mut cfg = Config::default();
        let err = cfg
            .set(SettingKey::PomodorosBeforeLongBreak, "0")
            .unwrap_err()
            .to_string();
        assert!(err.contains("pomodoro.pomodoros_before_long_break"));
        assert!(err.contains("positive whole number"));
        assert!(!err.contains("minute"));

        cfg.set(SettingKey::PomodorosBeforeLongBreak, "3").unwrap();
        assert_eq!(cfg.pomodoro.pomodoros_before_long_break, 3);
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.settings.set_enable_sounds(false);
        changed.save_to(&path).unwrap();
        assert!(!Config::load_from(&path).unwrap().settings.enable_sounds);
    }

    #[test]
    fn load_from_rejects_invalid_level_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[[gamification.levels]]\nlevel = 1\nxp_required = 10\n",
        )
        .unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
