use chrono::{Local, Utc};
use clap::Subcommand;
use serde::Serialize;
use taskquest_core::gamification::{format_xp, is_streak_in_danger, level_title};
use taskquest_core::UserStats;

use super::open_engine;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals, streaks and last activity
    Show,
    /// Current level and progress toward the next one
    Level,
    /// Drop the current streak to zero
    ResetStreak,
    /// The level table with titles
    Levels,
}

#[derive(Serialize)]
struct StatsReport {
    #[serde(flatten)]
    stats: UserStats,
    streak_in_danger: bool,
}

#[derive(Serialize)]
struct LevelRow {
    level: u32,
    title: String,
    xp_required: u64,
    display: String,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    let now = Utc::now();

    match action {
        StatsAction::Show => {
            let stats = engine.stats(now)?;
            let streak_in_danger =
                stats.current_streak > 0 && is_streak_in_danger(stats.last_activity_date, &Local::now());
            let report = StatsReport {
                stats,
                streak_in_danger,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        StatsAction::Level => {
            let snapshot = engine.snapshot(now)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        StatsAction::ResetStreak => {
            let stats = engine.reset_streak(now)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Levels => {
            let rows: Vec<LevelRow> = engine
                .rules()
                .levels
                .iter()
                .map(|t| LevelRow {
                    level: t.level,
                    title: level_title(t.level),
                    xp_required: t.xp_required,
                    display: format_xp(t.xp_required),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}
