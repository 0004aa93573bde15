pub mod category;
pub mod config;
pub mod pomodoro;
pub mod stats;
pub mod task;
pub mod template;

use taskquest_core::{Config, Database, Gamification};
use tracing::debug;

/// Open the database and wrap it in an engine configured from `config.toml`.
pub fn open_engine() -> Result<Gamification<Database>, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    debug!(max_level = config.gamification.max_level(), "engine ready");
    Ok(Gamification::new(db, config.gamification))
}
