//! Category commands for CLI.

use clap::Subcommand;
use taskquest_core::Category;

use super::open_engine;

#[derive(Subcommand)]
pub enum CategoryAction {
    /// List stored categories
    List,
    /// Add a category
    Create {
        /// Category id, used by `task create --category`
        id: String,
        /// Display name
        name: String,
        /// Color as a hex string
        #[arg(long, default_value = "#808080")]
        color: String,
        /// Icon name
        #[arg(long)]
        icon: Option<String>,
    },
}

pub fn run(action: CategoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;

    match action {
        CategoryAction::List => {
            let categories = engine.with_store(|db| db.list_categories())?;
            println!("{}", serde_json::to_string_pretty(&categories)?);
        }
        CategoryAction::Create {
            id,
            name,
            color,
            icon,
        } => {
            let category = Category::new(id, name, color, icon)?;
            engine.with_store(|db| db.create_category(&category))?;
            println!("{}", serde_json::to_string_pretty(&category)?);
        }
    }
    Ok(())
}
