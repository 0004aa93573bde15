//! Task template commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use taskquest_core::task::template::default_templates;
use taskquest_core::{Template, TemplateTask, ValidationError};

use super::open_engine;

#[derive(Subcommand)]
pub enum TemplateAction {
    /// Create a template from task titles and/or existing tasks
    Create {
        /// Template name
        name: String,
        /// Template description
        #[arg(long)]
        description: Option<String>,
        /// Link the created tasks into a chain
        #[arg(long)]
        chained: bool,
        /// Task title (repeatable); uses default minutes, category and priority
        #[arg(long = "task")]
        tasks: Vec<String>,
        /// Copy an existing task (repeatable)
        #[arg(long = "from-task")]
        from_tasks: Vec<String>,
    },
    /// List templates, newest first
    List,
    /// Delete a template
    Delete {
        /// Template ID
        id: String,
    },
    /// Create tasks from a template
    Use {
        /// Template ID
        id: String,
    },
    /// Store the built-in routines
    InstallDefaults,
}

pub fn run(action: TemplateAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    let now = Utc::now();

    match action {
        TemplateAction::Create {
            name,
            description,
            chained,
            tasks,
            from_tasks,
        } => {
            let mut blueprints: Vec<TemplateTask> =
                tasks.into_iter().map(TemplateTask::titled).collect();
            for id in from_tasks {
                let task = engine
                    .with_store(|db| db.get_task(&id))?
                    .ok_or(ValidationError::NotFound { kind: "Task", id })?;
                blueprints.push(TemplateTask::from_task(&task));
            }
            let template = Template::new(name, description, blueprints, chained, now)?;
            engine.with_store(|db| db.create_template(&template))?;
            println!("{}", serde_json::to_string_pretty(&template)?);
        }
        TemplateAction::List => {
            let templates = engine.with_store(|db| db.list_templates())?;
            println!("{}", serde_json::to_string_pretty(&templates)?);
        }
        TemplateAction::Delete { id } => {
            engine.with_store(|db| db.delete_template(&id))?;
            println!("Template deleted: {id}");
        }
        TemplateAction::Use { id } => {
            let tasks = engine.use_template(&id, now)?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        TemplateAction::InstallDefaults => {
            let templates = default_templates(now);
            engine.with_store(|db| {
                for template in &templates {
                    db.create_template(template)?;
                }
                Ok(())
            })?;
            println!("{}", serde_json::to_string_pretty(&templates)?);
        }
    }
    Ok(())
}
