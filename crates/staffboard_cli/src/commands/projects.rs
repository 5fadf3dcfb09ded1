use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Subcommand, ValueEnum};

use core_model::{ProjectInput, ProjectStatus, Role};

use crate::app::AppContext;
use crate::commands::{require_role, CliCommand};
use crate::support::print::print_project;

#[derive(Subcommand, Debug, Clone)]
pub enum ProjectsCommand {
    /// List cached projects
    List,
    /// Create a project (managers only)
    Create(ProjectFields),
    /// Update fields of an existing project (managers only)
    Update {
        id: String,
        #[command(flatten)]
        fields: ProjectFields,
    },
    /// Delete a project (managers only). Its assignments are left in place.
    Delete { id: String },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum StatusArg {
    Planning,
    Active,
    Completed,
}

impl From<StatusArg> for ProjectStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Planning => ProjectStatus::Planning,
            StatusArg::Active => ProjectStatus::Active,
            StatusArg::Completed => ProjectStatus::Completed,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Start date as YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    pub start: Option<DateTime<Utc>>,
    /// End date as YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    pub end: Option<DateTime<Utc>>,
    /// Comma-separated list of required skills
    #[arg(long, value_delimiter = ',')]
    pub skills: Vec<String>,
    #[arg(long)]
    pub team_size: Option<u32>,
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,
}

impl ProjectFields {
    fn into_input(self, manager_id: Option<String>) -> ProjectInput {
        ProjectInput {
            name: self.name,
            description: self.description,
            start_date: self.start,
            end_date: self.end,
            required_skills: (!self.skills.is_empty()).then_some(self.skills),
            team_size: self.team_size,
            status: self.status.map(ProjectStatus::from),
            manager_id,
        }
    }
}

#[async_trait]
impl CliCommand for ProjectsCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        match self {
            ProjectsCommand::List => {
                let store = require_role(ctx, &[Role::Manager, Role::Engineer]).await?;
                let projects = store.snapshot().projects;
                if projects.is_empty() {
                    println!("No projects loaded.");
                }
                for project in &projects {
                    print_project(project);
                }
                Ok(())
            }
            ProjectsCommand::Create(fields) => {
                let store = require_role(ctx, &[Role::Manager]).await?;
                let manager_id = store.current_user().map(|user| user.id);
                let input = fields.clone().into_input(manager_id);
                let project = store.create_project(&input).await?;
                println!("Created project {} ({})", project.name, project.id);
                Ok(())
            }
            ProjectsCommand::Update { id, fields } => {
                let store = require_role(ctx, &[Role::Manager]).await?;
                let project = store.update_project(id, &fields.clone().into_input(None)).await?;
                println!("Updated project {} ({})", project.name, project.id);
                Ok(())
            }
            ProjectsCommand::Delete { id } => {
                let store = require_role(ctx, &[Role::Manager]).await?;
                let response = store.delete_project(id).await?;
                println!(
                    "{}",
                    response
                        .message
                        .unwrap_or_else(|| format!("Deleted project {}", id))
                );
                Ok(())
            }
        }
    }
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = raw.parse::<DateTime<Utc>>() {
        return Ok(ts);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("`{raw}` is not a date (expected YYYY-MM-DD)"))
}
