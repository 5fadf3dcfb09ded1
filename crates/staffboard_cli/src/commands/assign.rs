use anyhow::Result;
use async_trait::async_trait;
use clap::Args;

use core_model::{AssignmentInput, Role};

use crate::app::AppContext;
use crate::commands::{require_role, CliCommand};

#[derive(Args, Debug, Clone)]
pub struct AssignCommand {
    /// Engineer id
    #[arg(long)]
    pub engineer: String,
    /// Project id
    #[arg(long)]
    pub project: String,
    /// Share of the engineer's capacity, in percent
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub allocation: u32,
    /// Role label on the project, defaults to Developer
    #[arg(long)]
    pub role: Option<String>,
}

#[async_trait]
impl CliCommand for AssignCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let store = require_role(ctx, &[Role::Manager]).await?;
        let mut input = AssignmentInput::new(&self.engineer, &self.project, self.allocation);
        input.role = self.role.clone();
        let assignment = store.create_assignment(input).await?;

        println!(
            "Assigned {} to {} at {}%",
            assignment.engineer_id, assignment.project_id, assignment.allocation_percentage
        );
        if let Some(summary) = store.capacity_for(&assignment.engineer_id) {
            if summary.is_over_allocated() {
                println!(
                    "warning: engineer is now over capacity ({}% of {}%)",
                    summary.total_allocated, summary.max_capacity
                );
            }
        }
        Ok(())
    }
}
