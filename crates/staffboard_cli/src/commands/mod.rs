pub mod assign;
pub mod auth;
pub mod dashboard;
pub mod projects;

use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};

use core_model::access::Access;
use core_model::Role;
use session_store::SessionStore;

use crate::app::AppContext;

pub use assign::AssignCommand;
pub use auth::{LoginCommand, RegisterCommand};
pub use dashboard::DashboardCommand;
pub use projects::ProjectsCommand;

#[async_trait]
pub trait CliCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()>;
}

#[derive(Parser, Debug, Clone)]
#[command(name = "staffboard", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: RootCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RootCommand {
    /// Sign in and cache the bearer token locally
    Login(LoginCommand),
    /// Forget the stored token
    Logout,
    /// Show who the stored token belongs to
    Whoami,
    /// Create a new account
    Register(RegisterCommand),
    /// Show the dashboard for the signed-in role
    Dashboard(DashboardCommand),
    #[command(subcommand)]
    Projects(ProjectsCommand),
    /// Assign an engineer to a project
    Assign(AssignCommand),
}

impl Cli {
    pub async fn execute(self, ctx: &AppContext) -> Result<()> {
        match self.command {
            RootCommand::Login(cmd) => cmd.execute(ctx).await,
            RootCommand::Logout => auth::logout(ctx),
            RootCommand::Whoami => auth::whoami(ctx).await,
            RootCommand::Register(cmd) => cmd.execute(ctx).await,
            RootCommand::Dashboard(cmd) => cmd.execute(ctx).await,
            RootCommand::Projects(cmd) => cmd.execute(ctx).await,
            RootCommand::Assign(cmd) => cmd.execute(ctx).await,
        }
    }
}

/// Restores the stored session and checks the signed-in role.
pub(crate) async fn require_role<'a>(ctx: &'a AppContext, allowed: &[Role]) -> Result<&'a SessionStore> {
    let store = ctx.store()?;
    let check = store.check_auth().await;
    crate::support::print::print_stale_collections(&check);
    match store.authorize(allowed) {
        Access::Granted => Ok(store),
        Access::RedirectLogin | Access::Pending => {
            bail!("Not signed in. Run `staffboard login` first.")
        }
        Access::Unauthorized => bail!("This command is not available to your role."),
    }
}
