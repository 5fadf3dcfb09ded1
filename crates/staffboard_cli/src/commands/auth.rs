use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::{Args, ValueEnum};

use core_model::{Role, UserInput};
use gateway_client::BackendGateway;
use session_store::{LoginOutcome, SessionCheck};

use crate::app::AppContext;
use crate::commands::CliCommand;
use crate::support::print::{print_identity, print_sync_report};

#[derive(Args, Debug, Clone)]
pub struct LoginCommand {
    #[arg(long)]
    pub email: String,
    /// Falls back to STAFFBOARD_PASSWORD when omitted
    #[arg(long, env = "STAFFBOARD_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[async_trait]
impl CliCommand for LoginCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let store = ctx.store()?;
        match store.login(&self.email, &self.password).await {
            LoginOutcome::Authenticated(report) => {
                if let Some(user) = store.current_user() {
                    println!("Signed in as {} ({})", user.name, user.role);
                }
                print_sync_report(&report);
                Ok(())
            }
            LoginOutcome::Rejected { message } => bail!("{}", message),
        }
    }
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    ctx.store()?.logout();
    println!("Signed out");
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    let store = ctx.store()?;
    match store.check_auth().await {
        SessionCheck::Authenticated(_) => {
            if let Some(user) = store.current_user() {
                print_identity(&user);
            }
        }
        SessionCheck::NotAuthenticated => println!("Not signed in"),
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum RoleArg {
    Engineer,
    Manager,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Engineer => Role::Engineer,
            RoleArg::Manager => Role::Manager,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RegisterCommand {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub name: String,
    #[arg(long, env = "STAFFBOARD_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long, value_enum, default_value = "engineer")]
    pub role: RoleArg,
    #[arg(long)]
    pub department: Option<String>,
    /// Comma-separated list of skills
    #[arg(long, value_delimiter = ',')]
    pub skills: Vec<String>,
}

#[async_trait]
impl CliCommand for RegisterCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let input = UserInput {
            email: Some(self.email.trim().to_string()),
            name: Some(self.name.trim().to_string()),
            password: Some(self.password.clone()),
            role: Some(self.role.into()),
            skills: (!self.skills.is_empty()).then(|| self.skills.clone()),
            department: self.department.clone(),
            ..Default::default()
        };
        let response = ctx.gateway()?.register(&input).await?;
        match response.data {
            Some(user) => {
                println!("Registered {} <{}> as {}", user.name, user.email, user.role);
                Ok(())
            }
            None => bail!(
                "{}",
                response
                    .message
                    .unwrap_or_else(|| "Registration failed".to_string())
            ),
        }
    }
}
