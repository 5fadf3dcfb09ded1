use anyhow::Result;
use async_trait::async_trait;
use clap::Args;

use core_model::access::Route;

use crate::app::AppContext;
use crate::commands::CliCommand;
use crate::support::print::{print_engineer_view, print_manager_view, print_stale_collections};

#[derive(Args, Debug, Clone, Default)]
#[command(about = "Show the dashboard for the signed-in role")]
pub struct DashboardCommand;

#[async_trait]
impl CliCommand for DashboardCommand {
    async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let store = ctx.store()?;
        let check = store.check_auth().await;
        print_stale_collections(&check);

        match store.current_route() {
            Route::Manager => print_manager_view(store),
            Route::Engineer => print_engineer_view(store),
            Route::Login | Route::Loading => {
                println!("Not signed in. Run `staffboard login --email <email>` first.")
            }
        }
        Ok(())
    }
}
