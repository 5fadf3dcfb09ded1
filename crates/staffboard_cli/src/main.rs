use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    staffboard_cli::app::run().await
}
