use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use once_cell::sync::OnceCell;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use gateway_client::{BackendGateway, CredentialStorage, FileCredentials, HttpGateway};
use session_store::SessionStore;

use crate::commands::Cli;
use crate::config;

#[derive(Default)]
pub struct AppContext {
    config: OnceCell<config::Config>,
    credentials: OnceCell<Arc<dyn CredentialStorage>>,
    gateway: OnceCell<Arc<HttpGateway>>,
    store: OnceCell<SessionStore>,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Result<&config::Config> {
        self.config.get_or_try_init(config::load_config)
    }

    pub fn credentials(&self) -> Result<Arc<dyn CredentialStorage>> {
        self.credentials
            .get_or_try_init(|| {
                let cfg = self.config()?;
                let credentials: Arc<dyn CredentialStorage> =
                    Arc::new(FileCredentials::new(&cfg.state_dir));
                Ok::<_, anyhow::Error>(credentials)
            })
            .cloned()
    }

    pub fn gateway(&self) -> Result<Arc<HttpGateway>> {
        self.gateway
            .get_or_try_init(|| {
                let cfg = self.config()?;
                let gateway =
                    HttpGateway::with_timeout(&cfg.api_base, self.credentials()?, cfg.http_timeout)?;
                Ok::<_, anyhow::Error>(Arc::new(gateway))
            })
            .cloned()
    }

    pub fn store(&self) -> Result<&SessionStore> {
        self.store.get_or_try_init(|| {
            let gateway: Arc<dyn BackendGateway> = self.gateway()?;
            Ok::<_, anyhow::Error>(SessionStore::new(gateway, self.credentials()?))
        })
    }
}

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();
    let ctx = AppContext::new();
    cli.execute(&ctx).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .try_init();
}
