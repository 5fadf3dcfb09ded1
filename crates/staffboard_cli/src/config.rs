use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use gateway_client::DEFAULT_API_BASE;

const API_BASE_VAR: &str = "STAFFBOARD_API_BASE";
const STATE_DIR_VAR: &str = "STAFFBOARD_STATE_DIR";
const DEFAULT_STATE_DIR: &str = "./.staffboard";
const HTTP_TIMEOUT_VAR: &str = "STAFFBOARD_HTTP_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    /// Directory holding `credentials.json`.
    pub state_dir: PathBuf,
    pub http_timeout: Option<Duration>,
}

pub fn load_config() -> Result<Config> {
    dotenvy::dotenv().ok();

    let api_base = non_empty(env::var(API_BASE_VAR).ok())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

    let state_dir = non_empty(env::var(STATE_DIR_VAR).ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));

    let http_timeout = parse_timeout(env::var(HTTP_TIMEOUT_VAR).ok())?;

    Ok(Config {
        api_base,
        state_dir,
        http_timeout,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim().to_owned();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

fn parse_timeout(raw: Option<String>) -> Result<Option<Duration>> {
    match non_empty(raw) {
        Some(raw) => {
            let secs = raw.parse::<u64>().with_context(|| {
                format!("{HTTP_TIMEOUT_VAR} `{raw}` is not a whole number of seconds")
            })?;
            Ok(Some(Duration::from_secs(secs)))
        }
        None => Ok(None),
    }
}
