use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/tracker.toml";
const DEFAULT_TOKEN_PATH: &str = "config/token.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub token_path: String,
    /// Budget used by `gifts show` when `--budget` is not given.
    pub total_budget: Decimal,
    pub log_level: String,
    pub username: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: client::DEFAULT_BASE_URL.to_string(),
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            total_budget: engine::DEFAULT_TOTAL_BUDGET,
            log_level: "info".to_string(),
            username: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override base URL (e.g. http://localhost:8080/api).
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Override where the session token is kept.
    #[arg(long, global = true)]
    pub token_path: Option<String>,
    /// Override log level (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

/// Layer the config file, `TRACKER_*` variables and command line overrides.
pub fn load(args: &ConfigArgs) -> Result<AppConfig> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let settings: AppConfig = config::Config::builder()
        .add_source(config::File::with_name(config_path).required(false))
        .add_source(config::Environment::with_prefix("TRACKER"))
        .build()?
        .try_deserialize()?;

    Ok(apply(settings, args))
}

fn apply(mut settings: AppConfig, args: &ConfigArgs) -> AppConfig {
    if let Some(base_url) = &args.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(token_path) = &args.token_path {
        settings.token_path = token_path.clone();
    }
    if let Some(log_level) = &args.log_level {
        settings.log_level = log_level.clone();
    }
    settings
}
