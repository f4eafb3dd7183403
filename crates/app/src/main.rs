use clap::Parser;

use crate::{commands::Cli, error::Result};

mod commands;
mod config;
mod error;
mod prompt;
mod ui;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(format!(
            "tracker={level},client={level},engine={level}",
            level = settings.log_level
        ))
        .init();

    tracing::debug!("using backend at {}", settings.base_url);
    commands::run(cli.command, settings).await
}
