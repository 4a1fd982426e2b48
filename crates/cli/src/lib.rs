//! `storefront-recs`: preview recommendation sections of a storefront page
//! against a live backend.

pub mod commands;
pub mod output;

use anyhow::{Context, Result};
use clap::Parser;
use commands::PreviewCommand;
use common::{init_structured_logging, StorefrontConfig};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "storefront-recs")]
#[command(about = "Preview storefront recommendation sections against a live backend")]
#[command(version)]
pub struct Cli {
    /// TOML config file (environment variables still override it)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the storefront API
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bearer token; signs the viewer in
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Print render models as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: PreviewCommand,
}

impl Cli {
    /// Config file or environment, then command-line overrides
    pub fn load_config(&self) -> Result<StorefrontConfig> {
        let mut config = match &self.config {
            Some(path) => StorefrontConfig::from_toml_file(path)?,
            None => StorefrontConfig::from_env()?,
        };

        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.api.token = Some(token.clone());
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    init_structured_logging(&config.logging)?;

    cli.command.execute(&config, cli.json).await
}
