//! Status command handler

use anyhow::{Context, Result};

use quire_core::{Config, PageApi};

use super::connect;
use crate::output::Output;

/// Show server health and statistics
pub async fn show(config: &Config, output: &Output) -> Result<()> {
    let api = connect(config)?;

    let health = api
        .health()
        .await
        .with_context(|| format!("Server at {} is not reachable", config.api_url))?;
    let status = api
        .server_status()
        .await
        .context("Failed to fetch server status")?;

    output.print_server_status(api.base_url(), &health, &status);
    Ok(())
}
