use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory and an initial `config.json` with default
/// settings, plus the upstream cost API URL when one is given.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(costguard_home: &Path, upstream_url: Option<&str>) -> Result<Out<()>> {
    let config = Config::create(costguard_home, upstream_url)
        .await
        .context("Unable to create the data directory and config")?;
    Ok(format!(
        "Successfully created '{}'",
        config.config_path().display()
    )
    .into())
}
