//! Preview server command.

use std::path::Path;

use anyhow::Result;
use siteforge_server::{DevServer, DevServerConfig, ReloadHub};

use crate::config::load_config;

/// Serve the output directory as it is.
pub async fn run(config_path: &Path, port: Option<u16>) -> Result<()> {
    let config = load_config(config_path)?;
    let dir = config.output_dir();

    if !dir.exists() {
        anyhow::bail!(
            "Directory not found: {}. Run 'siteforge build' first.",
            dir.display()
        );
    }

    let server = DevServerConfig {
        root: dir.to_path_buf(),
        host: config.server.host.clone(),
        port: port.unwrap_or(config.server.port),
        open: config.server.open,
    };

    DevServer::new(server, ReloadHub::new()).start().await?;

    Ok(())
}
