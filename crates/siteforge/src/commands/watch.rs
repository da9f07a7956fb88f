//! Watch-and-serve command.

use std::path::Path;

use anyhow::Result;
use siteforge_assets::{build_plan, standard_registry, watch_bindings};
use siteforge_pipeline::Runner;
use siteforge_server::{Bindings, DevServerConfig, WatchSession};

use crate::config::load_config;

/// Build, then rebuild on change while serving the output.
pub async fn run(config_path: &Path, port: Option<u16>, open: bool) -> Result<()> {
    let config = load_config(config_path)?;

    let registry = standard_registry(&config);
    let plan = build_plan();
    plan.validate(&registry)?;

    let bindings = Bindings::new(watch_bindings(&config)?);
    let server = DevServerConfig {
        root: config.output_dir().to_path_buf(),
        host: config.server.host.clone(),
        port: port.unwrap_or(config.server.port),
        open: open && config.server.open,
    };

    WatchSession::new(
        Runner::new(registry),
        plan,
        config.source_dir(),
        bindings,
        server,
    )
    .run()
    .await?;

    Ok(())
}
