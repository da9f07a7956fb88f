//! Full build command.

use std::path::Path;

use anyhow::Result;
use siteforge_assets::{build_plan, standard_registry};
use siteforge_pipeline::Runner;

use crate::config::load_config;

/// Run the build command.
pub async fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    tracing::info!(
        "Building {} -> {}",
        config.source_dir().display(),
        config.output_dir().display()
    );

    let registry = standard_registry(&config);
    let plan = build_plan();
    plan.validate(&registry)?;

    let report = Runner::new(registry).run(&plan).await?;

    tracing::info!(
        "Built {} files with {} tasks in {}ms",
        report.files_written(),
        report.tasks.len(),
        report.duration_ms
    );
    tracing::info!("Output: {}", config.output_dir().display());

    Ok(())
}
