//! Run individual tasks by name.

use std::path::Path;

use anyhow::Result;
use siteforge_assets::standard_registry;
use siteforge_pipeline::{Runner, Step};

use crate::config::load_config;

/// Run `tasks` in the order given.
pub async fn run(config_path: &Path, tasks: &[String]) -> Result<()> {
    let config = load_config(config_path)?;
    let registry = standard_registry(&config);

    let plan = Step::series_of(tasks);
    plan.validate(&registry)?;

    let report = Runner::new(registry).run(&plan).await?;
    tracing::info!(
        "Ran {} in {}ms ({} files)",
        tasks.join(", "),
        report.duration_ms,
        report.files_written()
    );

    Ok(())
}
