//! List registered tasks.

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use siteforge_assets::{build_plan, standard_registry};
use siteforge_pipeline::{Step, TaskRegistry};

use crate::config::load_config;

/// Print every task and the build plan.
pub fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let registry = standard_registry(&config);
    print!("{}", render(&registry, &build_plan()));
    Ok(())
}

/// Task table followed by the plan, one task per line.
pub fn render(registry: &TaskRegistry, plan: &Step) -> String {
    let width = registry.names().iter().map(|n| n.len()).max().unwrap_or(0);
    let in_plan = plan.unique_tasks();

    let mut out = String::from("Tasks:\n");
    for task in registry.iter() {
        let marker = if in_plan.contains(task.name()) { ' ' } else { '*' };
        let _ = writeln!(
            out,
            " {}{:<width$}  {:<6}  {}",
            marker,
            task.name(),
            task.kind().as_str(),
            task.description(),
            width = width
        );
    }
    let _ = writeln!(out, "\n* not part of build\n\nBuild plan:\n  {}", plan);
    out
}
