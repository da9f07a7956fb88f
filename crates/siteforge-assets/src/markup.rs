//! HTML page assembly.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use siteforge_include::Includer;
use siteforge_pipeline::{Task, TaskError, TaskOutput};

use crate::config::SiteConfig;
use crate::output::{relative_to, write_file};

/// Expands `@@include` directives in top-level pages and writes them to the
/// output root. Partials (`_*.html`) are excluded by the default patterns.
pub struct MarkupTask {
    config: SiteConfig,
    includer: Includer,
}

impl MarkupTask {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            config: config.clone(),
            includer: Includer::new(),
        }
    }

    fn build_page(&self, source: &Path, base: &Path) -> Result<PathBuf, TaskError> {
        let html = self
            .includer
            .expand_file(source)
            .map_err(|e| TaskError::compile(source.display(), e))?;

        let target = self
            .config
            .dest(&self.config.markup.dest)
            .join(relative_to(source, base));

        write_file(&target, html)
    }
}

impl Task for MarkupTask {
    fn name(&self) -> &'static str {
        "markup"
    }

    fn description(&self) -> &'static str {
        "Assemble HTML pages from partials"
    }

    fn run(&self) -> Result<TaskOutput, TaskError> {
        let group = self.config.source_group(&self.config.markup.src)?;

        let written = group
            .files()
            .par_iter()
            .map(|page| self.build_page(page, group.base()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TaskOutput { written })
    }
}
