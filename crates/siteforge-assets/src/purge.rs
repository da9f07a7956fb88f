//! Output directory purge.

use std::fs;
use std::path::{Component, Path, PathBuf};

use siteforge_pipeline::{Task, TaskError, TaskKind, TaskOutput};

use crate::config::SiteConfig;

/// Deletes the output directory and recreates it empty.
///
/// Refuses an empty output path and any output that is or contains the
/// source directory.
pub struct PurgeTask {
    output_dir: PathBuf,
    source_dir: PathBuf,
}

impl PurgeTask {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            output_dir: config.output_dir().to_path_buf(),
            source_dir: config.source_dir().to_path_buf(),
        }
    }

    fn check_target(&self) -> Result<(), TaskError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(TaskError::Other(
                "Refusing to purge: output directory is empty".to_string(),
            ));
        }

        let output = normalize(&self.output_dir)?;
        let source = normalize(&self.source_dir)?;
        if source.starts_with(&output) {
            return Err(TaskError::Other(format!(
                "Refusing to purge {}: it contains the source directory {}",
                self.output_dir.display(),
                self.source_dir.display()
            )));
        }
        Ok(())
    }
}

/// Absolute form of `path` with `.` and `..` resolved lexically.
fn normalize(path: &Path) -> Result<PathBuf, TaskError> {
    let absolute = std::path::absolute(path).map_err(|e| TaskError::read(path.display(), e))?;

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

impl Task for PurgeTask {
    fn name(&self) -> &'static str {
        "purge"
    }

    fn description(&self) -> &'static str {
        "Empty the output directory"
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Purge
    }

    fn run(&self) -> Result<TaskOutput, TaskError> {
        self.check_target()?;
        let dir = &self.output_dir;

        if dir.exists() {
            fs::remove_dir_all(dir).map_err(|e| TaskError::write(dir.display(), e))?;
            tracing::debug!("Removed {}", dir.display());
        }
        fs::create_dir_all(dir).map_err(|e| TaskError::write(dir.display(), e))?;

        Ok(TaskOutput::new())
    }
}
