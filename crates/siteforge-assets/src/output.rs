//! Output file helpers shared by the tasks.

use std::fs;
use std::path::{Path, PathBuf};

use siteforge_pipeline::TaskError;

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<PathBuf, TaskError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TaskError::write(parent.display(), e))?;
    }
    fs::write(path, contents).map_err(|e| TaskError::write(path.display(), e))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(path.to_path_buf())
}

pub fn read_file(path: &Path) -> Result<Vec<u8>, TaskError> {
    fs::read(path).map_err(|e| TaskError::read(path.display(), e))
}

pub fn read_text(path: &Path) -> Result<String, TaskError> {
    fs::read_to_string(path).map_err(|e| TaskError::read(path.display(), e))
}

/// File name without the extension (`main.js` → `main`).
pub fn stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// `path` relative to `root`, or just its file name when it lies elsewhere.
pub fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.file_name().map(PathBuf::from).unwrap_or_default())
}
