//! Trait definitions for build tasks.

use std::path::PathBuf;

/// How a task touches the file system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Empties the output directory
    Purge,
    /// Writes into the output directory
    Writer,
    /// Writes only into the source tree
    Source,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purge => "purge",
            Self::Writer => "writer",
            Self::Source => "source",
        }
    }
}

/// Files produced by one task invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskOutput {
    /// Paths written, in the order they were written
    pub written: Vec<PathBuf>,
}

impl TaskOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a written file.
    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.written.push(path.into());
    }

    /// Merge another output into this one.
    pub fn extend(&mut self, other: TaskOutput) {
        self.written.extend(other.written);
    }

    pub fn len(&self) -> usize {
        self.written.len()
    }

    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }
}

/// Errors that can occur while a task runs.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error("Failed to compile {path}: {message}")]
    Compile { path: String, message: String },

    #[error("Invalid pattern: {0}")]
    Pattern(String),

    #[error("{0}")]
    Other(String),
}

impl TaskError {
    pub fn read(path: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Read {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    pub fn write(path: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Write {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    pub fn compile(path: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Compile {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

/// A named, independently invokable unit of file transformation.
///
/// Tasks receive their configuration at construction and share no mutable
/// state, so the runner may execute independent tasks concurrently.
pub trait Task: Send + Sync {
    /// Registry name (e.g., "styles")
    fn name(&self) -> &'static str;

    /// One-line summary shown by `siteforge list`
    fn description(&self) -> &'static str;

    /// How the task touches the file system
    fn kind(&self) -> TaskKind {
        TaskKind::Writer
    }

    /// Run the task to completion.
    fn run(&self) -> Result<TaskOutput, TaskError>;
}
