//! Recursive include expansion.

use std::fs;
use std::path::{Path, PathBuf};

use crate::context::Context;
use crate::directive::find_directives;

/// Default directive prefix.
pub const DEFAULT_PREFIX: &str = "@@";

/// Maximum include nesting before giving up.
const DEFAULT_MAX_DEPTH: usize = 32;

/// Errors that can occur while expanding includes.
#[derive(Debug, thiserror::Error)]
pub enum IncludeError {
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid include in {path} at line {line}: {message}")]
    Syntax {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Include cycle: {0}")]
    Cycle(String),

    #[error("Includes nested deeper than {limit} levels at {path}")]
    TooDeep { path: String, limit: usize },
}

/// Expands `@@include` directives relative to the including file.
#[derive(Debug, Clone)]
pub struct Includer {
    prefix: String,
    max_depth: usize,
}

impl Default for Includer {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Includer {
    /// Create an includer with the default `@@` prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different directive prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Limit include nesting.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Read `path` and expand every include in it.
    pub fn expand_file(&self, path: &Path) -> Result<String, IncludeError> {
        let mut stack = Vec::new();
        self.expand_path(path, &Context::new(), &mut stack)
    }

    /// Expand includes in an in-memory source.
    ///
    /// `origin` names the file the source came from; includes resolve against
    /// its parent directory.
    pub fn expand_str(
        &self,
        source: &str,
        origin: &Path,
        context: &Context,
    ) -> Result<String, IncludeError> {
        let mut stack = vec![normalize(origin)];
        self.expand_source(source, origin, context, &mut stack)
    }

    fn expand_path(
        &self,
        path: &Path,
        context: &Context,
        stack: &mut Vec<PathBuf>,
    ) -> Result<String, IncludeError> {
        let key = normalize(path);

        if stack.contains(&key) {
            let chain = stack
                .iter()
                .chain(std::iter::once(&key))
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(IncludeError::Cycle(chain));
        }
        if stack.len() >= self.max_depth {
            return Err(IncludeError::TooDeep {
                path: path.display().to_string(),
                limit: self.max_depth,
            });
        }

        let source = fs::read_to_string(path).map_err(|e| IncludeError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        stack.push(key);
        let expanded = self.expand_source(&source, path, context, stack);
        stack.pop();

        expanded
    }

    fn expand_source(
        &self,
        source: &str,
        origin: &Path,
        context: &Context,
        stack: &mut Vec<PathBuf>,
    ) -> Result<String, IncludeError> {
        let directives =
            find_directives(source, &self.prefix).map_err(|e| IncludeError::Syntax {
                path: origin.display().to_string(),
                line: e.line,
                message: e.message,
            })?;

        let base = origin.parent().unwrap_or(Path::new(""));
        let mut out = String::with_capacity(source.len());
        let mut last = 0;

        for directive in directives {
            out.push_str(&context.substitute(&source[last..directive.span.start], &self.prefix));

            let target = base.join(&directive.path);
            let child = context.child(directive.context.as_ref());
            let included = self.expand_path(&target, &child, stack)?;

            out.push_str(&included);
            last = directive.span.end;
        }

        out.push_str(&context.substitute(&source[last..], &self.prefix));
        Ok(out)
    }
}

/// Canonical form used for cycle detection; falls back to the path as given
/// when the file does not exist yet.
fn normalize(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
