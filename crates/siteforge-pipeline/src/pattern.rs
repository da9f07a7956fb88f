//! Glob patterns grouping source files by role.

use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

/// Errors from malformed patterns.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid glob pattern '{pattern}': {message}")]
pub struct PatternError {
    pub pattern: String,
    pub message: String,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A set of include and exclude globs relative to a root directory.
///
/// Patterns starting with `!` exclude. `{a,b}` alternation is expanded
/// before matching, and `**` spans directories.
#[derive(Debug, Clone)]
pub struct FileGroup {
    root: PathBuf,
    base: PathBuf,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl FileGroup {
    /// Compile `patterns` relative to `root`.
    pub fn new<S: AsRef<str>>(root: impl Into<PathBuf>, patterns: &[S]) -> Result<Self, PatternError> {
        let mut include = Vec::new();
        let mut exclude = Vec::new();
        let mut bases = Vec::new();

        for raw in patterns {
            let raw = raw.as_ref();
            let (target, body) = match raw.strip_prefix('!') {
                Some(rest) => (&mut exclude, rest),
                None => {
                    bases.push(glob_base(raw));
                    (&mut include, raw)
                }
            };
            for expanded in expand_braces(body) {
                let pattern = Pattern::new(&expanded).map_err(|e| PatternError {
                    pattern: raw.to_string(),
                    message: e.to_string(),
                })?;
                target.push(pattern);
            }
        }

        let root = root.into();
        let base = root.join(common_prefix(&bases));

        Ok(Self {
            root,
            base,
            include,
            exclude,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deepest directory shared by every include pattern before its first
    /// wildcard (`img/**/*.png` has base `<root>/img`). Outputs mirror
    /// source paths relative to this directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Check a path relative to the root.
    pub fn matches_relative(&self, relative: &Path) -> bool {
        let text = to_slash(relative);
        self.include
            .iter()
            .any(|p| p.matches_with(&text, MATCH_OPTIONS))
            && !self
                .exclude
                .iter()
                .any(|p| p.matches_with(&text, MATCH_OPTIONS))
    }

    /// Check a path that may be absolute or relative to the current
    /// directory. Paths outside the root never match.
    pub fn matches(&self, path: &Path) -> bool {
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        let relative = path
            .strip_prefix(&self.root)
            .or_else(|_| path.strip_prefix(&root));

        match relative {
            Ok(rel) => self.matches_relative(rel),
            Err(_) => false,
        }
    }

    /// All matching files under the root, sorted.
    ///
    /// A missing root yields no files.
    pub fn files(&self) -> Vec<PathBuf> {
        if !self.root.exists() {
            return Vec::new();
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let rel = e.path().strip_prefix(&self.root).ok()?;
                self.matches_relative(rel).then(|| e.path().to_path_buf())
            })
            .collect();

        files.sort();
        files
    }
}

/// Expand `{a,b}` alternations into separate patterns.
///
/// Nested groups are expanded left to right; unbalanced braces are kept
/// literally.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };

    let mut depth = 0;
    let mut close = None;
    for (i, c) in pattern[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(open + i);
                    break;
                }
            }
            _ => {}
        }
    }
    let Some(close) = close else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    let body = &pattern[open + 1..close];

    split_top_level(body)
        .into_iter()
        .flat_map(|alt| expand_braces(&format!("{}{}{}", prefix, alt, suffix)))
        .collect()
}

/// Literal directory prefix of a pattern.
fn glob_base(pattern: &str) -> PathBuf {
    let parts: Vec<&str> = pattern.split('/').collect();
    let dirs = &parts[..parts.len().saturating_sub(1)];
    dirs.iter()
        .take_while(|part| !part.contains(['*', '?', '[', '{']))
        .collect()
}

fn common_prefix(paths: &[PathBuf]) -> PathBuf {
    let Some((first, rest)) = paths.split_first() else {
        return PathBuf::new();
    };
    first
        .components()
        .enumerate()
        .take_while(|(i, c)| rest.iter().all(|p| p.components().nth(*i) == Some(*c)))
        .map(|(_, c)| c)
        .collect()
}

fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
