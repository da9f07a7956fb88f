//! Include directive scanning.

use std::ops::Range;

use serde_json::{Map, Value};

/// A single `@@include(...)` directive found in a source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Byte range of the whole directive, prefix to closing paren
    pub span: Range<usize>,

    /// Path argument as written
    pub path: String,

    /// Optional JSON object passed as the second argument
    pub context: Option<Map<String, Value>>,

    /// Line where the directive starts (1-indexed)
    pub line: usize,
}

/// A malformed directive.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct DirectiveError {
    pub line: usize,
    pub message: String,
}

/// Find every include directive in `source`.
///
/// Recognised forms:
/// - `@@include('partial.html')`
/// - `@@include("partial.html", {"title": "Home"})`
pub fn find_directives(source: &str, prefix: &str) -> Result<Vec<Directive>, DirectiveError> {
    let keyword = format!("{}include", prefix);
    let mut directives = Vec::new();
    let mut cursor = 0;

    while let Some(found) = source[cursor..].find(&keyword) {
        let start = cursor + found;
        let line = line_of(source, start);
        let mut pos = skip_ws(source, start + keyword.len());

        // `@@includes` or `@@include_x` are not directives
        if !source[pos..].starts_with('(') {
            cursor = start + keyword.len();
            continue;
        }
        pos = skip_ws(source, pos + 1);

        let (path, after_path) = read_quoted(source, pos).ok_or_else(|| DirectiveError {
            line,
            message: "expected a quoted path".to_string(),
        })?;
        pos = skip_ws(source, after_path);

        let mut context = None;
        if source[pos..].starts_with(',') {
            pos = skip_ws(source, pos + 1);
            let end = matching_brace(source, pos).ok_or_else(|| DirectiveError {
                line,
                message: "expected a JSON object after ','".to_string(),
            })?;
            let map: Map<String, Value> =
                serde_json::from_str(&source[pos..end]).map_err(|e| DirectiveError {
                    line,
                    message: format!("invalid include context: {}", e),
                })?;
            context = Some(map);
            pos = skip_ws(source, end);
        }

        if !source[pos..].starts_with(')') {
            return Err(DirectiveError {
                line,
                message: "unclosed include directive".to_string(),
            });
        }

        directives.push(Directive {
            span: start..pos + 1,
            path,
            context,
            line,
        });
        cursor = pos + 1;
    }

    Ok(directives)
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

fn skip_ws(source: &str, pos: usize) -> usize {
    source[pos..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| pos + i)
        .unwrap_or(source.len())
}

/// Read a `'...'` or `"..."` literal starting at `pos`.
///
/// Returns the unquoted text and the offset just past the closing quote.
fn read_quoted(source: &str, pos: usize) -> Option<(String, usize)> {
    let quote = source[pos..].chars().next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    let body = &source[pos + 1..];
    let close = body.find(quote)?;
    Some((body[..close].to_string(), pos + 1 + close + 1))
}

/// Offset just past the `}` closing the object that opens at `pos`.
fn matching_brace(source: &str, pos: usize) -> Option<usize> {
    if !source[pos..].starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in source[pos..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos + i + 1);
                }
            }
            _ => {}
        }
    }

    None
}
