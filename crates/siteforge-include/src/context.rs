//! Variables visible to an included file.

use serde_json::{Map, Value};

/// Variables substituted as `@@name` inside included content.
///
/// Nested includes inherit their parent's variables; values passed to the
/// nested directive shadow inherited ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    vars: Map<String, Value>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from a JSON object.
    pub fn from_map(vars: Map<String, Value>) -> Self {
        Self { vars }
    }

    /// Set a single variable.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// A child context: this context's variables overlaid with `overrides`.
    pub fn child(&self, overrides: Option<&Map<String, Value>>) -> Self {
        let mut vars = self.vars.clone();
        if let Some(overrides) = overrides {
            for (k, v) in overrides {
                vars.insert(k.clone(), v.clone());
            }
        }
        Self { vars }
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Look up a dotted name such as `page.title`.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut parts = name.split('.');
        let mut value = self.vars.get(parts.next()?)?;
        for part in parts {
            value = value.as_object()?.get(part)?;
        }
        Some(value)
    }

    /// Replace every known `<prefix>name` in `text`.
    ///
    /// Unknown names are left as written.
    pub fn substitute(&self, text: &str, prefix: &str) -> String {
        if self.is_empty() || prefix.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(found) = rest.find(prefix) {
            out.push_str(&rest[..found]);
            let after = &rest[found + prefix.len()..];
            let name_len = variable_len(after);
            let name = &after[..name_len];

            match self.lookup(name) {
                Some(value) if name_len > 0 => {
                    out.push_str(&render(value));
                    rest = &after[name_len..];
                }
                _ => {
                    out.push_str(prefix);
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// Length of the variable name at the start of `text`.
fn variable_len(text: &str) -> usize {
    let mut len = 0;
    for (i, c) in text.char_indices() {
        let ok = if i == 0 {
            c.is_ascii_alphabetic() || c == '_'
        } else {
            c.is_ascii_alphanumeric() || c == '_' || c == '.'
        };
        if !ok {
            break;
        }
        len = i + c.len_utf8();
    }
    // A trailing dot is punctuation, not part of the name
    text[..len].trim_end_matches('.').len()
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
