//! Inline SVG sprite injection.

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use siteforge_include::Includer;
use siteforge_pipeline::{Task, TaskError, TaskOutput};

use crate::config::SiteConfig;
use crate::images::optimize_svg;
use crate::output::{read_text, stem, write_file};

pub const INJECT_START: &str = "<!-- inject:svg -->";
pub const INJECT_END: &str = "<!-- endinject -->";

/// Combines every source SVG into a hidden `<svg>` of `<symbol>`s and
/// injects it into the sprite page, writing the page to the output root.
pub struct SpriteTask {
    config: SiteConfig,
    includer: Includer,
}

impl SpriteTask {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            config: config.clone(),
            includer: Includer::new(),
        }
    }
}

impl Task for SpriteTask {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn description(&self) -> &'static str {
        "Inject an SVG sprite into the page"
    }

    fn run(&self) -> Result<TaskOutput, TaskError> {
        let icons = self.config.source_group(&self.config.sprite.src)?.files();

        let mut seen = HashSet::new();
        let mut symbols = Vec::with_capacity(icons.len());
        for icon in &icons {
            let id = stem(icon);
            if !seen.insert(id.clone()) {
                return Err(TaskError::compile(
                    icon.display(),
                    format!("duplicate symbol id '{}'", id),
                ));
            }
            let svg = read_text(icon)?;
            symbols.push(to_symbol(&id, &svg).map_err(|e| TaskError::compile(icon.display(), e))?);
        }

        let page = self.config.source_dir().join(&self.config.sprite.page);
        let html = self
            .includer
            .expand_file(&page)
            .map_err(|e| TaskError::compile(page.display(), e))?;
        let injected = inject(&html, &sprite(&symbols))
            .map_err(|e| TaskError::compile(page.display(), e))?;

        tracing::debug!("Injected {} symbols into {}", symbols.len(), page.display());

        let target = self.config.dest("").join(&self.config.sprite.page);
        let mut output = TaskOutput::new();
        output.push(write_file(&target, injected)?);
        Ok(output)
    }
}

/// Turn a standalone SVG document into a `<symbol>` with the given id,
/// keeping its `viewBox`.
pub fn to_symbol(id: &str, svg: &str) -> Result<String, String> {
    static ROOT: OnceLock<Regex> = OnceLock::new();
    static VIEW_BOX: OnceLock<Regex> = OnceLock::new();

    let root = ROOT.get_or_init(|| Regex::new(r"(?s)<svg\b([^>]*)>(.*)</svg>").expect("valid regex"));
    let view_box = VIEW_BOX
        .get_or_init(|| Regex::new(r#"viewBox\s*=\s*["']([^"']*)["']"#).expect("valid regex"));

    let cleaned = optimize_svg(svg);
    let caps = root
        .captures(&cleaned)
        .ok_or_else(|| "no <svg> root element".to_string())?;

    let attrs = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());

    Ok(match view_box.captures(attrs).and_then(|c| c.get(1)) {
        Some(vb) => format!(
            "<symbol id=\"{}\" viewBox=\"{}\">{}</symbol>",
            id,
            vb.as_str(),
            body
        ),
        None => format!("<symbol id=\"{}\">{}</symbol>", id, body),
    })
}

/// Wrap symbols in a hidden sprite element.
pub fn sprite(symbols: &[String]) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" style=\"display:none\">{}</svg>",
        symbols.concat()
    )
}

/// Replace whatever sits between the inject markers with `content`.
pub fn inject(html: &str, content: &str) -> Result<String, String> {
    let start = html
        .find(INJECT_START)
        .ok_or_else(|| format!("missing {} marker", INJECT_START))?;
    let body_start = start + INJECT_START.len();
    let end = html[body_start..]
        .find(INJECT_END)
        .map(|i| body_start + i)
        .ok_or_else(|| format!("missing {} marker", INJECT_END))?;

    Ok(format!("{}{}{}", &html[..body_start], content, &html[end..]))
}
