//! SCSS compilation with vendor prefixing and minification.

use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use siteforge_pipeline::{Task, TaskError, TaskOutput};

use crate::config::SiteConfig;
use crate::output::{stem, write_file};

/// Compiles each SCSS entry point to `<name>.css` (expanded) and
/// `<name>.min.css` (compressed), both prefixed for the configured browsers.
pub struct StylesTask {
    config: SiteConfig,
}

impl StylesTask {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn build_entry(&self, source: &Path, targets: Targets) -> Result<Vec<PathBuf>, TaskError> {
        let css = compile_scss(source).map_err(|e| TaskError::compile(source.display(), e))?;

        let name = stem(source);
        let filename = source.display().to_string();
        let expanded = process_css(&css, &filename, targets, false)
            .map_err(|e| TaskError::compile(source.display(), e))?;
        let minified = process_css(&css, &filename, targets, true)
            .map_err(|e| TaskError::compile(source.display(), e))?;

        let dest = self.config.dest(&self.config.styles.dest);
        Ok(vec![
            write_file(&dest.join(format!("{}.css", name)), expanded)?,
            write_file(&dest.join(format!("{}.min.css", name)), minified)?,
        ])
    }
}

impl Task for StylesTask {
    fn name(&self) -> &'static str {
        "styles"
    }

    fn description(&self) -> &'static str {
        "Compile SCSS to prefixed and minified CSS"
    }

    fn run(&self) -> Result<TaskOutput, TaskError> {
        let targets = browser_targets(&self.config.styles.browsers).map_err(TaskError::Other)?;
        let entries = self.config.source_group(&self.config.styles.src)?.files();

        let mut output = TaskOutput::new();
        for entry in &entries {
            output.written.extend(self.build_entry(entry, targets)?);
        }
        Ok(output)
    }
}

/// Compile an SCSS file to expanded CSS. Imports resolve relative to the
/// file.
pub fn compile_scss(path: &Path) -> Result<String, String> {
    let options = grass::Options::default().style(grass::OutputStyle::Expanded);
    grass::from_path(path, &options).map_err(|e| e.to_string())
}

/// Resolve browserslist queries into lightningcss targets.
pub fn browser_targets(queries: &[String]) -> Result<Targets, String> {
    if queries.is_empty() {
        return Ok(Targets::default());
    }
    let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
        .map_err(|e| format!("Invalid browser query: {}", e))?;

    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

/// Prefix CSS for `targets`, optionally minifying the printed output.
pub fn process_css(css: &str, filename: &str, targets: Targets, minify: bool) -> Result<String, String> {
    let mut stylesheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| format!("CSS parse error: {}", e))?;

    stylesheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| format!("CSS minify error: {}", e))?;

    let printed = stylesheet
        .to_css(PrinterOptions {
            minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| format!("CSS print error: {}", e))?;

    Ok(printed.code)
}
