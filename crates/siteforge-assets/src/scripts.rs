//! Script bundling and minification.

use std::path::{Path, PathBuf};

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{CompressOptions, MangleOptions, Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_syntax::es_target::ESTarget;
use oxc_transformer::{EnvOptions, TransformOptions, Transformer};
use siteforge_include::Includer;
use siteforge_pipeline::{Task, TaskError, TaskOutput};

use crate::config::SiteConfig;
use crate::output::{stem, write_file};

/// Inlines `@@include` directives, lowers syntax for the configured
/// browsers, then emits each entry point twice: readable (`<name>.js`) and
/// minified (`<name>.min.js`).
pub struct ScriptsTask {
    config: SiteConfig,
    includer: Includer,
}

/// Both renderings of one script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptOutput {
    pub code: String,
    pub minified: String,
}

impl ScriptsTask {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            config: config.clone(),
            includer: Includer::new(),
        }
    }

    fn build_entry(&self, source: &Path) -> Result<Vec<PathBuf>, TaskError> {
        let bundled = self
            .includer
            .expand_file(source)
            .map_err(|e| TaskError::compile(source.display(), e))?;

        let rendered = transform_script(
            &bundled,
            &source.display().to_string(),
            &self.config.scripts.browsers,
        )
            .map_err(|e| TaskError::compile(source.display(), e))?;

        let name = stem(source);
        let dest = self.config.dest(&self.config.scripts.dest);
        Ok(vec![
            write_file(&dest.join(format!("{}.js", name)), rendered.code)?,
            write_file(&dest.join(format!("{}.min.js", name)), rendered.minified)?,
        ])
    }
}

impl Task for ScriptsTask {
    fn name(&self) -> &'static str {
        "scripts"
    }

    fn description(&self) -> &'static str {
        "Bundle includes, transpile, then emit readable and minified scripts"
    }

    fn run(&self) -> Result<TaskOutput, TaskError> {
        let entries = self.config.source_group(&self.config.scripts.src)?.files();
        if entries.is_empty() {
            tracing::debug!("No script entry points matched");
        }

        let mut output = TaskOutput::new();
        for entry in &entries {
            output.written.extend(self.build_entry(entry)?);
        }
        Ok(output)
    }
}

/// Parse a script, lower syntax the `browsers` targets lack, then print it
/// both readable and minified.
///
/// Syntax errors are reported with the first diagnostic's message.
pub fn transform_script(
    source: &str,
    filename: &str,
    browsers: &[String],
) -> Result<ScriptOutput, String> {
    let env = EnvOptions::from_browserslist_query(&browsers.join(", "))
        .map_err(|e| format!("{}: invalid browser targets: {}", filename, e))?;
    let options = TransformOptions {
        env,
        ..TransformOptions::default()
    };

    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if let Some(error) = parsed.errors.first() {
        return Err(format!("{}: {}", filename, error));
    }
    let mut program = parsed.program;

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let lowered = Transformer::new(&allocator, Path::new(filename), &options)
        .build_with_scoping(scoping, &mut program);
    if let Some(error) = lowered.errors.first() {
        return Err(format!("{}: {}", filename, error));
    }
    let code = Codegen::new().build(&program).code;

    // Compression must not reintroduce syntax that was just lowered
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions {
            target: ESTarget::ES5,
            ..CompressOptions::default()
        }),
    };
    let minified = Minifier::new(options).build(&allocator, &mut program);
    let minified = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            ..CodegenOptions::default()
        })
        .with_scoping(minified.scoping)
        .build(&program)
        .code;

    Ok(ScriptOutput { code, minified })
}
