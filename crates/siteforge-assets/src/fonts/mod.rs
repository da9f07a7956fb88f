//! Web font generation.
//!
//! TrueType sources are wrapped as WOFF and WOFF2. OpenType sources with
//! TrueType outlines are first normalized to `.ttf` next to the original;
//! CFF-flavoured `.otf` files are wrapped directly.

pub mod sfnt;
pub mod woff;
pub mod woff2;

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use siteforge_pipeline::{Task, TaskError, TaskKind, TaskOutput};

use crate::config::SiteConfig;
use crate::output::{read_file, stem, write_file};
use sfnt::{Outlines, Sfnt, TRUETYPE};

/// Converts each font source to `<name>.woff` and `<name>.woff2`.
pub struct FontsTask {
    config: SiteConfig,
}

impl FontsTask {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// `.ttf` sources plus CFF `.otf` files that have no `.ttf` sibling.
    fn sources(&self) -> Result<Vec<PathBuf>, TaskError> {
        let mut sources = self.config.source_group(&self.config.fonts.src)?.files();

        for otf in self.config.source_group(&self.config.fonts.otf)?.files() {
            if otf.with_extension("ttf").exists() {
                continue;
            }
            let font = parse_font(&otf)?;
            if font.outlines() == Outlines::Cff {
                sources.push(otf);
            }
        }

        sources.sort();
        Ok(sources)
    }

    fn convert(&self, source: &Path) -> Result<Vec<PathBuf>, TaskError> {
        let font = parse_font(source)?;
        let name = stem(source);
        let dest = self.config.dest(&self.config.fonts.dest);

        let woff = woff::encode(&font).map_err(|e| TaskError::compile(source.display(), e))?;
        let woff2 = woff2::encode(&font).map_err(|e| TaskError::compile(source.display(), e))?;

        Ok(vec![
            write_file(&dest.join(format!("{}.woff", name)), woff)?,
            write_file(&dest.join(format!("{}.woff2", name)), woff2)?,
        ])
    }
}

impl Task for FontsTask {
    fn name(&self) -> &'static str {
        "fonts"
    }

    fn description(&self) -> &'static str {
        "Convert fonts to WOFF and WOFF2"
    }

    fn run(&self) -> Result<TaskOutput, TaskError> {
        let sources = self.sources()?;
        let written = sources
            .par_iter()
            .map(|source| self.convert(source))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TaskOutput {
            written: written.into_iter().flatten().collect(),
        })
    }
}

/// Rewrites TrueType-outline `.otf` files as `.ttf` in the source tree so the
/// fonts task picks them up.
pub struct OtfTask {
    config: SiteConfig,
}

impl OtfTask {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn normalize(&self, source: &Path) -> Result<Option<PathBuf>, TaskError> {
        let mut font = parse_font(source)?;
        if font.outlines() == Outlines::Cff {
            tracing::info!(
                "{}: CFF outlines, wrapped without conversion",
                source.display()
            );
            return Ok(None);
        }

        font.flavor = TRUETYPE;
        let bytes = font.to_bytes();
        let target = source.with_extension("ttf");

        // Leave an up-to-date file untouched so its mtime stays put.
        if std::fs::read(&target).is_ok_and(|existing| existing == bytes) {
            return Ok(None);
        }
        write_file(&target, bytes).map(Some)
    }
}

impl Task for OtfTask {
    fn name(&self) -> &'static str {
        "fonts-otf"
    }

    fn description(&self) -> &'static str {
        "Normalize OpenType fonts to TrueType"
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Source
    }

    fn run(&self) -> Result<TaskOutput, TaskError> {
        let mut output = TaskOutput::new();
        for source in self.config.source_group(&self.config.fonts.otf)?.files() {
            if let Some(written) = self.normalize(&source)? {
                output.push(written);
            }
        }
        Ok(output)
    }
}

fn parse_font(path: &Path) -> Result<Sfnt, TaskError> {
    let bytes = read_file(path)?;
    Sfnt::parse(&bytes).map_err(|e| TaskError::compile(path.display(), e))
}
