//! Site layout and transform options (siteforge.toml).

use std::path::PathBuf;

use serde::Deserialize;
use siteforge_pipeline::{FileGroup, TaskError};

/// Complete build configuration.
///
/// Every section and field has a default, so an empty file describes the
/// standard `#src` → `dist` layout.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    pub paths: PathsConfig,
    pub markup: MarkupConfig,
    pub styles: StylesConfig,
    pub scripts: ScriptsConfig,
    pub images: ImagesConfig,
    pub fonts: FontsConfig,
    pub sprite: SpriteConfig,
    pub server: ServerConfig,
}

/// Source and output roots.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Source directory
    pub source: PathBuf,
    /// Output directory, purged on every build
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("#src"),
            output: PathBuf::from("dist"),
        }
    }
}

/// HTML pages.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarkupConfig {
    pub src: Vec<String>,
    pub watch: Vec<String>,
    pub dest: String,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            src: strings(&["*.html", "!_*.html"]),
            watch: strings(&["**/*.html"]),
            dest: String::new(),
        }
    }
}

/// SCSS entry points.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StylesConfig {
    pub src: Vec<String>,
    pub watch: Vec<String>,
    pub dest: String,
    /// Browserslist queries used for vendor prefixing
    pub browsers: Vec<String>,
    /// Generated font include file, relative to the source directory
    pub fonts_partial: String,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            src: strings(&["scss/style.scss"]),
            watch: strings(&["scss/**/*.scss"]),
            dest: "css".to_string(),
            browsers: strings(&["last 5 versions"]),
            fonts_partial: "scss/_fonts.scss".to_string(),
        }
    }
}

/// JavaScript entry points.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScriptsConfig {
    pub src: Vec<String>,
    pub watch: Vec<String>,
    pub dest: String,
    /// Browserslist queries that decide which syntax gets lowered
    pub browsers: Vec<String>,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            src: strings(&["js/main.js", "js/vendors.js"]),
            watch: strings(&["**/*.js"]),
            dest: "js".to_string(),
            browsers: strings(&["last 5 versions"]),
        }
    }
}

/// Raster and vector images.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImagesConfig {
    pub src: Vec<String>,
    pub watch: Vec<String>,
    pub dest: String,
    /// JPEG re-encoding quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            src: strings(&["img/**/*.{jpg,png,svg,gif,ico,webp}"]),
            watch: strings(&["img/**/*.{jpg,png,svg,gif,ico,webp}"]),
            dest: "images".to_string(),
            jpeg_quality: 75,
        }
    }
}

/// Font sources.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FontsConfig {
    /// TrueType sources converted to WOFF and WOFF2
    pub src: Vec<String>,
    /// OpenType sources normalized to TrueType
    pub otf: Vec<String>,
    pub dest: String,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            src: strings(&["fonts/*.ttf"]),
            otf: strings(&["fonts/*.otf"]),
            dest: "fonts".to_string(),
        }
    }
}

/// Inline SVG sprite.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpriteConfig {
    /// SVG files combined into the sprite
    pub src: Vec<String>,
    /// Page the sprite is injected into, relative to the source directory
    pub page: String,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            src: strings(&["**/*.svg"]),
            page: "index.html".to_string(),
        }
    }
}

/// Development server.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Open a browser once the server is up
    pub open: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            open: true,
        }
    }
}

impl SiteConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Defaults rooted at `source` and `output`.
    pub fn with_paths(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            paths: PathsConfig {
                source: source.into(),
                output: output.into(),
            },
            ..Default::default()
        }
    }

    pub fn source_dir(&self) -> &std::path::Path {
        &self.paths.source
    }

    pub fn output_dir(&self) -> &std::path::Path {
        &self.paths.output
    }

    /// An output sub-directory.
    pub fn dest(&self, sub: &str) -> PathBuf {
        if sub.is_empty() {
            self.paths.output.clone()
        } else {
            self.paths.output.join(sub)
        }
    }

    /// Compile patterns relative to the source directory.
    pub fn source_group(&self, patterns: &[String]) -> Result<FileGroup, TaskError> {
        FileGroup::new(&self.paths.source, patterns).map_err(|e| TaskError::Pattern(e.to_string()))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
