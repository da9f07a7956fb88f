//! Scaffold a new site.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use siteforge_assets::SiteConfig;

use crate::config::load_config;

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing siteforge...");

    let config = load_config(config_path)?;
    let source = config.source_dir();

    if source.exists() && !yes {
        tracing::warn!(
            "{}/ directory already exists. Use --yes to overwrite.",
            source.display()
        );
        return Ok(());
    }

    let created = scaffold(config_path, &config, yes)?;
    for path in &created {
        tracing::info!("Created {}", path.display());
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'siteforge' to build, watch and serve.");

    Ok(())
}

/// Write the starter files. Existing files are kept unless `overwrite`.
pub fn scaffold(config_path: &Path, config: &SiteConfig, overwrite: bool) -> Result<Vec<PathBuf>> {
    let source = config.source_dir();
    for dir in ["scss", "js", "img", "fonts"] {
        let path = source.join(dir);
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }

    let files = [
        (config_path.to_path_buf(), DEFAULT_CONFIG),
        (source.join("index.html"), DEFAULT_INDEX),
        (source.join("_header.html"), DEFAULT_HEADER),
        (source.join("scss/style.scss"), DEFAULT_STYLE),
        (source.join(&config.styles.fonts_partial), ""),
        (source.join("js/main.js"), DEFAULT_MAIN),
        (source.join("js/vendors.js"), DEFAULT_VENDORS),
    ];

    let mut created = Vec::new();
    for (path, contents) in files {
        if path.exists() && !overwrite {
            continue;
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        created.push(path);
    }

    Ok(created)
}

const DEFAULT_CONFIG: &str = r##"# Siteforge Configuration
# Every value below is the default; delete what you don't change.

[paths]
source = "#src"
output = "dist"

[markup]
src = ["*.html", "!_*.html"]
watch = ["**/*.html"]

[styles]
src = ["scss/style.scss"]
watch = ["scss/**/*.scss"]
dest = "css"
browsers = ["last 5 versions"]

[scripts]
src = ["js/main.js", "js/vendors.js"]
watch = ["**/*.js"]
dest = "js"
browsers = ["last 5 versions"]

[images]
src = ["img/**/*.{jpg,png,svg,gif,ico,webp}"]
dest = "images"
jpeg_quality = 75

[fonts]
src = ["fonts/*.ttf"]
otf = ["fonts/*.otf"]
dest = "fonts"

[server]
host = "127.0.0.1"
port = 3000
open = true
"##;

const DEFAULT_INDEX: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Home</title>
  <link rel="stylesheet" href="css/style.min.css">
</head>
<body>
  <!-- inject:svg --><!-- endinject -->
  @@include('_header.html', {"title": "Home"})
  <main></main>
  <script src="js/vendors.min.js"></script>
  <script src="js/main.min.js"></script>
</body>
</html>
"#;

const DEFAULT_HEADER: &str = r#"<header class="header">
  <h1>@@title</h1>
</header>
"#;

const DEFAULT_STYLE: &str = r#"@mixin font($family, $face, $weight, $style) {
  @font-face {
    font-family: $family;
    font-display: swap;
    src: url("../fonts/#{$face}.woff2") format("woff2"),
      url("../fonts/#{$face}.woff") format("woff");
    font-weight: #{$weight};
    font-style: #{$style};
  }
}

@import "fonts";

*,
*::before,
*::after {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: system-ui, sans-serif;
}
"#;

const DEFAULT_MAIN: &str = r#"document.addEventListener('DOMContentLoaded', () => {
  document.documentElement.classList.add('loaded');
});
"#;

const DEFAULT_VENDORS: &str = "// Third-party libraries, pulled in with include directives.\n";
