//! Config file loading.

use std::fs;
use std::path::Path;

use anyhow::Result;
use siteforge_assets::SiteConfig;

/// Load `path` if it exists, otherwise the default layout.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<SiteConfig> {
    if !path.exists() {
        tracing::debug!("No {}, using defaults", path.display());
        return Ok(SiteConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let config = SiteConfig::from_toml_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}
