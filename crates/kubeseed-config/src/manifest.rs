//! Manifest loading and saving.

use std::path::Path;

use derive_more::Display;
use kubeseed_core::Manifest;
use tracing::debug;

use crate::{ConfigError, ConfigResult};

/// Encoding of a manifest file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ManifestFormat {
    #[display("yaml")]
    Yaml,
    #[display("json")]
    Json,
}

impl ManifestFormat {
    /// `.json` files are JSON, everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ManifestFormat::Json,
            _ => ManifestFormat::Yaml,
        }
    }
}

/// Parse and validate a manifest.
pub fn parse_manifest(text: &str, format: ManifestFormat) -> ConfigResult<Manifest> {
    let manifest: Manifest = match format {
        ManifestFormat::Yaml => serde_yaml_ng::from_str(text)?,
        ManifestFormat::Json => serde_json::from_str(text)?,
    };
    manifest.validate()?;
    Ok(manifest)
}

/// Serialize a manifest.
pub fn render_manifest(manifest: &Manifest, format: ManifestFormat) -> ConfigResult<String> {
    Ok(match format {
        ManifestFormat::Yaml => serde_yaml_ng::to_string(manifest)?,
        ManifestFormat::Json => serde_json::to_string_pretty(manifest)?,
    })
}

/// Read a manifest file, picking the format from its extension.
pub fn load_manifest(path: &Path) -> ConfigResult<Manifest> {
    let format = ManifestFormat::from_path(path);
    debug!(path = %path.display(), %format, "Loading manifest");
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(&text, format)
}

/// Write a manifest file, picking the format from its extension.
pub fn save_manifest(path: &Path, manifest: &Manifest) -> ConfigResult<()> {
    let text = render_manifest(manifest, ManifestFormat::from_path(path))?;
    std::fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
