//! Configuration parsing for kubeseed.
//!
//! This crate handles:
//! - Loading and saving manifests (YAML or JSON)
//! - Bootstrap options and their defaults

pub mod bootstrap;
pub mod error;
pub mod manifest;

pub use bootstrap::BootstrapOptions;
pub use error::{ConfigError, ConfigResult};
pub use manifest::{ManifestFormat, load_manifest, parse_manifest, render_manifest, save_manifest};
