//! CLI command implementations.

pub mod build;
pub mod init;
pub mod service;

use std::path::Path;

use anyhow::{Context, Result};

pub fn validate(path: &Path) -> Result<()> {
    let manifest = kubeseed_config::load_manifest(path)
        .with_context(|| format!("invalid manifest {}", path.display()))?;
    println!(
        "Manifest is valid ({} environments, {} applications)",
        manifest.environments.len(),
        manifest
            .environments
            .iter()
            .map(|env| env.apps.len())
            .sum::<usize>()
            + manifest.apps.len()
    );
    Ok(())
}
