//! Service management commands.

use std::path::Path;

use anyhow::{Context, Result};
use kubeseed_core::Service;
use tracing::info;

const DEFAULT_CICD_NAMESPACE: &str = "cicd";

pub struct AddService {
    pub environment: String,
    pub application: String,
    pub name: String,
    pub source_url: Option<String>,
    pub webhook_secret: Option<String>,
}

/// Add a service to the manifest at `path` and save it back.
pub fn add(path: &Path, request: AddService) -> Result<()> {
    let mut manifest = kubeseed_config::load_manifest(path)
        .with_context(|| format!("failed to load {}", path.display()))?;

    let mut service = Service::new(&request.name);
    if let Some(url) = request.source_url {
        service = service.with_source_url(url);
    }
    if let Some(secret) = request.webhook_secret {
        let namespace = manifest
            .cicd_config()
            .map(|cicd| cicd.namespace.clone())
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| DEFAULT_CICD_NAMESPACE.to_string());
        service = service.with_webhook_secret(secret, namespace);
    }

    manifest
        .add_service(&request.environment, &request.application, service)
        .with_context(|| format!("failed to add service {}", request.name))?;
    manifest.validate().context("manifest is invalid after adding service")?;

    kubeseed_config::save_manifest(path, &manifest)
        .with_context(|| format!("failed to save {}", path.display()))?;
    info!(
        service = %request.name,
        env = %request.environment,
        app = %request.application,
        "Added service"
    );
    Ok(())
}
