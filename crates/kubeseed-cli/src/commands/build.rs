//! Argo CD application generation command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

pub fn run(manifest_path: &Path, output: &Path) -> Result<Vec<PathBuf>> {
    let manifest = kubeseed_config::load_manifest(manifest_path)
        .with_context(|| format!("failed to load {}", manifest_path.display()))?;

    let resources = kubeseed_argocd::build(&manifest).context("failed to build applications")?;
    if resources.is_empty() {
        info!("No Argo CD configuration, nothing to write");
        return Ok(Vec::new());
    }

    let written = kubeseed_bootstrap::write_resources(output, &resources)
        .with_context(|| format!("failed to write to {}", output.display()))?;
    println!("Wrote {} files to {}", written.len(), output.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
gitops_url: https://github.com/org/gitops
config:
  argocd:
    namespace: argocd
environments:
  - name: dev
    services:
      - name: api
    apps:
      - name: shop
        services: [api]
"#;

    #[test]
    fn test_build_writes_applications() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("pipelines.yaml");
        std::fs::write(&manifest, MANIFEST).unwrap();

        let written = run(&manifest, dir.path()).unwrap();
        assert_eq!(
            written,
            vec![
                dir.path().join("config/argocd/config/dev-shop-app.yaml"),
                dir.path().join("config/argocd/config/kustomization.yaml"),
            ]
        );
    }

    #[test]
    fn test_build_without_argocd_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("pipelines.yaml");
        std::fs::write(&manifest, "gitops_url: https://github.com/org/gitops\n").unwrap();

        assert!(run(&manifest, dir.path()).unwrap().is_empty());
        assert!(!dir.path().join("config").exists());
    }
}
