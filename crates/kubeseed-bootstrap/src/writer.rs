//! Writing resource sets to disk.

use std::path::{Path, PathBuf};

use kubeseed_config::BootstrapOptions;
use kubeseed_core::Resources;
use tracing::{debug, info};

use crate::compose::{PIPELINES_FILE, create_initial_files};
use crate::error::{BootstrapError, BootstrapResult};
use crate::generators::SecretSealer;
use crate::policy::BootstrapPolicy;

/// Write every document in `resources` as YAML below `root`, creating
/// directories as needed. Returns the written paths in key order.
pub fn write_resources(root: &Path, resources: &Resources) -> BootstrapResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(resources.len());
    for (key, document) in resources.iter() {
        let path = root.join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| BootstrapError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let yaml = serde_yaml_ng::to_string(document).map_err(|source| BootstrapError::Yaml {
            path: key.clone(),
            source,
        })?;
        std::fs::write(&path, yaml).map_err(|source| BootstrapError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Wrote resource");
        written.push(path);
    }
    Ok(written)
}

/// Generate the initial repository layout and write it to
/// `opts.output_path`.
///
/// Refuses to run when the output already holds a manifest. Nothing is
/// written if generation fails.
pub fn init(
    opts: &BootstrapOptions,
    policy: &BootstrapPolicy,
    sealer: &dyn SecretSealer,
) -> BootstrapResult<Vec<PathBuf>> {
    opts.validate()?;

    let manifest_path = opts.output_path.join(PIPELINES_FILE);
    if manifest_path.exists() {
        return Err(BootstrapError::OutputExists(manifest_path));
    }

    let files = create_initial_files(opts, policy, sealer)?;
    let written = write_resources(&opts.output_path, &files)?;
    info!(
        output = %opts.output_path.display(),
        files = written.len(),
        "Bootstrapped GitOps repository"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::PlainSecrets;
    use kubeseed_config::load_manifest;
    use serde_json::json;

    #[test]
    fn test_write_resources_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut resources = Resources::new();
        resources
            .insert("config/a/kustomization.yaml", json!({ "resources": ["x.yaml"] }))
            .unwrap();

        let written = write_resources(dir.path(), &resources).unwrap();
        assert_eq!(written, vec![dir.path().join("config/a/kustomization.yaml")]);

        let text = std::fs::read_to_string(&written[0]).unwrap();
        let value: serde_json::Value = serde_yaml_ng::from_str(&text).unwrap();
        assert_eq!(value, json!({ "resources": ["x.yaml"] }));
    }

    #[test]
    fn test_init_writes_loadable_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let opts = BootstrapOptions::new("https://github.com/foo/bar.git", "123")
            .with_prefix("tst-")
            .with_output_path(dir.path());

        let written = init(&opts, &BootstrapPolicy::default(), &PlainSecrets).unwrap();
        assert!(written.contains(&dir.path().join(PIPELINES_FILE)));
        assert!(dir
            .path()
            .join("config/tst-cicd/base/pipelines/01-namespaces/cicd-environment.yaml")
            .is_file());

        let manifest = load_manifest(&dir.path().join(PIPELINES_FILE)).unwrap();
        assert_eq!(manifest.cicd_config().unwrap().namespace, "tst-cicd");
    }

    #[test]
    fn test_init_refuses_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PIPELINES_FILE), "gitops_url: x\n").unwrap();
        let opts = BootstrapOptions::new("https://github.com/foo/bar.git", "123")
            .with_output_path(dir.path());

        let err = init(&opts, &BootstrapPolicy::default(), &PlainSecrets).unwrap_err();
        assert!(matches!(err, BootstrapError::OutputExists(_)));
    }

    #[test]
    fn test_init_writes_nothing_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let opts = BootstrapOptions::new("https://github.com/foo/bar.git", "123")
            .with_docker_config_json(dir.path().join("missing.json").to_str().unwrap())
            .with_output_path(dir.path().join("out"));

        let err = init(&opts, &BootstrapPolicy::default(), &PlainSecrets).unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Core(kubeseed_core::Error::InvalidSourceInput { .. })
        ));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_init_requires_webhook_secret() {
        let dir = tempfile::tempdir().unwrap();
        let opts = BootstrapOptions::new("https://github.com/foo/bar.git", "")
            .with_output_path(dir.path());
        let err = init(&opts, &BootstrapPolicy::default(), &PlainSecrets).unwrap_err();
        assert!(matches!(err, BootstrapError::Config(_)));
    }
}
