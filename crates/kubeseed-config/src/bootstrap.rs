//! Options for bootstrapping a new GitOps repository.

use std::path::PathBuf;

use kubeseed_core::manifest::validate_namespace;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

const CICD_SUFFIX: &str = "cicd";

/// Inputs to the bootstrap composer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapOptions {
    /// GitOps repository URL (e.g. `https://github.com/org/gitops.git`).
    pub gitops_repo_url: String,
    /// Secret used to validate GitOps repository webhooks.
    pub gitops_webhook_secret: String,
    /// Docker `config.json` with registry credentials, `~` is expanded.
    pub docker_config_json: Option<String>,
    /// Directory the generated files are written to.
    pub output_path: PathBuf,
    /// Prefix for the generated namespaces.
    pub prefix: String,
}

impl BootstrapOptions {
    pub fn new(
        gitops_repo_url: impl Into<String>,
        gitops_webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            gitops_repo_url: gitops_repo_url.into(),
            gitops_webhook_secret: gitops_webhook_secret.into(),
            output_path: PathBuf::from("."),
            ..Self::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_docker_config_json(mut self, path: impl Into<String>) -> Self {
        self.docker_config_json = Some(path.into());
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Namespace of the CI/CD environment: the prefix followed by `cicd`.
    pub fn cicd_namespace(&self) -> String {
        format!("{}{}", self.prefix, CICD_SUFFIX)
    }

    /// Check that the required fields are present and that the prefix yields
    /// a valid namespace.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.gitops_repo_url.trim().is_empty() {
            return Err(ConfigError::MissingField("gitops repository URL".to_string()));
        }
        if self.gitops_webhook_secret.is_empty() {
            return Err(ConfigError::MissingField("gitops webhook secret".to_string()));
        }
        validate_namespace(&self.cicd_namespace())?;
        Ok(())
    }
}
