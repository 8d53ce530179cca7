//! Bootstrap of a new GitOps repository.
//!
//! This crate generates the CI/CD environment:
//! - Namespace, service account and RBAC for the pipeline runner
//! - Webhook and registry secrets behind a [`SecretSealer`]
//! - Tekton tasks, pipelines, bindings, templates and the event listener
//! - The kustomizations and starting manifest that tie them together

pub mod compose;
pub mod docker;
pub mod error;
pub mod generators;
pub mod policy;
pub mod writer;

pub use compose::{PIPELINES_FILE, create_cicd_resources, create_initial_files, org_repo_from_url};
pub use error::{BootstrapError, BootstrapResult};
pub use generators::{PlainSecrets, SecretSealer};
pub use policy::{BootstrapPolicy, PIPELINE_SERVICE_RULES};
pub use writer::{init, write_resources};
