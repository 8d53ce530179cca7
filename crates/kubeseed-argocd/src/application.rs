//! Argo CD `Application` resource types.
//!
//! Only the fields kubeseed generates are modelled.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kubeseed_core::meta::TypeMeta;
use serde::{Deserialize, Serialize};

pub const API_VERSION: &str = "argoproj.io/v1alpha1";
pub const KIND: &str = "Application";

/// A set of manifests deployed from a Git source into a cluster namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: ApplicationSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    pub source: ApplicationSource,
    pub destination: ApplicationDestination,
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_policy: Option<SyncPolicy>,
}

/// Where the manifests are read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSource {
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    /// Commit, tag or branch; empty syncs to HEAD.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_revision: String,
}

/// Where the manifests are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDestination {
    pub server: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automated: Option<AutomatedSyncPolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatedSyncPolicy {
    /// Delete resources that are no longer in Git.
    pub prune: bool,
    /// Revert changes made in the cluster.
    pub self_heal: bool,
}

impl SyncPolicy {
    /// Automated sync with pruning and self-healing.
    pub fn automated() -> Self {
        Self {
            automated: Some(AutomatedSyncPolicy {
                prune: true,
                self_heal: true,
            }),
        }
    }
}
