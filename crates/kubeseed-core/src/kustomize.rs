//! Index documents for kustomize directory composition.

use serde::{Deserialize, Serialize};

/// File name of the index document in every composed directory.
pub const KUSTOMIZATION: &str = "kustomization.yaml";

/// A `kustomization.yaml` listing sibling resources and base directories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kustomization {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
}

impl Kustomization {
    pub fn with_resources<I, S>(resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resources: resources.into_iter().map(Into::into).collect(),
            bases: Vec::new(),
        }
    }

    pub fn with_bases<I, S>(bases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resources: Vec::new(),
            bases: bases.into_iter().map(Into::into).collect(),
        }
    }
}
