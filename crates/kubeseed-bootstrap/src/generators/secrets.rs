//! Secret documents and the sealing seam.
//!
//! Secrets never reach the output unsealed unless the caller chooses
//! [`PlainSecrets`]; encrypting for a cluster is left to other
//! [`SecretSealer`] implementations.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use kubeseed_core::meta::{NamespacedName, object_meta};
use kubeseed_core::resources::{Document, to_document};
use kubeseed_core::Result;

pub const DOCKER_CONFIG_JSON_KEY: &str = ".dockerconfigjson";
const DOCKER_CONFIG_JSON_TYPE: &str = "kubernetes.io/dockerconfigjson";
const OPAQUE_TYPE: &str = "Opaque";

/// Turns a plaintext secret into the document committed to Git.
pub trait SecretSealer {
    fn seal(&self, secret: &Secret) -> Result<Document>;
}

/// Writes the secret as-is; for local testing only.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainSecrets;

impl SecretSealer for PlainSecrets {
    fn seal(&self, secret: &Secret) -> Result<Document> {
        to_document(secret)
    }
}

/// An `Opaque` secret holding one key.
pub fn create_opaque_secret(name: &NamespacedName, key: &str, value: &str) -> Secret {
    Secret {
        metadata: object_meta(name),
        type_: Some(OPAQUE_TYPE.to_string()),
        string_data: Some(BTreeMap::from([(key.to_string(), value.to_string())])),
        ..Secret::default()
    }
}

/// A registry credentials secret from the contents of a Docker `config.json`.
pub fn create_docker_config_secret(name: &NamespacedName, config_json: &str) -> Secret {
    Secret {
        metadata: object_meta(name),
        type_: Some(DOCKER_CONFIG_JSON_TYPE.to_string()),
        string_data: Some(BTreeMap::from([(
            DOCKER_CONFIG_JSON_KEY.to_string(),
            config_json.to_string(),
        )])),
        ..Secret::default()
    }
}
