//! Error types for kubeseed.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("environment {0} does not exist")]
    EnvironmentNotFound(String),

    #[error("failed to find application {application} in environment {environment}")]
    ApplicationNotFound {
        environment: String,
        application: String,
    },

    #[error("service {service} already exists at {environment}")]
    DuplicateService { service: String, environment: String },

    #[error("application {application} is defined more than once in environment {environment}")]
    DuplicateApplication {
        application: String,
        environment: String,
    },

    #[error("environment {0} is defined more than once")]
    DuplicateEnvironment(String),

    #[error("duplicate resource path: {0}")]
    DuplicateResourcePath(String),

    #[error("failed to read '{}': {source}", path.display())]
    InvalidSourceInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("invalid repository URL {url}: {message}")]
    InvalidRepositoryUrl { url: String, message: String },

    #[error("failed to serialize resource: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
