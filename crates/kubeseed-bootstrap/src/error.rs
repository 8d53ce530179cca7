//! Bootstrap errors.

use std::path::PathBuf;

use kubeseed_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Core(#[from] kubeseed_core::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("output already initialised: {} exists", .0.display())]
    OutputExists(PathBuf),

    #[error("failed to serialize {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type BootstrapResult<T> = std::result::Result<T, BootstrapError>;
