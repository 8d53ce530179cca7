//! Registry credentials from a local Docker config file.

use std::io;
use std::path::{Path, PathBuf};

use kubeseed_core::meta::NamespacedName;
use kubeseed_core::resources::Document;
use kubeseed_core::{Error, Result};
use tracing::debug;

use crate::generators::SecretSealer;
use crate::generators::secrets::create_docker_config_secret;

pub const DOCKER_SECRET_NAME: &str = "regcred";

/// Expand a leading `~` to the current user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    let Some(rest) = path.strip_prefix('~') else {
        return Ok(PathBuf::from(path));
    };
    if !rest.is_empty() && !rest.starts_with('/') {
        return Err(invalid_input(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "cannot expand user-specific home dir"),
        ));
    }
    let home = dirs::home_dir().ok_or_else(|| {
        invalid_input(
            path,
            io::Error::new(io::ErrorKind::NotFound, "cannot determine home directory"),
        )
    })?;
    Ok(home.join(rest.trim_start_matches('/')))
}

/// Read a Docker `config.json` and seal it as the `regcred` secret in
/// `namespace`.
pub fn create_docker_secret(
    config_json_path: &str,
    namespace: &str,
    sealer: &dyn SecretSealer,
) -> Result<Document> {
    if config_json_path.is_empty() {
        return Err(invalid_input(
            config_json_path,
            io::Error::new(io::ErrorKind::InvalidInput, "no docker config file provided"),
        ));
    }

    let path = expand_home(config_json_path)?;
    debug!(path = %path.display(), "Reading docker config");
    let contents = std::fs::read_to_string(&path).map_err(|source| invalid_input(&path, source))?;

    let secret = create_docker_config_secret(
        &NamespacedName::new(namespace, DOCKER_SECRET_NAME),
        &contents,
    );
    sealer.seal(&secret)
}

fn invalid_input(path: impl AsRef<Path>, source: io::Error) -> Error {
    Error::InvalidSourceInput {
        path: path.as_ref().to_path_buf(),
        source,
    }
}
