//! Repository-rooted paths for generated files.
//!
//! Every generator places its output relative to one of these roots, so a
//! naming change here moves all of them together.

use crate::manifest::{Application, CicdConfig, Environment};
use crate::resources::join_path;

pub const ENVIRONMENTS_DIR: &str = "environments";
pub const CONFIG_DIR: &str = "config";
pub const ARGOCD_DIR: &str = "argocd";

/// `environments/<env>/services/<service>`
pub fn path_for_service(env: &Environment, service: &str) -> String {
    join_path(&path_for_environment(env), &join_path("services", service))
}

/// `environments/<env>/apps/<app>`
pub fn path_for_application(env: &Environment, app: &Application) -> String {
    join_path(&path_for_environment(env), &join_path("apps", &app.name))
}

/// `environments/<env>`
pub fn path_for_environment(env: &Environment) -> String {
    join_path(ENVIRONMENTS_DIR, &env.name)
}

/// `config/<cicd-namespace>`
pub fn path_for_cicd_environment(cicd: &CicdConfig) -> String {
    join_path(CONFIG_DIR, &cicd.namespace)
}

/// `config/argocd`
pub fn path_for_argocd_environment() -> String {
    join_path(CONFIG_DIR, ARGOCD_DIR)
}
