//! Document generators for the CI/CD environment.
//!
//! These fill in fixed templates from a name and namespace. Core Kubernetes
//! objects use the k8s-openapi types; custom resources are built as JSON.

pub mod listener;
pub mod rbac;
pub mod secrets;
pub mod tekton;

pub use secrets::{PlainSecrets, SecretSealer};
