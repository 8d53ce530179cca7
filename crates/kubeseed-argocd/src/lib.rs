//! Argo CD application synthesis for kubeseed.
//!
//! Produces one Argo CD `Application` per environment and application in a
//! manifest, plus the kustomization that lists them.

pub mod application;
pub mod build;

pub use application::{
    Application, ApplicationDestination, ApplicationSource, ApplicationSpec, AutomatedSyncPolicy,
    SyncPolicy,
};
pub use build::{ARGOCD_NAMESPACE, build};
