//! Core domain types for kubeseed.
//!
//! This crate contains:
//! - The manifest model (environments, applications, services)
//! - Repository-rooted path derivation
//! - The manifest walk and its visitor capabilities
//! - File-keyed resource sets and their merge rules
//! - Shared Kubernetes metadata and kustomization documents

pub mod error;
pub mod kustomize;
pub mod manifest;
pub mod meta;
pub mod paths;
pub mod resources;
pub mod walk;

pub use error::{Error, Result};
pub use manifest::{
    Application, ArgoCdConfig, CicdConfig, Config, Environment, EnvironmentRef, Manifest,
    Pipelines, Repository, SecretRef, Service, TemplateBinding, Webhook,
};
pub use resources::{Document, MergePolicy, Resources, merge, merge_with, prefix_paths};
pub use walk::{ApplicationVisitor, EnvironmentVisitor, ServiceVisitor, Visitor};
