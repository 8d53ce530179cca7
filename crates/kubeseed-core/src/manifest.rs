//! The manifest model.
//!
//! A [`Manifest`] describes a set of environments, apps and services for
//! deployment. Environments own their services and applications; applications
//! declared at the manifest level refer to environments by name and are
//! resolved when the manifest is walked.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

// RFC 1123 label, environment names double as namespaces.
static NAMESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap());

const MAX_NAMESPACE_LEN: usize = 63;

/// Root of the deployment topology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Repository the generated configuration is committed to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gitops_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environments: Vec<Environment>,
    /// Applications deployed across several environments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apps: Vec<Application>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Config>,
}

/// Settings for the reserved tooling environments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argocd: Option<ArgoCdConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cicd: Option<CicdConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgoCdConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CicdConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

/// A named deployment target.
///
/// The CI/CD environment receives the generated pipeline resources and must
/// not define any applications; the same holds for the Argo CD environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipelines: Option<Pipelines>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apps: Vec<Application>,
    #[serde(rename = "cicd", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_cicd: bool,
    #[serde(rename = "argo", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_argocd: bool,
}

/// A named set of services.
///
/// An application with a `config_repo` takes its configuration from another
/// repository and has no services of its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_repo: Option<Repository>,
    /// Target environments, only used for manifest-level applications.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environments: Vec<EnvironmentRef>,
}

/// A manifest-level application's deployment into one environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentRef {
    #[serde(rename = "ref")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<String>,
}

/// A unit of deployable source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<Webhook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipelines: Option<Pipelines>,
}

/// Webhook secret used by the event listeners.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretRef>,
}

/// A Kubernetes secret in a namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

/// An upstream source of additional configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub url: String,
    /// Commit, tag or branch to sync to; empty means HEAD.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_revision: String,
    /// Directory within the repository.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

/// Pipelines executed for CI, with a Git clone URL and commit SHA.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipelines {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration: Option<TemplateBinding>,
}

/// The trigger template and bindings used for a pipeline execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateBinding {
    pub template: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<String>,
}

impl Manifest {
    pub fn new(gitops_url: impl Into<String>) -> Self {
        Self {
            gitops_url: gitops_url.into(),
            ..Self::default()
        }
    }

    pub fn with_environment(mut self, env: Environment) -> Self {
        self.environments.push(env);
        self
    }

    pub fn with_application(mut self, app: Application) -> Self {
        self.apps.push(app);
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Find an environment by name.
    pub fn environment(&self, name: &str) -> Option<&Environment> {
        self.environments.iter().find(|env| env.name == name)
    }

    /// Find an application deployed to `environment`.
    ///
    /// Applications owned by the environment take precedence over
    /// manifest-level applications that reference it.
    pub fn application(&self, environment: &str, application: &str) -> Result<&Application> {
        let owned = self
            .environment(environment)
            .and_then(|env| env.application(application));
        owned
            .or_else(|| {
                self.apps.iter().find(|app| {
                    app.name == application
                        && app.environments.iter().any(|r| r.name == environment)
                })
            })
            .ok_or_else(|| Error::ApplicationNotFound {
                environment: environment.to_string(),
                application: application.to_string(),
            })
    }

    /// Add a service to an environment and reference it from an application.
    ///
    /// The application is created in the environment when it does not exist
    /// yet, otherwise the existing one gains the reference. Reserved
    /// environments and applications with a config repository are rejected,
    /// and the manifest is left unchanged on any error.
    pub fn add_service(
        &mut self,
        environment: &str,
        application: &str,
        service: Service,
    ) -> Result<()> {
        let index = self
            .environments
            .iter()
            .position(|env| env.name == environment)
            .ok_or_else(|| Error::EnvironmentNotFound(environment.to_string()))?;

        let env = &self.environments[index];
        if env.is_special() {
            return Err(Error::InvalidManifest(format!(
                "reserved environment {environment} cannot hold services"
            )));
        }
        if env.service(&service.name).is_some() {
            return Err(Error::DuplicateService {
                service: service.name,
                environment: env.name.clone(),
            });
        }
        if self
            .application(environment, application)
            .is_ok_and(|app| app.config_repo.is_some())
        {
            return Err(Error::InvalidManifest(format!(
                "application {application} has a config repository and cannot reference services"
            )));
        }

        let env = &mut self.environments[index];
        let service_name = service.name.clone();
        if let Some(app) = env.apps.iter_mut().find(|app| app.name == application) {
            app.services.push(service_name);
        } else if let Some(reference) = self
            .apps
            .iter_mut()
            .filter(|app| app.name == application)
            .flat_map(|app| app.environments.iter_mut())
            .find(|r| r.name == environment)
        {
            reference.services.push(service_name);
        } else {
            debug!(env = %environment, app = %application, "Creating application");
            env.apps
                .push(Application::new(application).with_services([service_name]));
        }
        env.services.push(service);
        Ok(())
    }

    /// The CI/CD configuration block, if any.
    pub fn cicd_config(&self) -> Option<&CicdConfig> {
        self.config.as_ref().and_then(|c| c.cicd.as_ref())
    }

    /// The Argo CD configuration block, if any.
    pub fn argocd_config(&self) -> Option<&ArgoCdConfig> {
        self.config.as_ref().and_then(|c| c.argocd.as_ref())
    }

    /// The environment flagged as the CI/CD environment, if any.
    pub fn cicd_environment(&self) -> Option<&Environment> {
        self.environments.iter().find(|env| env.is_cicd)
    }

    /// Check the structural invariants of the manifest.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for env in &self.environments {
            if !names.insert(env.name.as_str()) {
                return Err(Error::DuplicateEnvironment(env.name.clone()));
            }
            env.validate()?;
        }

        let cicd_count = self.environments.iter().filter(|env| env.is_cicd).count();
        if cicd_count > 1 {
            return Err(Error::InvalidManifest(format!(
                "found {cicd_count} CI/CD environments, at most one is allowed"
            )));
        }

        // Owned and manifest-level applications share one name space per
        // environment.
        let mut deployed: HashSet<(&str, &str)> = self
            .environments
            .iter()
            .flat_map(|env| env.apps.iter().map(move |app| (env.name.as_str(), app.name.as_str())))
            .collect();

        for app in &self.apps {
            validate_application(app)?;
            for reference in &app.environments {
                let env = self
                    .environment(&reference.name)
                    .ok_or_else(|| Error::EnvironmentNotFound(reference.name.clone()))?;
                if !deployed.insert((env.name.as_str(), app.name.as_str())) {
                    return Err(Error::DuplicateApplication {
                        application: app.name.clone(),
                        environment: env.name.clone(),
                    });
                }
                if env.is_special() {
                    return Err(Error::InvalidManifest(format!(
                        "application {} targets reserved environment {}",
                        app.name, env.name
                    )));
                }
                if app.config_repo.is_some() && !reference.services.is_empty() {
                    return Err(Error::InvalidManifest(format!(
                        "application {} has a config repository and services in {}",
                        app.name, env.name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The reserved CI/CD environment.
    pub fn cicd(name: impl Into<String>) -> Self {
        Self {
            is_cicd: true,
            ..Self::new(name)
        }
    }

    pub fn with_service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    pub fn with_application(mut self, app: Application) -> Self {
        self.apps.push(app);
        self
    }

    pub fn with_pipelines(mut self, pipelines: Pipelines) -> Self {
        self.pipelines = Some(pipelines);
        self
    }

    /// Returns true for environments reserved for generated tooling files.
    pub fn is_special(&self) -> bool {
        self.is_cicd || self.is_argocd
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|svc| svc.name == name)
    }

    pub fn application(&self, name: &str) -> Option<&Application> {
        self.apps.iter().find(|app| app.name == name)
    }

    fn validate(&self) -> Result<()> {
        validate_namespace(&self.name)?;
        if self.is_special() && !self.apps.is_empty() {
            return Err(Error::InvalidManifest(format!(
                "reserved environment {} cannot hold applications",
                self.name
            )));
        }

        let mut services = HashSet::new();
        for svc in &self.services {
            if !services.insert(svc.name.as_str()) {
                return Err(Error::DuplicateService {
                    service: svc.name.clone(),
                    environment: self.name.clone(),
                });
            }
        }
        let mut apps = HashSet::new();
        for app in &self.apps {
            if !apps.insert(app.name.as_str()) {
                return Err(Error::DuplicateApplication {
                    application: app.name.clone(),
                    environment: self.name.clone(),
                });
            }
        }
        self.apps.iter().try_for_each(validate_application)
    }
}

/// Check that `name` is usable as a Kubernetes namespace (an RFC 1123 label).
pub fn validate_namespace(name: &str) -> Result<()> {
    if name.len() > MAX_NAMESPACE_LEN || !NAMESPACE_REGEX.is_match(name) {
        return Err(Error::InvalidManifest(format!(
            "environment name '{name}' is not a valid namespace"
        )));
    }
    Ok(())
}

fn validate_application(app: &Application) -> Result<()> {
    if app.config_repo.is_some() && !app.services.is_empty() {
        return Err(Error::InvalidManifest(format!(
            "application {} has a config repository and services",
            app.name
        )));
    }
    Ok(())
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services.extend(services.into_iter().map(Into::into));
        self
    }

    pub fn with_config_repo(mut self, repo: Repository) -> Self {
        self.config_repo = Some(repo);
        self
    }

    pub fn with_environment(mut self, reference: EnvironmentRef) -> Self {
        self.environments.push(reference);
        self
    }
}

impl EnvironmentRef {
    pub fn new<I, S>(name: impl Into<String>, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            services: services.into_iter().map(Into::into).collect(),
        }
    }
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_webhook_secret(
        mut self,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        self.webhook = Some(Webhook {
            secret: Some(SecretRef {
                name: name.into(),
                namespace: namespace.into(),
            }),
        });
        self
    }
}

impl Repository {
    pub fn new(
        url: impl Into<String>,
        path: impl Into<String>,
        target_revision: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
            target_revision: target_revision.into(),
        }
    }
}

impl Pipelines {
    pub fn integration<I, S>(template: impl Into<String>, bindings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            integration: Some(TemplateBinding {
                template: template.into(),
                bindings: bindings.into_iter().map(Into::into).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_manifest() -> Manifest {
        Manifest::new("https://github.com/example/gitops.git").with_environment(
            Environment::new("test-dev")
                .with_service(Service::new("service-http"))
                .with_application(Application::new("http-api").with_services(["service-http"])),
        )
    }

    #[test]
    fn test_environment_lookup() {
        let manifest = test_manifest();
        assert!(manifest.environment("test-dev").is_some());
        assert!(manifest.environment("Test-Dev").is_none());
    }

    #[test]
    fn test_application_lookup() {
        let manifest = test_manifest();
        let app = manifest.application("test-dev", "http-api").unwrap();
        assert_eq!(app.services, vec!["service-http"]);

        let err = manifest.application("test-dev", "missing").unwrap_err();
        assert!(matches!(err, Error::ApplicationNotFound { .. }));
    }

    #[test]
    fn test_application_lookup_finds_manifest_level_app() {
        let manifest = test_manifest().with_application(
            Application::new("prod-api").with_environment(EnvironmentRef::new("test-dev", ["a"])),
        );
        let app = manifest.application("test-dev", "prod-api").unwrap();
        assert_eq!(app.name, "prod-api");
        assert!(manifest.application("test-stage", "prod-api").is_err());
    }

    #[test]
    fn test_add_service_to_existing_application() {
        let mut manifest = test_manifest();
        manifest
            .add_service("test-dev", "http-api", Service::new("service-redis"))
            .unwrap();

        let env = manifest.environment("test-dev").unwrap();
        assert_eq!(env.services.len(), 2);
        assert_eq!(env.apps.len(), 1);
        assert_eq!(env.apps[0].services, vec!["service-http", "service-redis"]);
    }

    #[test]
    fn test_add_service_creates_application() {
        let mut manifest = test_manifest();
        manifest
            .add_service("test-dev", "worker", Service::new("service-queue"))
            .unwrap();

        let app = manifest.application("test-dev", "worker").unwrap();
        assert_eq!(app.services, vec!["service-queue"]);
        assert_eq!(manifest.environment("test-dev").unwrap().apps.len(), 2);
    }

    #[test]
    fn test_add_service_to_manifest_level_application() {
        let mut manifest = test_manifest().with_application(
            Application::new("prod-api")
                .with_environment(EnvironmentRef::new("test-dev", Vec::<String>::new())),
        );
        manifest
            .add_service("test-dev", "prod-api", Service::new("service-api"))
            .unwrap();

        assert_eq!(manifest.apps[0].environments[0].services, vec!["service-api"]);
        assert_eq!(manifest.environment("test-dev").unwrap().apps.len(), 1);
    }

    #[test]
    fn test_add_service_missing_environment() {
        let mut manifest = test_manifest();
        let err = manifest
            .add_service("test-prod", "http-api", Service::new("service-redis"))
            .unwrap_err();
        assert!(matches!(err, Error::EnvironmentNotFound(name) if name == "test-prod"));
    }

    #[test]
    fn test_add_service_duplicate() {
        let mut manifest = test_manifest();
        let err = manifest
            .add_service("test-dev", "other-app", Service::new("service-http"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateService { .. }));
        // Nothing was created on failure.
        assert!(manifest.application("test-dev", "other-app").is_err());
    }

    #[test]
    fn test_add_service_rejects_reserved_environment() {
        let mut manifest = test_manifest().with_environment(Environment::cicd("cicd"));
        let err = manifest
            .add_service("cicd", "tools", Service::new("service-tools"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidManifest(_)));

        let env = manifest.environment("cicd").unwrap();
        assert!(env.services.is_empty());
        assert!(env.apps.is_empty());
    }

    #[test]
    fn test_add_service_rejects_config_repo_application() {
        let mut manifest = Manifest::default().with_environment(
            Environment::new("prod").with_application(
                Application::new("api")
                    .with_config_repo(Repository::new("https://example.com/r", "deploy", "")),
            ),
        );
        let err = manifest
            .add_service("prod", "api", Service::new("svc"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidManifest(_)));
        assert!(manifest.environment("prod").unwrap().services.is_empty());
        manifest.validate().unwrap();
    }

    #[test]
    fn test_special_config_lookup() {
        let manifest = test_manifest();
        assert!(manifest.cicd_config().is_none());
        assert!(manifest.argocd_config().is_none());

        let manifest = manifest.with_config(Config {
            argocd: Some(ArgoCdConfig {
                namespace: "argocd".to_string(),
            }),
            cicd: None,
        });
        assert_eq!(manifest.argocd_config().unwrap().namespace, "argocd");
        assert!(manifest.cicd_config().is_none());
    }

    #[test]
    fn test_validate_accepts_valid_manifest() {
        let manifest = test_manifest().with_environment(Environment::cicd("cicd"));
        manifest.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_duplicate_environment() {
        let manifest = test_manifest().with_environment(Environment::new("test-dev"));
        assert!(matches!(
            manifest.validate().unwrap_err(),
            Error::DuplicateEnvironment(_)
        ));
    }

    #[test]
    fn test_validate_rejects_apps_in_reserved_environment() {
        let manifest = test_manifest()
            .with_environment(Environment::cicd("cicd").with_application(Application::new("app")));
        assert!(matches!(
            manifest.validate().unwrap_err(),
            Error::InvalidManifest(_)
        ));
    }

    #[test]
    fn test_validate_rejects_config_repo_with_services() {
        let manifest = Manifest::default().with_environment(
            Environment::new("prod").with_application(
                Application::new("api")
                    .with_services(["svc"])
                    .with_config_repo(Repository::new("https://example.com/r", "deploy", "")),
            ),
        );
        assert!(matches!(
            manifest.validate().unwrap_err(),
            Error::InvalidManifest(_)
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_environment_ref() {
        let manifest = test_manifest().with_application(
            Application::new("api").with_environment(EnvironmentRef::new("nowhere", ["svc"])),
        );
        assert!(matches!(
            manifest.validate().unwrap_err(),
            Error::EnvironmentNotFound(name) if name == "nowhere"
        ));
    }

    #[test]
    fn test_validate_rejects_invalid_namespace() {
        let manifest = Manifest::default().with_environment(Environment::new("Test_Dev"));
        assert!(matches!(
            manifest.validate().unwrap_err(),
            Error::InvalidManifest(_)
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_application_in_environment() {
        let manifest = Manifest::default().with_environment(
            Environment::new("dev")
                .with_application(Application::new("api"))
                .with_application(Application::new("api")),
        );
        assert!(matches!(
            manifest.validate().unwrap_err(),
            Error::DuplicateApplication { application, environment }
                if application == "api" && environment == "dev"
        ));
    }

    #[test]
    fn test_validate_rejects_owned_and_manifest_level_application_clash() {
        let manifest = Manifest::default()
            .with_environment(Environment::new("dev").with_application(Application::new("api")))
            .with_application(
                Application::new("api").with_environment(EnvironmentRef::new("dev", ["svc"])),
            );
        assert!(matches!(
            manifest.validate().unwrap_err(),
            Error::DuplicateApplication { application, environment }
                if application == "api" && environment == "dev"
        ));
    }

    #[test]
    fn test_validate_namespace() {
        validate_namespace("tst-cicd").unwrap();
        assert!(validate_namespace("Tst_cicd").is_err());
        assert!(validate_namespace("-cicd").is_err());
        assert!(validate_namespace(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_validate_rejects_multiple_cicd_environments() {
        let manifest = Manifest::default()
            .with_environment(Environment::cicd("cicd-a"))
            .with_environment(Environment::cicd("cicd-b"));
        assert!(matches!(
            manifest.validate().unwrap_err(),
            Error::InvalidManifest(_)
        ));
    }
}
