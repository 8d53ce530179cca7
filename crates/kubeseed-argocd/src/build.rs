//! Argo CD application generation from a manifest.

use kubeseed_core::kustomize::{KUSTOMIZATION, Kustomization};
use kubeseed_core::meta::{NamespacedName, TypeMeta, object_meta};
use kubeseed_core::paths::{path_for_application, path_for_argocd_environment};
use kubeseed_core::resources::{base_name, join_path, to_document};
use kubeseed_core::{ApplicationVisitor, Environment, Manifest, Resources, Result, Visitor};
use tracing::{debug, info};

use crate::application::{
    API_VERSION, Application, ApplicationDestination, ApplicationSource, ApplicationSpec, KIND,
    SyncPolicy,
};

/// Namespace Argo CD runs in when the manifest doesn't name one.
pub const ARGOCD_NAMESPACE: &str = "argocd";

const DEFAULT_SERVER: &str = "https://kubernetes.default.svc";
const DEFAULT_PROJECT: &str = "default";

/// Generate an Argo CD `Application` for every application in every
/// environment of the manifest.
///
/// Applications are written to `config/argocd/config/<env>-<app>-app.yaml`
/// alongside a `kustomization.yaml` listing the directory. Nothing is
/// generated when the manifest has no GitOps URL or no Argo CD config.
pub fn build(manifest: &Manifest) -> Result<Resources> {
    if manifest.gitops_url.is_empty() {
        debug!("No GitOps URL, skipping Argo CD applications");
        return Ok(Resources::new());
    }
    let Some(argocd) = manifest.argocd_config() else {
        debug!("No Argo CD config, skipping Argo CD applications");
        return Ok(Resources::new());
    };

    let namespace = if argocd.namespace.is_empty() {
        ARGOCD_NAMESPACE
    } else {
        argocd.namespace.as_str()
    };
    let mut builder = ApplicationBuilder {
        repo_url: &manifest.gitops_url,
        namespace,
        dir: join_path(&path_for_argocd_environment(), "config"),
        files: Resources::new(),
    };
    manifest.walk(&mut builder)?;

    info!(files = builder.files.len(), "Generated Argo CD applications");
    Ok(builder.files)
}

struct ApplicationBuilder<'a> {
    repo_url: &'a str,
    namespace: &'a str,
    dir: String,
    files: Resources,
}

impl ApplicationBuilder<'_> {
    // Rebuilt after every application from what is already in the directory,
    // so from the second application on the index lists itself too.
    fn refresh_kustomization(&mut self) -> Result<()> {
        let mut names: Vec<String> = self
            .files
            .entries_in(&self.dir)
            .map(|path| base_name(path).to_string())
            .collect();
        names.sort();
        let index = to_document(&Kustomization::with_resources(names))?;
        self.files.upsert(join_path(&self.dir, KUSTOMIZATION), index);
        Ok(())
    }
}

impl ApplicationVisitor for ApplicationBuilder<'_> {
    fn application(
        &mut self,
        env: &Environment,
        app: &kubeseed_core::Application,
    ) -> Result<()> {
        let name = format!("{}-{}", env.name, app.name);
        let path = join_path(&self.dir, &format!("{name}-app.yaml"));
        debug!(env = %env.name, app = %app.name, %path, "Generating Argo CD application");

        let application = make_application(
            &NamespacedName::new(self.namespace, name),
            make_source(env, app, self.repo_url),
            &env.name,
        );
        self.files.insert_resource(path, &application)?;
        self.refresh_kustomization()
    }
}

impl Visitor for ApplicationBuilder<'_> {
    fn as_application_visitor(&mut self) -> Option<&mut dyn ApplicationVisitor> {
        Some(self)
    }
}

fn make_application(
    name: &NamespacedName,
    source: ApplicationSource,
    target_namespace: &str,
) -> Application {
    Application {
        type_meta: TypeMeta::new(API_VERSION, KIND),
        metadata: object_meta(name),
        spec: ApplicationSpec {
            source,
            destination: ApplicationDestination {
                server: DEFAULT_SERVER.to_string(),
                namespace: target_namespace.to_string(),
            },
            project: DEFAULT_PROJECT.to_string(),
            sync_policy: Some(SyncPolicy::automated()),
        },
    }
}

fn make_source(
    env: &Environment,
    app: &kubeseed_core::Application,
    repo_url: &str,
) -> ApplicationSource {
    match &app.config_repo {
        Some(repo) => ApplicationSource {
            repo_url: repo.url.clone(),
            path: repo.path.clone(),
            target_revision: repo.target_revision.clone(),
        },
        None => ApplicationSource {
            repo_url: repo_url.to_string(),
            path: path_for_application(env, app),
            target_revision: String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubeseed_core::{
        ArgoCdConfig, Config, EnvironmentRef, Error, Pipelines, Repository, Service,
    };
    use serde_json::json;

    const TEST_REPO_URL: &str = "https://github.com/rhd-example-gitops/example";

    fn argocd_config() -> Config {
        Config {
            argocd: Some(ArgoCdConfig {
                namespace: "argocd".to_string(),
            }),
            cicd: None,
        }
    }

    fn test_env(name: &str) -> Environment {
        Environment::new(name)
            .with_pipelines(Pipelines::integration("dev-ci-template", ["dev-ci-binding"]))
            .with_service(
                Service::new("service-http")
                    .with_source_url("https://github.com/myproject/myservice.git"),
            )
            .with_service(Service::new("service-redis"))
    }

    fn test_app() -> kubeseed_core::Application {
        kubeseed_core::Application::new("http-api").with_environment(EnvironmentRef::new(
            "test-dev",
            ["service-http", "service-redis"],
        ))
    }

    fn expected_app(env: &str, app: &str, source: ApplicationSource) -> serde_json::Value {
        to_document(&make_application(
            &NamespacedName::new(ARGOCD_NAMESPACE, format!("{env}-{app}")),
            source,
            env,
        ))
        .unwrap()
    }

    #[test]
    fn test_build_creates_argocd() {
        let manifest = Manifest::new(TEST_REPO_URL)
            .with_environment(test_env("test-dev"))
            .with_application(test_app())
            .with_config(argocd_config());

        let files = build(&manifest).unwrap();

        let mut want = Resources::new();
        want.insert(
            "config/argocd/config/test-dev-http-api-app.yaml",
            expected_app(
                "test-dev",
                "http-api",
                ApplicationSource {
                    repo_url: TEST_REPO_URL.to_string(),
                    path: "environments/test-dev/apps/http-api".to_string(),
                    target_revision: String::new(),
                },
            ),
        )
        .unwrap();
        want.insert(
            "config/argocd/config/kustomization.yaml",
            json!({ "resources": ["test-dev-http-api-app.yaml"] }),
        )
        .unwrap();

        assert_eq!(files, want);
    }

    #[test]
    fn test_build_document_shape() {
        let manifest = Manifest::new(TEST_REPO_URL)
            .with_environment(test_env("test-dev"))
            .with_application(test_app())
            .with_config(argocd_config());

        let files = build(&manifest).unwrap();
        let app = files
            .get("config/argocd/config/test-dev-http-api-app.yaml")
            .unwrap();

        assert_eq!(app["apiVersion"], "argoproj.io/v1alpha1");
        assert_eq!(app["kind"], "Application");
        assert_eq!(app["metadata"]["name"], "test-dev-http-api");
        assert_eq!(app["metadata"]["namespace"], "argocd");
        assert_eq!(app["spec"]["destination"]["server"], DEFAULT_SERVER);
        assert_eq!(app["spec"]["destination"]["namespace"], "test-dev");
        assert_eq!(app["spec"]["project"], "default");
        assert_eq!(
            app["spec"]["syncPolicy"],
            json!({ "automated": { "prune": true, "selfHeal": true } })
        );
        assert!(app["spec"]["source"].get("targetRevision").is_none());
    }

    #[test]
    fn test_build_creates_argocd_with_multiple_apps() {
        let manifest = Manifest::new(TEST_REPO_URL)
            .with_environment(test_env("test-production"))
            .with_environment(test_env("test-dev"))
            .with_application(
                kubeseed_core::Application::new("http-api")
                    .with_environment(EnvironmentRef::new(
                        "test-dev",
                        ["service-http", "service-redis"],
                    ))
                    .with_environment(EnvironmentRef::new(
                        "test-production",
                        ["service-http", "service-redis"],
                    )),
            )
            .with_config(argocd_config());

        let files = build(&manifest).unwrap();

        assert_eq!(files.len(), 3);
        assert_eq!(
            files.get("config/argocd/config/kustomization.yaml"),
            Some(&json!({
                "resources": [
                    "kustomization.yaml",
                    "test-dev-http-api-app.yaml",
                    "test-production-http-api-app.yaml"
                ]
            }))
        );
    }

    #[test]
    fn test_build_with_environment_owned_apps() {
        let manifest = Manifest::new(TEST_REPO_URL)
            .with_environment(test_env("test-dev").with_application(
                kubeseed_core::Application::new("http-api")
                    .with_services(["service-http", "service-redis"]),
            ))
            .with_config(argocd_config());

        let files = build(&manifest).unwrap();
        assert_eq!(
            files.list_keys(),
            vec![
                "config/argocd/config/kustomization.yaml",
                "config/argocd/config/test-dev-http-api-app.yaml",
            ]
        );
    }

    #[test]
    fn test_build_with_no_repo_url() {
        let manifest = Manifest::default()
            .with_environment(test_env("test-dev"))
            .with_application(test_app())
            .with_config(argocd_config());

        let files = build(&manifest).unwrap();
        assert_eq!(files, Resources::new());
    }

    #[test]
    fn test_build_with_no_argocd_config() {
        let manifest = Manifest::new(TEST_REPO_URL)
            .with_environment(test_env("test-dev"))
            .with_application(test_app());

        let files = build(&manifest).unwrap();
        assert_eq!(files, Resources::new());
    }

    #[test]
    fn test_build_with_no_applications() {
        let manifest = Manifest::new(TEST_REPO_URL)
            .with_environment(test_env("test-dev"))
            .with_config(argocd_config());

        let files = build(&manifest).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_build_with_repo_config() {
        let config_repo = Repository::new(
            "https://github.com/rhd-example-gitops/other-repo",
            "deploys",
            "master",
        );
        let manifest = Manifest::new(TEST_REPO_URL)
            .with_environment(test_env("test-production"))
            .with_application(
                kubeseed_core::Application::new("prod-api")
                    .with_environment(EnvironmentRef::new(
                        "test-production",
                        Vec::<String>::new(),
                    ))
                    .with_config_repo(config_repo),
            )
            .with_config(argocd_config());

        let files = build(&manifest).unwrap();

        let mut want = Resources::new();
        want.insert(
            "config/argocd/config/test-production-prod-api-app.yaml",
            expected_app(
                "test-production",
                "prod-api",
                ApplicationSource {
                    repo_url: "https://github.com/rhd-example-gitops/other-repo".to_string(),
                    path: "deploys".to_string(),
                    target_revision: "master".to_string(),
                },
            ),
        )
        .unwrap();
        want.insert(
            "config/argocd/config/kustomization.yaml",
            json!({ "resources": ["test-production-prod-api-app.yaml"] }),
        )
        .unwrap();

        assert_eq!(files, want);
    }

    #[test]
    fn test_build_uses_configured_namespace() {
        let manifest = Manifest::new(TEST_REPO_URL)
            .with_environment(test_env("test-dev"))
            .with_application(test_app())
            .with_config(Config {
                argocd: Some(ArgoCdConfig {
                    namespace: "gitops-tools".to_string(),
                }),
                cicd: None,
            });

        let files = build(&manifest).unwrap();
        let app = files
            .get("config/argocd/config/test-dev-http-api-app.yaml")
            .unwrap();
        assert_eq!(app["metadata"]["namespace"], "gitops-tools");
    }

    #[test]
    fn test_build_rejects_colliding_application_names() {
        // "a-b" + "c" and "a" + "b-c" both name "a-b-c".
        let manifest = Manifest::new(TEST_REPO_URL)
            .with_environment(
                Environment::new("a-b").with_application(kubeseed_core::Application::new("c")),
            )
            .with_environment(
                Environment::new("a").with_application(kubeseed_core::Application::new("b-c")),
            )
            .with_config(argocd_config());

        let err = build(&manifest).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateResourcePath(path) if path == "config/argocd/config/a-b-c-app.yaml"
        ));
    }
}
