//! Composition of the initial CI/CD file set.
//!
//! Generated documents land under `config/<cicd>/base/pipelines`, with a
//! kustomization listing them, a `base` kustomization pointing at
//! `./pipelines` and an `overlays` kustomization pointing at `../base`.

use kubeseed_config::BootstrapOptions;
use kubeseed_core::kustomize::{KUSTOMIZATION, Kustomization};
use kubeseed_core::meta::NamespacedName;
use kubeseed_core::paths::path_for_cicd_environment;
use kubeseed_core::resources::join_path;
use kubeseed_core::{
    CicdConfig, Config, Environment, Error, Manifest, Resources, Result, merge, prefix_paths,
};
use tracing::{debug, info};
use url::Url;

use crate::docker::{DOCKER_SECRET_NAME, create_docker_secret};
use crate::generators::listener::{
    GITOPS_WEBHOOK_SECRET, WEBHOOK_SECRET_KEY, create_event_listener, create_route,
};
use crate::generators::rbac::{
    CLUSTER_ROLE_NAME, add_secret_to_service_account, create_cluster_role,
    create_cluster_role_binding, create_namespace, create_service_account,
};
use crate::generators::secrets::create_opaque_secret;
use crate::generators::tekton::{
    APP_CI_PIPELINE, CD_DEPLOY_PIPELINE, CI_DRYRUN_PIPELINE, create_app_ci_build_pr_template,
    create_app_ci_pipeline, create_cd_pipeline, create_cd_push_template, create_ci_dryrun_template,
    create_ci_pipeline, create_deploy_from_source_task, create_deploy_using_kubectl_task,
    create_pr_binding, create_push_binding,
};
use crate::generators::SecretSealer;
use crate::policy::BootstrapPolicy;

/// The manifest written at the repository root.
pub const PIPELINES_FILE: &str = "pipelines.yaml";

const BASE_DIR: &str = "base";
const PIPELINES_DIR: &str = "pipelines";
const OVERLAYS_DIR: &str = "overlays";

pub const NAMESPACES_PATH: &str = "01-namespaces/cicd-environment.yaml";
pub const ROLES_PATH: &str = "02-rolebindings/pipeline-service-role.yaml";
pub const ROLE_BINDINGS_PATH: &str = "02-rolebindings/pipeline-service-rolebinding.yaml";
pub const SERVICE_ACCOUNT_PATH: &str = "02-rolebindings/pipeline-service-account.yaml";
pub const SECRETS_PATH: &str = "03-secrets/gitops-webhook-secret.yaml";
pub const DOCKER_CONFIG_PATH: &str = "03-secrets/docker-config.yaml";
pub const GITOPS_TASKS_PATH: &str = "04-tasks/deploy-from-source-task.yaml";
pub const APP_TASK_PATH: &str = "04-tasks/deploy-using-kubectl-task.yaml";
pub const CI_PIPELINES_PATH: &str = "05-pipelines/ci-dryrun-from-pr-pipeline.yaml";
pub const CD_PIPELINES_PATH: &str = "05-pipelines/cd-deploy-from-push-pipeline.yaml";
pub const APP_CI_PIPELINES_PATH: &str = "05-pipelines/app-ci-pipeline.yaml";
pub const PR_BINDING_PATH: &str = "06-bindings/github-pr-binding.yaml";
pub const PUSH_BINDING_PATH: &str = "06-bindings/github-push-binding.yaml";
pub const PR_TEMPLATE_PATH: &str = "07-templates/ci-dryrun-from-pr-template.yaml";
pub const PUSH_TEMPLATE_PATH: &str = "07-templates/cd-deploy-from-push-template.yaml";
pub const APP_CI_BUILD_PR_TEMPLATE_PATH: &str = "07-templates/app-ci-build-pr-template.yaml";
pub const EVENT_LISTENER_PATH: &str = "08-eventlisteners/cicd-event-listener.yaml";
pub const ROUTE_PATH: &str = "09-routes/gitops-webhook-event-listener.yaml";

const SERVICE_ACCOUNT_NAME: &str = "pipeline";
const ROLE_BINDING_NAME: &str = "pipelines-service-role-binding";

/// Build every file of a new GitOps repository's CI/CD environment.
///
/// Fails as a whole: no partial set is returned.
pub fn create_initial_files(
    opts: &BootstrapOptions,
    policy: &BootstrapPolicy,
    sealer: &dyn SecretSealer,
) -> Result<Resources> {
    let cicd = CicdConfig {
        namespace: opts.cicd_namespace(),
    };
    let manifest = bootstrap_manifest(&opts.gitops_repo_url, &cicd);
    let org_repo = org_repo_from_url(&opts.gitops_repo_url)?;
    info!(namespace = %cicd.namespace, repo = %org_repo, "Creating CI/CD resources");

    let resources = create_cicd_resources(&cicd, &org_repo, opts, policy, sealer)?;
    let files = resources.list_keys();

    let cicd_path = path_for_cicd_environment(&cicd);
    let pipelines_path = join_path(&cicd_path, &join_path(BASE_DIR, PIPELINES_DIR));

    let mut initial = Resources::new();
    initial.insert_resource(PIPELINES_FILE, &manifest)?;

    merge([
        initial,
        prefix_paths(&pipelines_path, &resources)?,
        prefix_paths(&cicd_path, &cicd_kustomizations(files)?)?,
    ])
}

/// A manifest holding only the reserved CI/CD environment.
pub fn bootstrap_manifest(gitops_url: &str, cicd: &CicdConfig) -> Manifest {
    Manifest::new(gitops_url)
        .with_environment(Environment::cicd(cicd.namespace.clone()))
        .with_config(Config {
            argocd: None,
            cicd: Some(cicd.clone()),
        })
}

/// Documents for the CI/CD environment, keyed relative to its pipelines
/// directory.
pub fn create_cicd_resources(
    cicd: &CicdConfig,
    org_repo: &str,
    opts: &BootstrapOptions,
    policy: &BootstrapPolicy,
    sealer: &dyn SecretSealer,
) -> Result<Resources> {
    let ns = cicd.namespace.as_str();
    let mut outputs = Resources::new();

    let webhook_secret = create_opaque_secret(
        &NamespacedName::new(ns, GITOPS_WEBHOOK_SECRET),
        WEBHOOK_SECRET_KEY,
        &opts.gitops_webhook_secret,
    );
    outputs.insert(SECRETS_PATH, sealer.seal(&webhook_secret)?)?;
    outputs.insert_resource(NAMESPACES_PATH, &create_namespace(ns))?;
    outputs.insert_resource(
        ROLES_PATH,
        &create_cluster_role(&NamespacedName::cluster(CLUSTER_ROLE_NAME), policy.policy_rules()),
    )?;

    let mut sa = create_service_account(&NamespacedName::new(ns, SERVICE_ACCOUNT_NAME));
    if let Some(docker_config) = opts.docker_config_json.as_deref().filter(|p| !p.is_empty()) {
        debug!(path = %docker_config, "Adding docker config secret");
        outputs.insert(DOCKER_CONFIG_PATH, create_docker_secret(docker_config, ns, sealer)?)?;
        sa = add_secret_to_service_account(sa, DOCKER_SECRET_NAME);
    }
    outputs.insert_resource(
        ROLE_BINDINGS_PATH,
        &create_cluster_role_binding(
            &NamespacedName::cluster(ROLE_BINDING_NAME),
            &sa,
            "ClusterRole",
            CLUSTER_ROLE_NAME,
        ),
    )?;
    outputs.insert_resource(SERVICE_ACCOUNT_PATH, &sa)?;

    let base_path = join_path(&path_for_cicd_environment(cicd), BASE_DIR);
    outputs.insert(GITOPS_TASKS_PATH, create_deploy_from_source_task(ns, &base_path))?;
    outputs.insert(APP_TASK_PATH, create_deploy_using_kubectl_task(ns))?;
    outputs.insert(
        CI_PIPELINES_PATH,
        create_ci_pipeline(&NamespacedName::new(ns, CI_DRYRUN_PIPELINE), ns),
    )?;
    outputs.insert(
        CD_PIPELINES_PATH,
        create_cd_pipeline(&NamespacedName::new(ns, CD_DEPLOY_PIPELINE), ns),
    )?;
    outputs.insert(
        APP_CI_PIPELINES_PATH,
        create_app_ci_pipeline(&NamespacedName::new(ns, APP_CI_PIPELINE)),
    )?;
    outputs.insert(PR_BINDING_PATH, create_pr_binding(ns))?;
    outputs.insert(PUSH_BINDING_PATH, create_push_binding(ns))?;
    outputs.insert(PR_TEMPLATE_PATH, create_ci_dryrun_template(ns, SERVICE_ACCOUNT_NAME))?;
    outputs.insert(PUSH_TEMPLATE_PATH, create_cd_push_template(ns, SERVICE_ACCOUNT_NAME))?;
    outputs.insert(
        APP_CI_BUILD_PR_TEMPLATE_PATH,
        create_app_ci_build_pr_template(ns, SERVICE_ACCOUNT_NAME),
    )?;
    outputs.insert(
        EVENT_LISTENER_PATH,
        create_event_listener(org_repo, ns, SERVICE_ACCOUNT_NAME, GITOPS_WEBHOOK_SECRET),
    )?;
    outputs.insert(ROUTE_PATH, create_route(ns))?;

    Ok(outputs)
}

/// The kustomizations tying the CI/CD environment together, relative to
/// `config/<cicd>`.
pub fn cicd_kustomizations(files: Vec<String>) -> Result<Resources> {
    let base = join_path(BASE_DIR, KUSTOMIZATION);
    let overlays = join_path(OVERLAYS_DIR, KUSTOMIZATION);
    let pipelines = join_path(&join_path(BASE_DIR, PIPELINES_DIR), KUSTOMIZATION);

    let mut resources = Resources::new();
    resources.insert_resource(base, &Kustomization::with_bases([format!("./{PIPELINES_DIR}")]))?;
    resources.insert_resource(overlays, &Kustomization::with_bases([format!("../{BASE_DIR}")]))?;
    resources.insert_resource(pipelines, &Kustomization::with_resources(files))?;
    Ok(resources)
}

/// `org/repo` from a repository URL such as `https://github.com/org/repo.git`.
pub fn org_repo_from_url(raw: &str) -> Result<String> {
    let invalid = |message: &str| Error::InvalidRepositoryUrl {
        url: raw.to_string(),
        message: message.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    let path = url.path().trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let parts: Vec<&str> = path.split('/').collect();
    match parts.as_slice() {
        [org, repo] if !org.is_empty() && !repo.is_empty() => Ok(format!("{org}/{repo}")),
        _ => Err(invalid("expected a path of the form <org>/<repo>")),
    }
}
