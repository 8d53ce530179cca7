//! Tekton tasks, pipelines and triggers for the CI/CD environment.
//!
//! The CI side dry-runs a GitOps pull request against the cluster; the CD
//! side applies the GitOps repository on push to `master`. The app CI
//! pipeline builds a service image from a pull request.

use kubeseed_core::meta::NamespacedName;
use kubeseed_core::resources::Document;
use serde_json::json;

const PIPELINE_API_VERSION: &str = "tekton.dev/v1beta1";
const TRIGGERS_API_VERSION: &str = "triggers.tekton.dev/v1alpha1";

const KUBECTL_IMAGE: &str = "quay.io/redhat-developer/k8s-kubectl";
const BUILDAH_IMAGE: &str = "quay.io/buildah/stable";

pub const DEPLOY_FROM_SOURCE_TASK: &str = "deploy-from-source-task";
pub const DEPLOY_USING_KUBECTL_TASK: &str = "deploy-using-kubectl-task";

pub const PR_BINDING: &str = "github-pr-binding";
pub const PUSH_BINDING: &str = "github-push-binding";
pub const CI_DRYRUN_TEMPLATE: &str = "ci-dryrun-from-pr-template";
pub const CD_PUSH_TEMPLATE: &str = "cd-deploy-from-push-template";
pub const APP_CI_BUILD_PR_TEMPLATE: &str = "app-ci-build-pr-template";

pub const CI_DRYRUN_PIPELINE: &str = "ci-dryrun-from-pr-pipeline";
pub const CD_DEPLOY_PIPELINE: &str = "cd-deploy-from-push-pipeline";
pub const APP_CI_PIPELINE: &str = "app-ci-pipeline";

fn metadata(name: &NamespacedName) -> Document {
    if name.namespace.is_empty() {
        json!({ "name": name.name })
    } else {
        json!({ "name": name.name, "namespace": name.namespace })
    }
}

/// Applies the kustomization at `path` from a checkout of the GitOps repo.
pub fn create_deploy_from_source_task(namespace: &str, path: &str) -> Document {
    json!({
        "apiVersion": PIPELINE_API_VERSION,
        "kind": "Task",
        "metadata": metadata(&NamespacedName::new(namespace, DEPLOY_FROM_SOURCE_TASK)),
        "spec": {
            "resources": { "inputs": [{ "name": "source", "type": "git" }] },
            "params": [
                {
                    "name": "PATHTODEPLOY",
                    "type": "string",
                    "description": "Path to the manifest to apply",
                    "default": path
                },
                {
                    "name": "NAMESPACE",
                    "type": "string",
                    "description": "Namespace to deploy into",
                    "default": ""
                },
                {
                    "name": "DRYRUN",
                    "type": "string",
                    "description": "If true run a server-side dryrun.",
                    "default": "false"
                }
            ],
            "steps": [{
                "name": "run-kubectl",
                "image": KUBECTL_IMAGE,
                "workingDir": "/workspace/source",
                "command": ["kubectl"],
                "args": [
                    "apply",
                    "--dry-run=$(inputs.params.DRYRUN)",
                    "-n",
                    "$(inputs.params.NAMESPACE)",
                    "-k",
                    "$(inputs.params.PATHTODEPLOY)"
                ]
            }]
        }
    })
}

/// Applies plain manifests at a path with `kubectl`.
pub fn create_deploy_using_kubectl_task(namespace: &str) -> Document {
    json!({
        "apiVersion": PIPELINE_API_VERSION,
        "kind": "Task",
        "metadata": metadata(&NamespacedName::new(namespace, DEPLOY_USING_KUBECTL_TASK)),
        "spec": {
            "resources": { "inputs": [{ "name": "source", "type": "git" }] },
            "params": [
                {
                    "name": "PATHTODEPLOY",
                    "type": "string",
                    "description": "Path to the manifest to apply",
                    "default": "deploy"
                },
                {
                    "name": "NAMESPACE",
                    "type": "string",
                    "description": "Namespace to deploy into"
                },
                {
                    "name": "DRYRUN",
                    "type": "string",
                    "description": "If true run a server-side dryrun.",
                    "default": "false"
                },
                {
                    "name": "YAMLPATHTOIMAGE",
                    "type": "string",
                    "description":
                        "The path to the image to replace in the yaml manifest (arg to yq)"
                }
            ],
            "steps": [{
                "name": "run-kubectl",
                "image": KUBECTL_IMAGE,
                "workingDir": "/workspace/source",
                "command": ["kubectl"],
                "args": [
                    "apply",
                    "--dry-run=$(inputs.params.DRYRUN)",
                    "-n",
                    "$(inputs.params.NAMESPACE)",
                    "-f",
                    "$(inputs.params.PATHTODEPLOY)"
                ]
            }]
        }
    })
}

fn deploy_pipeline(name: &NamespacedName, namespace: &str, dry_run: bool) -> Document {
    json!({
        "apiVersion": PIPELINE_API_VERSION,
        "kind": "Pipeline",
        "metadata": metadata(name),
        "spec": {
            "resources": [{ "name": "source-repo", "type": "git" }],
            "tasks": [{
                "name": "apply-source",
                "taskRef": { "name": DEPLOY_FROM_SOURCE_TASK },
                "params": [
                    { "name": "DRYRUN", "value": dry_run.to_string() },
                    { "name": "NAMESPACE", "value": namespace }
                ],
                "resources": { "inputs": [{ "name": "source", "resource": "source-repo" }] }
            }]
        }
    })
}

/// Dry-runs the GitOps repository for a pull request.
pub fn create_ci_pipeline(name: &NamespacedName, namespace: &str) -> Document {
    deploy_pipeline(name, namespace, true)
}

/// Applies the GitOps repository after a push.
pub fn create_cd_pipeline(name: &NamespacedName, namespace: &str) -> Document {
    deploy_pipeline(name, namespace, false)
}

/// Builds a service image from a pull request.
pub fn create_app_ci_pipeline(name: &NamespacedName) -> Document {
    json!({
        "apiVersion": PIPELINE_API_VERSION,
        "kind": "Pipeline",
        "metadata": metadata(name),
        "spec": {
            "params": [
                { "name": "REPO", "type": "string" },
                { "name": "COMMIT_SHA", "type": "string" }
            ],
            "resources": [
                { "name": "source-repo", "type": "git" },
                { "name": "runtime-image", "type": "image" }
            ],
            "tasks": [{
                "name": "build-image",
                "taskSpec": {
                    "resources": {
                        "inputs": [{ "name": "source", "type": "git" }],
                        "outputs": [{ "name": "image", "type": "image" }]
                    },
                    "steps": [{
                        "name": "build",
                        "image": BUILDAH_IMAGE,
                        "workingDir": "/workspace/source",
                        "command": ["buildah"],
                        "args": [
                            "bud",
                            "--tls-verify=false",
                            "-t",
                            "$(outputs.resources.image.url)",
                            "."
                        ],
                        "securityContext": { "privileged": true }
                    }]
                },
                "resources": {
                    "inputs": [{ "name": "source", "resource": "source-repo" }],
                    "outputs": [{ "name": "image", "resource": "runtime-image" }]
                }
            }]
        }
    })
}

fn binding(name: &str, namespace: &str, params: Document) -> Document {
    json!({
        "apiVersion": TRIGGERS_API_VERSION,
        "kind": "TriggerBinding",
        "metadata": metadata(&NamespacedName::new(namespace, name)),
        "spec": { "params": params }
    })
}

/// Extracts the pull request fields from a GitHub webhook.
pub fn create_pr_binding(namespace: &str) -> Document {
    binding(
        PR_BINDING,
        namespace,
        json!([
            { "name": "gitref", "value": "$(body.pull_request.head.ref)" },
            { "name": "gitsha", "value": "$(body.pull_request.head.sha)" },
            { "name": "gitrepositoryurl", "value": "$(body.repository.clone_url)" },
            { "name": "fullname", "value": "$(body.repository.full_name)" }
        ]),
    )
}

/// Extracts the push fields from a GitHub webhook.
pub fn create_push_binding(namespace: &str) -> Document {
    binding(
        PUSH_BINDING,
        namespace,
        json!([
            { "name": "gitref", "value": "$(body.ref)" },
            { "name": "gitsha", "value": "$(body.head_commit.id)" },
            { "name": "gitrepositoryurl", "value": "$(body.repository.clone_url)" }
        ]),
    )
}

fn run_template(
    name: &str,
    namespace: &str,
    service_account: &str,
    pipeline: &str,
    extra_resources: Document,
) -> Document {
    let mut resources = vec![json!({
        "name": "source-repo",
        "resourceSpec": {
            "type": "git",
            "params": [
                { "name": "revision", "value": "$(params.gitsha)" },
                { "name": "url", "value": "$(params.gitrepositoryurl)" }
            ]
        }
    })];
    if let Some(extra) = extra_resources.as_array() {
        resources.extend(extra.iter().cloned());
    }

    json!({
        "apiVersion": TRIGGERS_API_VERSION,
        "kind": "TriggerTemplate",
        "metadata": metadata(&NamespacedName::new(namespace, name)),
        "spec": {
            "params": [
                { "name": "gitref", "description": "The git branch for this PR" },
                { "name": "gitsha", "description": "the specific commit SHA." },
                { "name": "gitrepositoryurl", "description": "The git repository url" }
            ],
            "resourcetemplates": [{
                "apiVersion": PIPELINE_API_VERSION,
                "kind": "PipelineRun",
                "metadata": { "generateName": format!("{pipeline}-run-") },
                "spec": {
                    "serviceAccountName": service_account,
                    "pipelineRef": { "name": pipeline },
                    "resources": resources
                }
            }]
        }
    })
}

pub fn create_ci_dryrun_template(namespace: &str, service_account: &str) -> Document {
    run_template(
        CI_DRYRUN_TEMPLATE,
        namespace,
        service_account,
        CI_DRYRUN_PIPELINE,
        json!([]),
    )
}

pub fn create_cd_push_template(namespace: &str, service_account: &str) -> Document {
    run_template(
        CD_PUSH_TEMPLATE,
        namespace,
        service_account,
        CD_DEPLOY_PIPELINE,
        json!([]),
    )
}

pub fn create_app_ci_build_pr_template(namespace: &str, service_account: &str) -> Document {
    run_template(
        APP_CI_BUILD_PR_TEMPLATE,
        namespace,
        service_account,
        APP_CI_PIPELINE,
        json!([{
            "name": "runtime-image",
            "resourceSpec": {
                "type": "image",
                "params": [{
                    "name": "url",
                    "value": "$(params.imageRepo):$(params.gitref)-$(params.gitsha)"
                }]
            }
        }]),
    )
}
