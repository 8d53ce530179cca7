//! The event listener that receives GitOps repository webhooks, and the route
//! that exposes it.

use kubeseed_core::resources::Document;
use serde_json::json;

use super::tekton::{CD_PUSH_TEMPLATE, CI_DRYRUN_TEMPLATE, PR_BINDING, PUSH_BINDING};

pub const EVENT_LISTENER_NAME: &str = "cicd-event-listener";
pub const GITOPS_WEBHOOK_SECRET: &str = "gitops-webhook-secret";
pub const WEBHOOK_SECRET_KEY: &str = "webhook-secret-key";

const ROUTE_NAME: &str = "gitops-webhook-event-listener-route";
const EVENT_LISTENER_PORT: u16 = 8080;

fn trigger(
    name: &str,
    filter: String,
    binding: &str,
    template: &str,
    secret: &str,
    namespace: &str,
) -> Document {
    json!({
        "name": name,
        "interceptors": [
            {
                "github": {
                    "secretRef": {
                        "secretName": secret,
                        "secretKey": WEBHOOK_SECRET_KEY,
                        "namespace": namespace
                    }
                }
            },
            { "cel": { "filter": filter } }
        ],
        "bindings": [{ "ref": binding }],
        "template": { "name": template }
    })
}

/// Listens for pull requests and pushes to `org_repo` (`org/repo`).
pub fn create_event_listener(
    org_repo: &str,
    namespace: &str,
    service_account: &str,
    secret_name: &str,
) -> Document {
    let pr_filter = format!(
        "(header.match('X-GitHub-Event', 'pull_request') \
         && body.action == 'opened' || body.action == 'synchronize') \
         && body.pull_request.head.repo.full_name == '{org_repo}'"
    );
    let push_filter = format!(
        "(header.match('X-GitHub-Event', 'push') \
         && body.repository.full_name == '{org_repo}') \
         && body.ref.startsWith('refs/heads/master')"
    );

    json!({
        "apiVersion": "triggers.tekton.dev/v1alpha1",
        "kind": "EventListener",
        "metadata": { "name": EVENT_LISTENER_NAME, "namespace": namespace },
        "spec": {
            "serviceAccountName": service_account,
            "triggers": [
                trigger(
                    "ci-dryrun-from-pr",
                    pr_filter,
                    PR_BINDING,
                    CI_DRYRUN_TEMPLATE,
                    secret_name,
                    namespace
                ),
                trigger(
                    "cd-deploy-from-push",
                    push_filter,
                    PUSH_BINDING,
                    CD_PUSH_TEMPLATE,
                    secret_name,
                    namespace
                )
            ]
        }
    })
}

/// OpenShift route to the event listener service.
pub fn create_route(namespace: &str) -> Document {
    json!({
        "apiVersion": "route.openshift.io/v1",
        "kind": "Route",
        "metadata": {
            "name": ROUTE_NAME,
            "namespace": namespace,
            "labels": { "app.kubernetes.io/managed-by": "EventListener" }
        },
        "spec": {
            "to": {
                "kind": "Service",
                "name": format!("el-{EVENT_LISTENER_NAME}"),
                "weight": 100
            },
            "port": { "targetPort": EVENT_LISTENER_PORT },
            "wildcardPolicy": "None"
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_listener_filters_on_repository() {
        let listener =
            create_event_listener("org/gitops", "tst-cicd", "pipeline", GITOPS_WEBHOOK_SECRET);
        let triggers = listener["spec"]["triggers"].as_array().unwrap();
        assert_eq!(triggers.len(), 2);
        for trigger in triggers {
            let filter = trigger["interceptors"][1]["cel"]["filter"].as_str().unwrap();
            assert!(filter.contains("'org/gitops'"));
            assert_eq!(
                trigger["interceptors"][0]["github"]["secretRef"]["secretName"],
                GITOPS_WEBHOOK_SECRET
            );
        }
    }

    #[test]
    fn test_route_targets_listener_service() {
        let route = create_route("tst-cicd");
        assert_eq!(route["spec"]["to"]["name"], "el-cicd-event-listener");
        assert_eq!(route["metadata"]["namespace"], "tst-cicd");
    }
}
