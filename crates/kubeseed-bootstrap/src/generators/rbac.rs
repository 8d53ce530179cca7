//! Namespace, service account and cluster role documents.

use k8s_openapi::api::core::v1::{Namespace, ObjectReference, ServiceAccount};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, PolicyRule, RoleRef, Subject};
use kubeseed_core::meta::{NamespacedName, object_meta};

pub const CLUSTER_ROLE_NAME: &str = "pipelines-service-role";
const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

pub fn create_namespace(name: &str) -> Namespace {
    Namespace {
        metadata: object_meta(&NamespacedName::cluster(name)),
        ..Namespace::default()
    }
}

pub fn create_cluster_role(name: &NamespacedName, rules: Vec<PolicyRule>) -> ClusterRole {
    ClusterRole {
        metadata: object_meta(name),
        rules: Some(rules),
        ..ClusterRole::default()
    }
}

pub fn create_service_account(name: &NamespacedName) -> ServiceAccount {
    ServiceAccount {
        metadata: object_meta(name),
        ..ServiceAccount::default()
    }
}

/// Mount `secret_name` into the service account.
pub fn add_secret_to_service_account(mut sa: ServiceAccount, secret_name: &str) -> ServiceAccount {
    sa.secrets.get_or_insert_with(Vec::new).push(ObjectReference {
        name: Some(secret_name.to_string()),
        ..ObjectReference::default()
    });
    sa
}

/// Bind `sa` to the role `role_kind`/`role_name` cluster-wide.
pub fn create_cluster_role_binding(
    name: &NamespacedName,
    sa: &ServiceAccount,
    role_kind: &str,
    role_name: &str,
) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: object_meta(name),
        role_ref: RoleRef {
            api_group: RBAC_API_GROUP.to_string(),
            kind: role_kind.to_string(),
            name: role_name.to_string(),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: sa.metadata.name.clone().unwrap_or_default(),
            namespace: sa.metadata.namespace.clone(),
            ..Subject::default()
        }]),
    }
}
