//! Cluster permissions granted to the pipeline service account.

use k8s_openapi::api::rbac::v1::PolicyRule;

/// One RBAC rule, kept as static data so the table can be a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSpec {
    pub api_groups: &'static [&'static str],
    pub resources: &'static [&'static str],
    pub verbs: &'static [&'static str],
}

impl RuleSpec {
    pub fn to_policy_rule(&self) -> PolicyRule {
        PolicyRule {
            api_groups: Some(to_strings(self.api_groups)),
            resources: Some(to_strings(self.resources)),
            verbs: to_strings(self.verbs),
            ..PolicyRule::default()
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Rules bound to the pipeline service account by default.
pub const PIPELINE_SERVICE_RULES: &[RuleSpec] = &[
    RuleSpec {
        api_groups: &[""],
        resources: &["namespaces"],
        verbs: &["patch"],
    },
    RuleSpec {
        api_groups: &["rbac.authorization.k8s.io"],
        resources: &["clusterroles"],
        verbs: &["bind", "patch"],
    },
    RuleSpec {
        api_groups: &["rbac.authorization.k8s.io"],
        resources: &["clusterrolebindings"],
        verbs: &["get", "patch"],
    },
    RuleSpec {
        api_groups: &["bitnami.com"],
        resources: &["sealedsecrets"],
        verbs: &["get", "patch", "create"],
    },
];

/// Fixed policy handed to the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapPolicy {
    pub rules: &'static [RuleSpec],
}

impl BootstrapPolicy {
    pub fn policy_rules(&self) -> Vec<PolicyRule> {
        self.rules.iter().map(RuleSpec::to_policy_rule).collect()
    }
}

impl Default for BootstrapPolicy {
    fn default() -> Self {
        Self {
            rules: PIPELINE_SERVICE_RULES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_rules() {
        let rules = BootstrapPolicy::default().policy_rules();
        assert_eq!(rules.len(), 4);
        assert_eq!(rules[1].api_groups, Some(vec!["rbac.authorization.k8s.io".to_string()]));
        assert_eq!(rules[1].verbs, vec!["bind", "patch"]);
        assert_eq!(rules[3].resources, Some(vec!["sealedsecrets".to_string()]));
    }
}
