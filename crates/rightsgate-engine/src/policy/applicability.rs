//! Applicability filter: which policies are in scope for a resource/action.
//!
//! A policy with no `resource` condition applies to every resource; the same
//! holds independently for `action`. When such conditions exist, at least one
//! of them must pass against the requested value.

use rightsgate_core::{DynamicValue, Policy};

use super::condition::evaluate_condition;
use super::RegexMode;

pub fn is_applicable(policy: &Policy, resource: &str, action: &str, regex: RegexMode) -> bool {
    field_applies(policy, "resource", resource, regex) && field_applies(policy, "action", action, regex)
}

fn field_applies(policy: &Policy, field: &str, value: &str, regex: RegexMode) -> bool {
    if !policy.has_condition_on(field) {
        return true; // wildcard
    }
    let actual = DynamicValue::from(value);
    policy
        .conditions
        .iter()
        .filter(|c| c.field == field)
        .any(|c| evaluate_condition(c, &actual, regex))
}

/// Narrow an ordered policy list, preserving order.
pub fn applicable_policies<'a>(
    policies: &'a [Policy],
    resource: &str,
    action: &str,
    regex: RegexMode,
) -> Vec<&'a Policy> {
    policies
        .iter()
        .filter(|p| is_applicable(p, resource, action, regex))
        .collect()
}

#[cfg(test)]
mod tests {
    use rightsgate_core::{PolicyRecord, PolicyType};

    use super::*;

    fn policy(conditions: &str) -> Policy {
        PolicyRecord::new(1, 1, "p", PolicyType::Allow, 0)
            .with_conditions(conditions)
            .compile()
            .expect("valid policy")
    }

    #[test]
    fn no_scope_conditions_is_wildcard() {
        let p = policy(r#"[{"field":"hour","operator":"gte","value":9}]"#);
        assert!(is_applicable(&p, "workspace", "delete", RegexMode::Stub));
        assert!(is_applicable(&policy(""), "anything", "anything", RegexMode::Stub));
    }

    #[test]
    fn resource_and_action_both_must_hold() {
        let p = policy(
            r#"[{"field":"resource","operator":"eq","value":"bot"},
                {"field":"action","operator":"in","value":["publish","delete"]}]"#,
        );
        assert!(is_applicable(&p, "bot", "publish", RegexMode::Stub));
        assert!(!is_applicable(&p, "bot", "read", RegexMode::Stub));
        assert!(!is_applicable(&p, "dataset", "publish", RegexMode::Stub));
    }

    #[test]
    fn action_wildcard_when_only_resource_scoped() {
        let p = policy(r#"[{"field":"resource","operator":"eq","value":"bot"}]"#);
        assert!(is_applicable(&p, "bot", "anything", RegexMode::Stub));
        assert!(!is_applicable(&p, "workspace", "anything", RegexMode::Stub));
    }

    #[test]
    fn any_passing_resource_condition_is_enough() {
        // Scope filtering ignores the logic chain: either resource test may pass.
        let p = policy(
            r#"[{"field":"resource","operator":"eq","value":"bot"},
                {"field":"resource","operator":"eq","value":"plugin"}]"#,
        );
        assert!(is_applicable(&p, "plugin", "read", RegexMode::Stub));
    }

    #[test]
    fn unknown_operator_on_scope_field_never_applies() {
        let p = policy(r#"[{"field":"resource","operator":"glob","value":"*"}]"#);
        assert!(!is_applicable(&p, "bot", "read", RegexMode::Stub));
    }

    #[test]
    fn filter_preserves_order() {
        let a = PolicyRecord::new(1, 1, "a", PolicyType::Allow, 9).compile().expect("a");
        let b = PolicyRecord::new(2, 1, "b", PolicyType::Deny, 5)
            .with_conditions(r#"[{"field":"action","operator":"eq","value":"write"}]"#)
            .compile()
            .expect("b");
        let c = PolicyRecord::new(3, 1, "c", PolicyType::Allow, 1).compile().expect("c");
        let all = vec![a, b, c];
        let names: Vec<&str> = applicable_policies(&all, "bot", "read", RegexMode::Stub)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
