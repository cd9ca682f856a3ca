//! Condition evaluation: field resolution, operators and AND/OR folding.
//!
//! Every path here is total. Unknown operators, missing fields and values of
//! the wrong shape evaluate to `false` (or `null` for fields) instead of
//! erroring, so one odd rule never fails a decision.

use std::cmp::Ordering;

use chrono::{Datelike, Timelike};
use rightsgate_core::{Condition, DynamicValue, Logic, Operator, PolicyContext};

use super::RegexMode;

/// Resolve a condition field against the request context.
///
/// Fixed attributes are read directly; `hour` and `day_of_week` (0 = Sunday)
/// derive from `time` in the offset the caller supplied. Anything else is a
/// metadata lookup, `null` when absent.
pub fn resolve_field(field: &str, ctx: &PolicyContext) -> DynamicValue {
    match field {
        "user_id" => ctx.user_id.into(),
        "tenant_id" => ctx.tenant_id.into(),
        "workspace_id" => ctx.workspace_id.into(),
        "resource" => ctx.resource.as_str().into(),
        "action" => ctx.action.as_str().into(),
        "resource_id" => ctx.resource_id.as_str().into(),
        "time" => ctx.time.to_rfc3339().into(),
        "hour" => ctx.time.hour().into(),
        "day_of_week" => ctx.time.weekday().num_days_from_sunday().into(),
        "ip" => ctx.ip.as_str().into(),
        "user_agent" => ctx.user_agent.as_str().into(),
        other => ctx.metadata.get(other).cloned().unwrap_or_default(),
    }
}

/// Evaluate one condition against an already-resolved value.
pub fn evaluate_condition(cond: &Condition, actual: &DynamicValue, regex: RegexMode) -> bool {
    match &cond.operator {
        Operator::Eq => actual.compare(&cond.value) == Ordering::Equal,
        Operator::Ne => actual.compare(&cond.value) != Ordering::Equal,
        Operator::Gt => actual.compare(&cond.value) == Ordering::Greater,
        Operator::Lt => actual.compare(&cond.value) == Ordering::Less,
        Operator::Gte => actual.compare(&cond.value) != Ordering::Less,
        Operator::Lte => actual.compare(&cond.value) != Ordering::Greater,
        Operator::In => value_in_list(actual, &cond.value),
        Operator::NotIn => !value_in_list(actual, &cond.value),
        Operator::Contains => actual.to_string().contains(&cond.value.to_string()),
        Operator::Regex => regex_match(cond, actual, regex),
        Operator::Unknown(_) => false,
    }
}

fn value_in_list(actual: &DynamicValue, list: &DynamicValue) -> bool {
    list.as_list()
        .is_some_and(|items| items.iter().any(|item| actual.compare(item) == Ordering::Equal))
}

fn regex_match(cond: &Condition, actual: &DynamicValue, mode: RegexMode) -> bool {
    match mode {
        RegexMode::Stub => false,
        RegexMode::Enabled => cond
            .pattern()
            .is_some_and(|re| re.is_match(&actual.to_string())),
    }
}

/// Evaluate a policy's condition list against the context.
///
/// Every condition is evaluated, then results fold left to right: result
/// `i` joins the running value using condition `i - 1`'s logic. An empty
/// list matches.
pub fn evaluate_conditions(conditions: &[Condition], ctx: &PolicyContext, regex: RegexMode) -> bool {
    let results: Vec<bool> = conditions
        .iter()
        .map(|c| evaluate_condition(c, &resolve_field(&c.field, ctx), regex))
        .collect();
    fold_logic(conditions, &results)
}

fn fold_logic(conditions: &[Condition], results: &[bool]) -> bool {
    let Some((&first, rest)) = results.split_first() else {
        return true;
    };

    conditions
        .iter()
        .zip(rest)
        .fold(first, |acc, (prev, &r)| match prev.logic {
            Logic::Or => acc || r,
            Logic::And => acc && r,
        })
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::*;

    fn ctx_at(hour: u32) -> PolicyContext {
        // 2024-05-06 is a Monday.
        let time = FixedOffset::east_opt(8 * 3600)
            .and_then(|tz| tz.with_ymd_and_hms(2024, 5, 6, hour, 0, 0).single())
            .expect("valid time");
        PolicyContext::new(1, 42, "workspace", "read", time)
            .with_workspace(7)
            .with_ip("10.0.0.8")
            .with_user_agent("curl/8.4.0")
            .with_metadata("plan", "pro")
            .with_metadata("groups", vec!["eng", "ops"])
    }

    fn business_hours() -> Vec<Condition> {
        vec![
            Condition::new("hour", Operator::Gte, 9i64).with_logic(Logic::And),
            Condition::new("hour", Operator::Lte, 17i64),
        ]
    }

    #[test]
    fn business_hours_fold_with_and() {
        assert!(evaluate_conditions(&business_hours(), &ctx_at(10), RegexMode::Stub));
        assert!(!evaluate_conditions(&business_hours(), &ctx_at(20), RegexMode::Stub));
        assert!(!evaluate_conditions(&business_hours(), &ctx_at(8), RegexMode::Stub));
    }

    #[test]
    fn empty_condition_list_matches() {
        assert!(evaluate_conditions(&[], &ctx_at(3), RegexMode::Stub));
    }

    #[test]
    fn resolves_fixed_and_derived_fields() {
        let ctx = ctx_at(10);
        assert_eq!(resolve_field("user_id", &ctx), DynamicValue::from(42u64));
        assert_eq!(resolve_field("workspace_id", &ctx), DynamicValue::from(7u64));
        assert_eq!(resolve_field("hour", &ctx), DynamicValue::from(10u32));
        assert_eq!(resolve_field("day_of_week", &ctx), DynamicValue::from(1u32));
        assert_eq!(
            resolve_field("time", &ctx),
            DynamicValue::from("2024-05-06T10:00:00+08:00")
        );
        assert_eq!(resolve_field("plan", &ctx), DynamicValue::from("pro"));
        assert_eq!(resolve_field("missing", &ctx), DynamicValue::Null);
    }

    #[test]
    fn in_and_not_in_use_list_membership() {
        let cond = Condition::new("x", Operator::In, vec!["a", "b", "c"]);
        assert!(evaluate_condition(&cond, &"b".into(), RegexMode::Stub));
        assert!(!evaluate_condition(&cond, &"z".into(), RegexMode::Stub));

        let not_in = Condition::new("x", Operator::NotIn, vec!["a", "b", "c"]);
        assert!(evaluate_condition(&not_in, &"z".into(), RegexMode::Stub));

        // A scalar where a list is expected: `in` fails, so `not_in` passes.
        let scalar = Condition::new("x", Operator::In, "b");
        assert!(!evaluate_condition(&scalar, &"b".into(), RegexMode::Stub));
        let scalar = Condition::new("x", Operator::NotIn, "b");
        assert!(evaluate_condition(&scalar, &"b".into(), RegexMode::Stub));
    }

    #[test]
    fn contains_works_on_renderings() {
        let ctx = ctx_at(10);
        let cond = Condition::new("user_agent", Operator::Contains, "curl");
        assert!(evaluate_conditions(&[cond], &ctx, RegexMode::Stub));

        let groups = Condition::new("groups", Operator::Contains, "ops");
        assert!(evaluate_conditions(&[groups], &ctx, RegexMode::Stub));
    }

    #[test]
    fn cross_type_comparison_falls_back_to_strings() {
        // "10" < "9" lexicographically once either side is not a number.
        let cond = Condition::new("seats", Operator::Gt, 9i64);
        assert!(!evaluate_condition(&cond, &"10".into(), RegexMode::Stub));
        assert!(evaluate_condition(&cond, &10i64.into(), RegexMode::Stub));
    }

    #[test]
    fn regex_stub_never_matches() {
        let cond = Condition::new("user_agent", Operator::Regex, ".*");
        assert!(!evaluate_condition(&cond, &"anything".into(), RegexMode::Stub));
        assert!(!evaluate_condition(&cond, &DynamicValue::Null, RegexMode::Stub));
    }

    #[test]
    fn regex_enabled_matches_pattern() {
        let cond = Condition::new("user_agent", Operator::Regex, "^curl/\\d+");
        assert!(evaluate_condition(&cond, &"curl/8.4.0".into(), RegexMode::Enabled));
        assert!(!evaluate_condition(&cond, &"Mozilla/5.0".into(), RegexMode::Enabled));

        let invalid = Condition::new("user_agent", Operator::Regex, "(");
        assert!(!evaluate_condition(&invalid, &"(".into(), RegexMode::Enabled));
    }

    #[test]
    fn unknown_operator_is_false() {
        let cond = Condition::new("hour", Operator::Unknown("between".into()), vec![9i64, 17]);
        assert!(!evaluate_condition(&cond, &10i64.into(), RegexMode::Enabled));
    }

    #[test]
    fn logic_comes_from_previous_condition() {
        let ctx = ctx_at(10);
        // false OR true AND true => true
        let conds = vec![
            Condition::new("plan", Operator::Eq, "free").with_logic(Logic::Or),
            Condition::new("ip", Operator::Eq, "10.0.0.8"),
            Condition::new("action", Operator::Eq, "read"),
        ];
        assert!(evaluate_conditions(&conds, &ctx, RegexMode::Stub));

        // true AND false OR true => (true && false) || true => true
        let conds = vec![
            Condition::new("plan", Operator::Eq, "pro"),
            Condition::new("ip", Operator::Eq, "127.0.0.1").with_logic(Logic::Or),
            Condition::new("action", Operator::Eq, "read"),
        ];
        assert!(evaluate_conditions(&conds, &ctx, RegexMode::Stub));

        // true OR false AND false => (true || false) && false => false
        let conds = vec![
            Condition::new("plan", Operator::Eq, "pro").with_logic(Logic::Or),
            Condition::new("ip", Operator::Eq, "127.0.0.1"),
            Condition::new("action", Operator::Eq, "write"),
        ];
        assert!(!evaluate_conditions(&conds, &ctx, RegexMode::Stub));
    }
}
