//! Policy store seam and compile-once decoding at the store boundary.
//!
//! Persistence is external. Implementations hand back raw [`PolicyRecord`]s;
//! [`compile_records`] decodes them once per fetch, drops disabled and
//! malformed rows, and orders the rest for evaluation.

pub mod cache;
pub mod memory;

use async_trait::async_trait;

use rightsgate_core::error::{Result, RightsGateError};
use rightsgate_core::{Policy, PolicyRecord};

pub use cache::PolicyCache;
pub use memory::InMemoryPolicyStore;

/// Source of a tenant's policies.
///
/// Must tolerate concurrent calls. Transport or storage failures surface as
/// `RightsGateError::StoreUnavailable`; retries, if any, belong here and not
/// in the engine.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Enabled policies of a tenant, in any order.
    async fn load_enabled_policies(&self, tenant_id: u64) -> Result<Vec<PolicyRecord>>;
}

/// Outcome of decoding one fetch.
#[derive(Debug, Default)]
pub struct CompiledPolicies {
    /// Enabled, well-formed policies in evaluation order.
    pub policies: Vec<Policy>,
    /// One `MalformedPolicy` error per rejected record.
    pub rejected: Vec<RightsGateError>,
}

pub fn compile_records(records: Vec<PolicyRecord>) -> CompiledPolicies {
    let mut out = CompiledPolicies::default();
    for record in records.into_iter().filter(|r| r.enabled) {
        match record.compile() {
            Ok(policy) => out.policies.push(policy),
            Err(e) => out.rejected.push(e),
        }
    }
    order_for_evaluation(&mut out.policies);
    out
}

/// Priority descending; equal priorities keep the oldest policy first.
pub fn order_for_evaluation(policies: &mut [Policy]) {
    policies.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rightsgate_core::PolicyType;

    use super::*;

    fn at(day: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).single().expect("valid date")
    }

    #[test]
    fn orders_by_priority_then_creation() {
        let records = vec![
            PolicyRecord::new(1, 1, "low", PolicyType::Allow, 10).with_created_at(at(1)),
            PolicyRecord::new(2, 1, "high-new", PolicyType::Allow, 100).with_created_at(at(5)),
            PolicyRecord::new(3, 1, "high-old", PolicyType::Allow, 100).with_created_at(at(2)),
            PolicyRecord::new(4, 1, "negative", PolicyType::Allow, -5).with_created_at(at(1)),
        ];
        let names: Vec<String> = compile_records(records)
            .policies
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["high-old", "high-new", "low", "negative"]);
    }

    #[test]
    fn drops_disabled_and_collects_malformed() {
        let records = vec![
            PolicyRecord::new(1, 1, "ok", PolicyType::Allow, 0),
            PolicyRecord::new(2, 1, "off", PolicyType::Deny, 0).disabled(),
            PolicyRecord::new(3, 1, "broken", PolicyType::Deny, 0).with_conditions("{"),
        ];
        let compiled = compile_records(records);
        assert_eq!(compiled.policies.len(), 1);
        assert_eq!(compiled.policies[0].name, "ok");
        assert_eq!(compiled.rejected.len(), 1);
    }
}
