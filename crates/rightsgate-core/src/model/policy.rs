//! Policies: the persisted record shape and its compiled, typed form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RightsGateError};

use super::condition::{decode_conditions, Condition};
use super::effect::{decode_effect, Effect};

/// Policy type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyType {
    Allow,
    Deny,
    Conditional,
}

impl PolicyType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allow" => Some(PolicyType::Allow),
            "deny" => Some(PolicyType::Deny),
            "conditional" => Some(PolicyType::Conditional),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PolicyType::Allow => "allow",
            PolicyType::Deny => "deny",
            PolicyType::Conditional => "conditional",
        }
    }
}

/// Policy row as the store persists it: conditions and effect are JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub id: u64,
    pub tenant_id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// `allow`, `deny` or `conditional`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Higher is evaluated first.
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub conditions: String,
    #[serde(default)]
    pub effect: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_enabled() -> bool {
    true
}

impl PolicyRecord {
    pub fn new(id: u64, tenant_id: u64, name: impl Into<String>, kind: PolicyType, priority: i64) -> Self {
        Self {
            id,
            tenant_id,
            name: name.into(),
            description: String::new(),
            kind: kind.as_str().to_owned(),
            priority,
            conditions: String::new(),
            effect: String::new(),
            enabled: true,
            created_at: DateTime::<Utc>::default(),
            updated_at: None,
        }
    }

    pub fn with_conditions(mut self, json: impl Into<String>) -> Self {
        self.conditions = json.into();
        self
    }

    pub fn with_effect(mut self, json: impl Into<String>) -> Self {
        self.effect = json.into();
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Decode the stored blobs into a typed [`Policy`].
    pub fn compile(&self) -> Result<Policy> {
        let kind = PolicyType::parse(&self.kind).ok_or_else(|| {
            RightsGateError::malformed(self.id, format!("unknown policy type: {:?}", self.kind))
        })?;
        let conditions = decode_conditions(&self.conditions).map_err(|e| {
            RightsGateError::malformed(self.id, format!("failed to parse conditions: {e}"))
        })?;
        // Only conditional policies consult their effect. A bad effect on an
        // allow or deny must not drop the rule.
        let effect = match (kind, decode_effect(&self.effect)) {
            (_, Ok(effect)) => effect,
            (PolicyType::Conditional, Err(e)) => {
                return Err(RightsGateError::malformed(self.id, format!("failed to parse effect: {e}")));
            }
            (_, Err(e)) => {
                tracing::warn!(policy_id = self.id, error = %e, "ignoring unparsable effect on {} policy", kind.as_str());
                Effect::default()
            }
        };

        Ok(Policy {
            id: self.id,
            tenant_id: self.tenant_id,
            name: self.name.clone(),
            description: self.description.clone(),
            kind,
            priority: self.priority,
            conditions,
            effect,
            enabled: self.enabled,
            created_at: self.created_at,
        })
    }
}

/// Compiled tenant-scoped policy. Immutable during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    pub id: u64,
    pub tenant_id: u64,
    pub name: String,
    pub description: String,
    pub kind: PolicyType,
    pub priority: i64,
    pub conditions: Vec<Condition>,
    pub effect: Effect,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Policy {
    /// Whether any condition tests the given field.
    pub fn has_condition_on(&self, field: &str) -> bool {
        self.conditions.iter().any(|c| c.field == field)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use crate::error::ErrorCode;

    use super::*;

    #[test]
    fn compiles_typed_policy() {
        let rec = PolicyRecord::new(7, 1, "office-hours", PolicyType::Conditional, 10)
            .with_conditions(r#"[{"field":"resource","operator":"eq","value":"workspace"}]"#)
            .with_effect(r#"{"allow":true,"time_window":{"start_time":"09:00","end_time":"18:00"}}"#);
        let p = rec.compile().unwrap();
        assert_eq!(p.kind, PolicyType::Conditional);
        assert!(p.has_condition_on("resource"));
        assert!(!p.has_condition_on("action"));
        assert!(p.effect.time_window.is_some());
    }

    #[test]
    fn malformed_parts_are_reported_with_policy_id() {
        let bad_type = PolicyRecord::new(1, 1, "x", PolicyType::Allow, 0);
        let bad_type = PolicyRecord {
            kind: "maybe".into(),
            ..bad_type
        };
        let bad_conditions = PolicyRecord::new(2, 1, "x", PolicyType::Deny, 0).with_conditions("[oops");
        let bad_effect = PolicyRecord::new(3, 1, "x", PolicyType::Conditional, 0).with_effect("{\"allow\":");
        let bad_window = PolicyRecord::new(4, 1, "x", PolicyType::Conditional, 0)
            .with_effect(r#"{"time_window":{"start_time":"25:00","end_time":"18:00"}}"#);

        for (rec, id) in [(bad_type, 1), (bad_conditions, 2), (bad_effect, 3), (bad_window, 4)] {
            let err = rec.compile().unwrap_err();
            assert_eq!(err.code(), ErrorCode::MalformedPolicy);
            match err {
                RightsGateError::MalformedPolicy { policy_id, .. } => assert_eq!(policy_id, id),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn unused_effect_never_drops_allow_or_deny() {
        let bad_window = r#"{"time_window": {"start_time": "25:00", "end_time": "18:00"}}"#;
        for kind in [PolicyType::Deny, PolicyType::Allow] {
            let p = PolicyRecord::new(5, 1, "lockdown", kind, 0)
                .with_effect(bad_window)
                .compile()
                .unwrap();
            assert_eq!(p.kind, kind);
            assert!(p.effect.time_window.is_none());
        }
        let truncated = PolicyRecord::new(6, 1, "lockdown", PolicyType::Deny, 0).with_effect("{\"allow\":");
        assert!(truncated.compile().is_ok());
    }

    #[test]
    fn record_json_uses_type_key_and_defaults() {
        let rec: PolicyRecord = serde_json::from_str(
            r#"{"id": 1, "tenant_id": 2, "name": "n", "type": "deny", "created_at": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(rec.enabled);
        assert_eq!(rec.priority, 0);
        assert!(rec.compile().unwrap().conditions.is_empty());
    }
}
