//! Per-request facts (`PolicyContext`) and the engine's decision (`PolicyResult`).

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::effect::{QuotaLimit, RateLimit, TimeWindow};
use super::value::DynamicValue;

/// Reason used when no policy matched.
pub const NO_APPLICABLE_POLICIES: &str = "No applicable policies found";
/// Reason used when a conditional policy's time window excludes the request.
pub const OUTSIDE_TIME_WINDOW: &str = "Outside allowed time window";

/// Request description evaluated by the engine. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyContext {
    pub user_id: u64,
    pub tenant_id: u64,
    #[serde(default)]
    pub workspace_id: Option<u64>,
    pub resource: String,
    pub action: String,
    #[serde(default)]
    pub resource_id: String,
    /// Supplied by the caller's clock; `hour`/`day_of_week` use its offset.
    pub time: DateTime<FixedOffset>,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub user_agent: String,
    /// Extra attributes, consulted for any non-fixed condition field.
    #[serde(default)]
    pub metadata: HashMap<String, DynamicValue>,
}

impl PolicyContext {
    pub fn new(
        tenant_id: u64,
        user_id: u64,
        resource: impl Into<String>,
        action: impl Into<String>,
        time: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            user_id,
            tenant_id,
            workspace_id: None,
            resource: resource.into(),
            action: action.into(),
            resource_id: String::new(),
            time,
            ip: String::new(),
            user_agent: String::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_workspace(mut self, workspace_id: u64) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = resource_id.into();
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = ip.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<DynamicValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Decision for one request, plus any constraint hints surfaced by matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyResult {
    pub allow: bool,
    pub reason: String,
    /// Names of the non-deny policies whose conditions matched, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggered_conditions: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, DynamicValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<QuotaLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
}

impl PolicyResult {
    pub fn new(allow: bool, reason: impl Into<String>) -> Self {
        Self {
            allow,
            reason: reason.into(),
            triggered_conditions: Vec::new(),
            metadata: BTreeMap::new(),
            quota: None,
            rate_limit: None,
            time_window: None,
        }
    }

    /// Starting point of every evaluation.
    pub fn no_applicable_policies() -> Self {
        Self::new(true, NO_APPLICABLE_POLICIES)
    }

    pub fn denied_by(policy_name: &str) -> Self {
        Self::new(false, format!("Denied by policy: {policy_name}"))
    }
}
