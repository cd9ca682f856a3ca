//! Decision audit seam.
//!
//! One [`DecisionRecord`] per evaluated request, handed to a [`DecisionSink`]
//! after the decision is final. Sinks observe; they never change the outcome.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use rightsgate_core::error::Result;
use rightsgate_core::{PolicyContext, PolicyResult};

/// Flattened permission-check log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRecord {
    pub user_id: u64,
    pub tenant_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<u64>,
    pub resource: String,
    pub action: String,
    pub resource_id: String,
    pub allowed: bool,
    pub reason: String,
    pub ip: String,
    pub user_agent: String,
    pub evaluated_at: DateTime<FixedOffset>,
}

impl DecisionRecord {
    pub fn new(ctx: &PolicyContext, result: &PolicyResult) -> Self {
        Self {
            user_id: ctx.user_id,
            tenant_id: ctx.tenant_id,
            workspace_id: ctx.workspace_id,
            resource: ctx.resource.clone(),
            action: ctx.action.clone(),
            resource_id: ctx.resource_id.clone(),
            allowed: result.allow,
            reason: result.reason.clone(),
            ip: ctx.ip.clone(),
            user_agent: ctx.user_agent.clone(),
            evaluated_at: ctx.time,
        }
    }
}

#[async_trait]
pub trait DecisionSink: Send + Sync {
    async fn record(&self, decision: &DecisionRecord) -> Result<()>;
}

/// Writes each decision as a structured `tracing` event on the `audit` target.
#[derive(Debug, Default)]
pub struct TracingDecisionSink;

#[async_trait]
impl DecisionSink for TracingDecisionSink {
    async fn record(&self, d: &DecisionRecord) -> Result<()> {
        tracing::info!(
            target: "rightsgate::audit",
            tenant_id = d.tenant_id,
            user_id = d.user_id,
            workspace_id = ?d.workspace_id,
            resource = %d.resource,
            action = %d.action,
            resource_id = %d.resource_id,
            allowed = d.allowed,
            reason = %d.reason,
            ip = %d.ip,
            user_agent = %d.user_agent,
            evaluated_at = %d.evaluated_at.to_rfc3339(),
            "permission check"
        );
        Ok(())
    }
}
