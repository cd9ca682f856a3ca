//! Policy engine: loads a tenant's policies and folds them into one decision.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use rightsgate_core::error::{ErrorCode, Result, RightsGateError};
use rightsgate_core::{Policy, PolicyContext, PolicyResult, PolicyType};

use crate::audit::{DecisionRecord, DecisionSink};
use crate::config::EngineSection;
use crate::obs::EngineMetrics;
use crate::store::{compile_records, PolicyCache, PolicyStore};

use super::applicability::applicable_policies;
use super::condition::evaluate_conditions;
use super::effect::apply_conditional;
use super::RegexMode;

/// Evaluates requests against tenant policies.
///
/// Construct once, share via `Arc`. Evaluation takes `&self`; the only shared
/// writes are metric atomics and the policy cache.
pub struct PolicyEngine {
    store: Arc<dyn PolicyStore>,
    cache: PolicyCache,
    metrics: Arc<EngineMetrics>,
    sink: Option<Arc<dyn DecisionSink>>,
    store_timeout: Duration,
    regex: RegexMode,
}

impl PolicyEngine {
    pub fn new(store: Arc<dyn PolicyStore>, cfg: &EngineSection) -> Self {
        Self {
            store,
            cache: PolicyCache::new(cfg.cache_ttl()),
            metrics: Arc::new(EngineMetrics::default()),
            sink: None,
            store_timeout: cfg.store_timeout(),
            regex: cfg.regex_operator,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DecisionSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Share a metrics registry with other components.
    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    /// Call [`PolicyCache::invalidate`] after changing a tenant's policies.
    pub fn cache(&self) -> &PolicyCache {
        &self.cache
    }

    /// Decide whether the request described by `ctx` is allowed.
    ///
    /// Errors only when the tenant's policies cannot be loaded. A policy that
    /// fails to decode is skipped; the rest still decide.
    pub async fn evaluate_policy(&self, ctx: &PolicyContext) -> Result<PolicyResult> {
        let started = Instant::now();

        let policies = self.load_policies(ctx.tenant_id).await?;
        let applicable = applicable_policies(&policies, &ctx.resource, &ctx.action, self.regex);
        let result = self.decide(&applicable, ctx);

        info!(
            tenant_id = ctx.tenant_id,
            user_id = ctx.user_id,
            resource = %ctx.resource,
            action = %ctx.action,
            allow = result.allow,
            reason = %result.reason,
            "policy applied"
        );

        let outcome = if result.allow { "allow" } else { "deny" };
        self.metrics.decisions.inc(&[("outcome", outcome)]);
        self.metrics
            .evaluation_duration
            .observe(&[("outcome", outcome)], started.elapsed());

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.record(&DecisionRecord::new(ctx, &result)).await {
                warn!(tenant_id = ctx.tenant_id, error = %e, "decision sink failed");
            }
        }

        Ok(result)
    }

    /// Fold an already ordered, applicable policy list into a decision.
    ///
    /// A matching deny returns immediately. Matching allow and conditional
    /// policies update the running result in order, so the last match decides
    /// the reason.
    pub fn decide(&self, policies: &[&Policy], ctx: &PolicyContext) -> PolicyResult {
        let mut result = PolicyResult::no_applicable_policies();
        let tenant = ctx.tenant_id.to_string();

        for policy in policies {
            self.metrics
                .policy_evaluations
                .inc(&[("tenant", tenant.as_str())]);

            if !evaluate_conditions(&policy.conditions, ctx, self.regex) {
                continue;
            }

            debug!(tenant_id = ctx.tenant_id, policy = %policy.name, kind = policy.kind.as_str(), "policy matched");
            match policy.kind {
                PolicyType::Deny => return PolicyResult::denied_by(&policy.name),
                PolicyType::Allow => {
                    result.allow = true;
                    result.reason = format!("Allowed by policy: {}", policy.name);
                }
                PolicyType::Conditional => apply_conditional(&mut result, &policy.effect, ctx),
            }
            result.triggered_conditions.push(policy.name.clone());
        }

        result
    }

    async fn load_policies(&self, tenant_id: u64) -> Result<Arc<[Policy]>> {
        if self.cache.is_enabled() {
            if let Some(hit) = self.cache.get(tenant_id) {
                self.metrics.policy_cache.inc(&[("result", "hit")]);
                return Ok(hit);
            }
            self.metrics.policy_cache.inc(&[("result", "miss")]);
        }

        let fetched = tokio::time::timeout(self.store_timeout, self.store.load_enabled_policies(tenant_id)).await;
        let records = match fetched {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                let kind = match e.code() {
                    ErrorCode::StoreTimeout => "timeout",
                    _ => "unavailable",
                };
                self.metrics.store_errors.inc(&[("kind", kind)]);
                warn!(tenant_id, error = %e, "failed to load policies");
                return Err(e);
            }
            Err(_) => {
                self.metrics.store_errors.inc(&[("kind", "timeout")]);
                warn!(tenant_id, timeout = ?self.store_timeout, "policy store timed out");
                return Err(RightsGateError::StoreTimeout(self.store_timeout));
            }
        };

        let compiled = compile_records(records);
        for e in &compiled.rejected {
            self.metrics.policies_skipped.inc(&[("reason", "malformed")]);
            warn!(tenant_id, error = %e, "skipping malformed policy");
        }

        let policies: Arc<[Policy]> = compiled.policies.into();
        self.cache.insert(tenant_id, Arc::clone(&policies));
        Ok(policies)
    }
}
