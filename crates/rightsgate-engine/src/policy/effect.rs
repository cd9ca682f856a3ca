//! Effect applier for matched `conditional` policies.

use rightsgate_core::{Effect, PolicyContext, PolicyResult, OUTSIDE_TIME_WINDOW};

/// Fold a conditional effect into the running result.
///
/// A request outside the effect's time window flips the result to deny and
/// the rest of this effect (hints, metadata) is not applied. Otherwise the
/// constraint hints are surfaced unmodified and metadata is shallow-merged,
/// later keys winning.
pub fn apply_conditional(result: &mut PolicyResult, effect: &Effect, ctx: &PolicyContext) {
    if let Some(window) = &effect.time_window {
        if !window.contains(&ctx.time) {
            result.allow = false;
            result.reason = OUTSIDE_TIME_WINDOW.to_owned();
            return;
        }
        result.time_window = Some(window.clone());
    }

    if let Some(quota) = &effect.quota {
        result.quota = Some(quota.clone());
    }
    if let Some(rate_limit) = &effect.rate_limit {
        result.rate_limit = Some(rate_limit.clone());
    }

    if let Some(metadata) = &effect.metadata {
        result
            .metadata
            .extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}
