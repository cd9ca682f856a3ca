//! rightsgate core: policy data model, dynamic values and error types.
//!
//! This crate defines the persisted policy contract (how stored condition and
//! effect blobs decode), the per-request context and the decision shape shared
//! by the engine, stores and tooling. It carries no async runtime so
//! stores and tools can reuse it without pulling in the engine.
//!
//! # Failure handling
//! Panics, `unwrap`, and `expect` are compile-denied here. Every fallible path
//! surfaces as `RightsGateError`/`Result` so a bad stored policy can never take
//! down the decision path.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;

/// Shared result type.
pub use error::{ErrorCode, Result, RightsGateError};
pub use model::{
    Condition, DynamicValue, Effect, Logic, Operator, Policy, PolicyContext, PolicyRecord,
    PolicyResult, PolicyType, QuotaLimit, QuotaPeriod, RateLimit, TimeWindow,
    NO_APPLICABLE_POLICIES, OUTSIDE_TIME_WINDOW,
};
