//! Policy data model.
//!
//! - `policy`: persisted records and their compiled form.
//! - `condition`: field/operator/value tests and AND/OR chaining.
//! - `effect`: effect payload with quota, rate-limit and time-window hints.
//! - `context`: per-request input and the decision output.
//! - `value`: the dynamic value variant shared by all of the above.
//!
//! Decoding of stored JSON never panics; malformed blobs surface as
//! `RightsGateError::MalformedPolicy` so a single bad rule can be skipped.

pub mod condition;
pub mod context;
pub mod effect;
pub mod policy;
pub mod value;

pub use condition::{decode_conditions, Condition, Logic, Operator};
pub use context::{PolicyContext, PolicyResult, NO_APPLICABLE_POLICIES, OUTSIDE_TIME_WINDOW};
pub use effect::{decode_effect, Effect, QuotaLimit, QuotaPeriod, RateLimit, TimeWindow};
pub use policy::{Policy, PolicyRecord, PolicyType};
pub use value::DynamicValue;
