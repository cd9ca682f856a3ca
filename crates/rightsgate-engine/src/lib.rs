//! rightsgate engine library entry.
//!
//! Wires the policy store, the per-tenant cache, the decision logic and the
//! audit seam into a [`PolicyEngine`]. Consumed by the `rightsgate` binary
//! and by integration tests.

pub mod audit;
pub mod config;
pub mod obs;
pub mod policy;
pub mod store;

pub use policy::PolicyEngine;
