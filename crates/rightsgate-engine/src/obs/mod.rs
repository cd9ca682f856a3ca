//! Observability: structured logging setup and lightweight in-process metrics.
//!
//! Metrics are stored as atomics and rendered in Prometheus text format by
//! whoever embeds the engine.

pub mod logging;
pub mod metrics;

pub use metrics::EngineMetrics;
