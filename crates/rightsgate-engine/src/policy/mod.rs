//! Decision logic: condition evaluation, applicability, effects and the
//! engine that folds them together.

pub mod applicability;
pub mod condition;
pub mod effect;
pub mod engine;

pub use crate::config::schema::RegexMode;
pub use engine::PolicyEngine;
