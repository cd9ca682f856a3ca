//! Top-level facade crate for rightsgate.
//!
//! Re-exports the data model and the policy engine so users can depend on a single crate.

pub mod core {
    pub use rightsgate_core::*;
}

pub mod engine {
    pub use rightsgate_engine::*;
}
