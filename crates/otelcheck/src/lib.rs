//! Top-level facade crate for otelcheck.
//!
//! Re-exports the line formats and the check plugin library so users can
//! depend on a single crate.

pub mod core {
    pub use otelcheck_core::*;
}

pub mod plugin {
    pub use otelcheck_plugin::*;
}
