//! otelcheck monitoring plugins.
//!
//! Library side of the three check binaries: the TCP metric relay, the
//! one-shot collector scrape, and the CMDB projection of emitted labels,
//! plus their shared config and CLI plumbing. Integration tests drive the
//! same entry points the binaries use.

pub mod cli;
pub mod cmdb;
pub mod config;
pub mod fetch;
pub mod relay;
