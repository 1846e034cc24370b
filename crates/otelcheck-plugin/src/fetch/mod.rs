//! One-shot scrape of the collector's Prometheus exporter.
//!
//! `FetchClient` issues a single GET and converts the body through the
//! exposition codec. `DependencyGuard` is the narrow seam for making sure the
//! collector process is up before that GET; process-table lookups stay behind
//! it.

pub mod client;
pub mod guard;

pub use client::{convert_body, fetch_with_guard, FetchClient};
pub use guard::{DependencyGuard, NoopGuard, ProcessGuard};
