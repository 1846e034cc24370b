//! otelcheck core: metric line formats, sample model, and the shared error type.
//!
//! This crate holds the pure, transport-free pieces used by every check
//! program: the exposition-to-line-protocol codec, the line protocol parser,
//! and `CheckError`. It carries no runtime dependencies so the conversions can
//! be tested and reused without tokio.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Every malformed
//! metric line surfaces as `CheckError::MalformedLine` so callers can skip it
//! and keep processing the rest of a scrape or batch.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{CheckError, ErrorKind, Result};
pub use protocol::{Labels, MetricSample};
