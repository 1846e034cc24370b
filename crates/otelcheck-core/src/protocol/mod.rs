//! Metric line formats.
//!
//! Two textual conventions meet here:
//! - Exposition: `name{k="v",...} value timestamp_ms` as scraped from the
//!   collector's Prometheus exporter.
//! - Line protocol: `name;k=v;... value timestamp_s` as consumed by the
//!   monitoring pipeline and re-read by CI projection.
//!
//! Both parsers are total: malformed input is reported as
//! `CheckError::MalformedLine`, never a panic.

pub mod exposition;
pub mod line;
pub mod sample;

pub use sample::{Labels, MetricSample};
