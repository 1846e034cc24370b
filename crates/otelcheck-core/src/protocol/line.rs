//! Line protocol parsing: `name[;k=v;k=v...] value timestamp_s`.
//!
//! This is the already-converted form found in check outputs. Labels are
//! `;` separated here, unlike the `{k="v",...}` block of the exposition
//! format. Rendering lives on `MetricSample`'s `Display` impl.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{CheckError, Result};
use crate::protocol::sample::{Labels, MetricSample};

const LINE_PATTERN: &str = r"^([^ ;]+)(;[^ ]+)? ([^ ]+) ([^ ]+)$";

fn line_regex() -> Result<&'static Regex> {
    static RE: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(LINE_PATTERN))
        .as_ref()
        .map_err(|e| CheckError::MalformedLine(format!("line pattern failed to compile: {e}")))
}

/// Name and labels of a line, without the value or timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub name: String,
    pub labels: Labels,
}

struct Fields<'a> {
    name: &'a str,
    labels: Labels,
    value: &'a str,
    ts: &'a str,
}

fn split_fields(line: &str) -> Result<Fields<'_>> {
    let caps = line_regex()?
        .captures(line)
        .ok_or_else(|| CheckError::MalformedLine(line.to_string()))?;

    let labels: Labels = caps
        .get(2)
        .and_then(|m| m.as_str().strip_prefix(';'))
        .unwrap_or_default()
        .split(';')
        .filter_map(|piece| piece.split_once('='))
        .collect();

    Ok(Fields {
        name: caps.get(1).map(|m| m.as_str()).unwrap_or_default(),
        labels,
        value: caps.get(3).map(|m| m.as_str()).unwrap_or_default(),
        ts: caps.get(4).map(|m| m.as_str()).unwrap_or_default(),
    })
}

/// Parse one line protocol line.
///
/// Label pieces without `=` are ignored; a value keeps everything after the
/// first `=`. The timestamp must be whole seconds.
pub fn parse(line: &str) -> Result<MetricSample> {
    let line = line.trim_end_matches('\r');
    let f = split_fields(line)?;

    let timestamp_millis = f
        .ts
        .parse::<i64>()
        .ok()
        .and_then(|secs| secs.checked_mul(1000))
        .ok_or_else(|| CheckError::MalformedLine(format!("invalid timestamp `{}`: {line}", f.ts)))?;

    Ok(MetricSample {
        name: f.name.to_string(),
        labels: f.labels,
        value: f.value.to_string(),
        timestamp_millis,
    })
}

/// Like [`parse`], but only the line's shape is checked; the value and
/// timestamp tokens are not interpreted.
pub fn parse_series(line: &str) -> Result<Series> {
    let f = split_fields(line.trim_end_matches('\r'))?;
    Ok(Series {
        name: f.name.to_string(),
        labels: f.labels,
    })
}

/// Parse every line of a check output, dropping the ones that do not match.
pub fn parse_output(output: &str) -> impl Iterator<Item = MetricSample> + '_ {
    output.split('\n').filter_map(|line| skip_unparsable(line, parse(line)))
}

/// Series of every line of a check output that has the line protocol shape.
pub fn parse_series_output(output: &str) -> impl Iterator<Item = Series> + '_ {
    output
        .split('\n')
        .filter_map(|line| skip_unparsable(line, parse_series(line)))
}

fn skip_unparsable<T>(line: &str, parsed: Result<T>) -> Option<T> {
    match parsed {
        Ok(v) => Some(v),
        Err(e) => {
            if !line.is_empty() {
                tracing::debug!(error = %e, "skipping unparsable output line");
            }
            None
        }
    }
}
