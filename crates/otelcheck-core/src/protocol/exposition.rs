//! Prometheus exposition line -> line protocol conversion.
//!
//! Parsing rules:
//! - Fields are whitespace separated: `metric[{labels}] value timestamp_ms`.
//!   Fewer than three fields is malformed; anything after the third is ignored.
//! - Label pairs split on the first `=` only, so extra `=` stay in the value.
//! - Double quotes are removed from label values.
//! - The timestamp is integer milliseconds and is rendered as whole seconds.

use crate::error::{CheckError, Result};
use crate::protocol::sample::{Labels, MetricSample};

/// Parse one exposition line. The metric name is returned as written.
pub fn parse(line: &str) -> Result<MetricSample> {
    let mut fields = line.split_whitespace();
    let (Some(metric), Some(value), Some(ts)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(CheckError::MalformedLine(format!(
            "expected `metric value timestamp`: {line}"
        )));
    };

    let (name, labels) = match metric.split_once('{') {
        Some((name, rest)) => {
            let inner = rest.strip_suffix('}').unwrap_or(rest);
            (name, parse_labels(inner)?)
        }
        None => (metric, Labels::new()),
    };

    let timestamp_millis: i64 = ts
        .parse()
        .map_err(|_| CheckError::MalformedLine(format!("invalid timestamp `{ts}`: {line}")))?;

    Ok(MetricSample {
        name: name.to_string(),
        labels,
        value: value.to_string(),
        timestamp_millis,
    })
}

fn parse_labels(inner: &str) -> Result<Labels> {
    let mut labels = Labels::new();
    if inner.is_empty() {
        return Ok(labels);
    }
    for pair in inner.split(',') {
        let (k, v) = pair
            .split_once('=')
            .ok_or_else(|| CheckError::MalformedLine(format!("label without `=`: {pair}")))?;
        labels.insert(k, v.replace('"', ""));
    }
    Ok(labels)
}

/// `otelcol_process_uptime` -> `otelcol-process.uptime`.
///
/// Every `_` becomes `.`, then only the first `.` becomes `-`.
pub fn dotted_name(raw: &str) -> String {
    raw.replace('_', ".").replacen('.', "-", 1)
}

/// Convert one exposition line into one line protocol line.
pub fn convert(line: &str) -> Result<String> {
    let mut sample = parse(line)?;
    sample.name = dotted_name(&sample.name);
    Ok(sample.to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn name_rules() {
        assert_eq!(dotted_name("cpu_load"), "cpu-load");
        assert_eq!(dotted_name("system_cpu_load_average_15m"), "system-cpu.load.average.15m");
        assert_eq!(dotted_name("up"), "up");
        assert_eq!(dotted_name("already.dotted_name"), "already-dotted.name");
    }

    #[test]
    fn parse_keeps_raw_name_and_millis() {
        let s = parse(r#"cpu_load{core="0"} 0.33 1722967059000"#).unwrap();
        assert_eq!(s.name, "cpu_load");
        assert_eq!(s.labels.get("core"), Some("0"));
        assert_eq!(s.timestamp_millis, 1_722_967_059_000);
    }

    #[test]
    fn missing_timestamp_is_malformed() {
        let err = parse("cpu_load 0.33").unwrap_err();
        assert_eq!(err.kind().as_str(), "MALFORMED_LINE");
        assert!(!err.is_fatal());
    }

    #[test]
    fn label_without_equals_is_malformed() {
        assert!(convert("m{broken} 1 1000").is_err());
    }

    #[test]
    fn empty_label_block() {
        assert_eq!(convert("m_x{} 1 1000").unwrap(), "m-x 1 1");
    }
}
