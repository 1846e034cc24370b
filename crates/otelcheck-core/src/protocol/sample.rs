//! Parsed metric sample and its label map.

use std::fmt;

/// Ordered label map (string keys, string values).
///
/// Keeps first-insertion order so rendered lines are deterministic and follow
/// the order labels appeared in the source line. Re-inserting a key replaces
/// the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    pairs: Vec<(String, String)>,
}

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut labels = Labels::new();
        for (k, v) in iter {
            labels.insert(k, v);
        }
        labels
    }
}

/// One metric observation parsed from a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSample {
    pub name: String,
    pub labels: Labels,
    /// Numeric text, passed through untouched.
    pub value: String,
    pub timestamp_millis: i64,
}

impl MetricSample {
    /// Whole seconds, truncated toward zero.
    pub fn timestamp_secs(&self) -> i64 {
        self.timestamp_millis / 1000
    }
}

/// Renders the sample in line protocol: `name[;k=v...] value timestamp_s`.
impl fmt::Display for MetricSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (k, v) in self.labels.iter() {
            write!(f, ";{k}={v}")?;
        }
        write!(f, " {} {}", self.value, self.timestamp_secs())
    }
}
