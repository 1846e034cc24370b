//! Check config loader (strict parsing).
//!
//! The file is optional: every check runs on defaults when no `--config` is
//! given.

pub mod schema;

use std::fs;
use std::path::Path;

use otelcheck_core::error::{CheckError, Result};

pub use schema::{CheckConfig, CmdbSection, CollectorLaunch, FetchSection, RelaySection};

pub fn load_from_file(path: impl AsRef<Path>) -> Result<CheckConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .map_err(|e| CheckError::Config(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<CheckConfig> {
    let cfg: CheckConfig = serde_yaml::from_str(s)
        .map_err(|e| CheckError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load `path` when given, defaults otherwise.
pub fn load_optional(path: Option<&Path>) -> Result<CheckConfig> {
    match path {
        Some(p) => load_from_file(p),
        None => Ok(CheckConfig::default()),
    }
}
