//! Wire types: check-result batch in, IRE payload out.

use serde::{Deserialize, Serialize};

pub const SERVICE_CLASS: &str = "cmdb_ci_service_discovered";
pub const DEPENDS_ON: &str = "Depends on::Used by";

/// One entry of the check-result batch. Only `check.output` is consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckResult {
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    pub check: CheckOutput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckOutput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub output: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IrePayload {
    pub items: Vec<CiItem>,
    pub relations: Vec<CiRelation>,
}

impl IrePayload {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.relations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CiItem {
    #[serde(rename = "className")]
    pub class_name: String,
    pub values: CiValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CiValues {
    pub name: String,
    pub sys_class_name: String,
    pub short_description: String,
}

impl CiItem {
    /// Discovered service named after a label value.
    pub fn service(name: &str, metric: &str) -> Self {
        Self {
            class_name: SERVICE_CLASS.to_string(),
            values: CiValues {
                name: name.to_string(),
                sys_class_name: SERVICE_CLASS.to_string(),
                short_description: format!("Created based on metric: {metric}"),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.values.name
    }
}

/// Directed edge between two items, by index into `IrePayload::items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CiRelation {
    pub parent: usize,
    pub child: usize,
    #[serde(rename = "type")]
    pub rel_type: String,
}
