//! Planner configuration

use serde::{Deserialize, Serialize};

/// Tunables passed explicitly to catalog sync and planning.
///
/// Every field has a default, so an empty YAML document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerConfig {
    /// Row limit applied when the request has none (or asks for 0)
    pub default_limit: u32,
    /// Hard ceiling on any requested limit
    pub max_limit: u32,
    /// Longest output column alias; Postgres truncates identifiers at 63 bytes
    pub max_alias_len: usize,
    /// Schema used for snapshot tables registered without a dataset
    pub default_schema: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_limit: 1000,
            max_limit: 5000,
            max_alias_len: 63,
            default_schema: "public".to_string(),
        }
    }
}

impl PlannerConfig {
    /// Effective LIMIT for a requested value
    pub fn effective_limit(&self, requested: Option<u32>) -> u32 {
        match requested {
            None | Some(0) => self.default_limit.min(self.max_limit),
            Some(n) => n.min(self.max_limit),
        }
    }
}
