//! JSON output for the campaign summary

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::summary::Summary;

/// Machine-readable campaign summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    /// Histogram resolution used for the run
    pub resolution: usize,
    /// Bucket width in seconds
    pub bucket_step_secs: f64,
    /// Total node-hours, rounded to 2 decimals
    pub total_node_hours: f64,
    /// Node-hours per category (absent in replot mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_node_hours: Option<BTreeMap<String, f64>>,
    /// Elapsed hours per category
    pub category_elapsed_hours: BTreeMap<String, f64>,
}

impl JsonSummary {
    /// Build the JSON document from a computed summary.
    pub fn new(summary: &Summary, resolution: usize, bucket_step_secs: f64) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "uso-summary-v1".to_string(),
            resolution,
            bucket_step_secs,
            total_node_hours: summary.total_node_hours,
            category_node_hours: summary.node_hours.clone(),
            category_elapsed_hours: summary.elapsed_hours.clone(),
        }
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
