//! Campaign summary statistics
//!
//! Node-hours and per-category aggregates over the reconciled record set,
//! plus the equivalent figures recomputed from a histogram data file in
//! replot mode. All reported values are rounded to two decimals per key, so
//! a sum of reported per-category values need not equal the reported total.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::record::JobRecord;

const SECS_PER_HOUR: f64 = 3600.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Total node-hours: node count integrated over each job's duration.
pub fn total_node_hours(records: &[JobRecord]) -> f64 {
    let node_secs: f64 = records
        .iter()
        .map(|rec| rec.duration_secs() * rec.nodes as f64)
        .sum();
    round2(node_secs / SECS_PER_HOUR)
}

/// Node-hours per category, each value rounded independently.
///
/// Every category in `categories` appears in the result, zero when unused.
pub fn category_node_hours(
    records: &[JobRecord],
    labels: &[String],
    categories: &[String],
) -> BTreeMap<String, f64> {
    accumulate(records, labels, categories, |rec| {
        rec.duration_secs() * rec.nodes as f64
    })
}

/// Elapsed hours per category, ignoring node counts.
pub fn category_elapsed_hours(
    records: &[JobRecord],
    labels: &[String],
    categories: &[String],
) -> BTreeMap<String, f64> {
    accumulate(records, labels, categories, JobRecord::duration_secs)
}

fn accumulate(
    records: &[JobRecord],
    labels: &[String],
    categories: &[String],
    term_secs: impl Fn(&JobRecord) -> f64,
) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> =
        categories.iter().map(|c| (c.clone(), 0.0)).collect();
    for (rec, label) in records.iter().zip(labels) {
        *totals.entry(label.clone()).or_insert(0.0) += term_secs(rec) / SECS_PER_HOUR;
    }
    totals
        .into_iter()
        .map(|(category, hours)| (category, round2(hours)))
        .collect()
}

/// Total node-hours recomputed from histogram midpoints and node totals.
/// Buckets are equally spaced, so the step is the midpoint difference.
pub fn series_node_hours(times_hours: &[f64], nodes: &[u64]) -> f64 {
    if times_hours.len() < 2 {
        return 0.0;
    }
    let dt = times_hours[1] - times_hours[0];
    let total: f64 = nodes.iter().map(|&n| n as f64 * dt).sum();
    round2(total)
}

/// Elapsed hours per category recomputed from per-bucket labels: each
/// occurrence of a label contributes one bucket width.
pub fn series_elapsed_hours(
    times_hours: &[f64],
    bucket_labels: &[Vec<String>],
) -> BTreeMap<String, f64> {
    if times_hours.len() < 2 {
        return BTreeMap::new();
    }
    let dt = times_hours[1] - times_hours[0];
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for labels in bucket_labels {
        for label in labels {
            *totals.entry(label.clone()).or_insert(0.0) += dt;
        }
    }
    totals
        .into_iter()
        .map(|(category, hours)| (category, round2(hours)))
        .collect()
}

/// The printed campaign summary
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_node_hours: f64,
    /// Per-category node-hours; `None` in replot mode, where per-record node
    /// counts are no longer available
    pub node_hours: Option<BTreeMap<String, f64>>,
    pub elapsed_hours: BTreeMap<String, f64>,
}

impl Summary {
    /// Compute the summary from reconciled records and their labels.
    pub fn compute(records: &[JobRecord], labels: &[String], categories: &[String]) -> Self {
        Self {
            total_node_hours: total_node_hours(records),
            node_hours: Some(category_node_hours(records, labels, categories)),
            elapsed_hours: category_elapsed_hours(records, labels, categories),
        }
    }

    /// Recompute the summary from histogram data (replot mode).
    pub fn from_series(times_hours: &[f64], nodes: &[u64], bucket_labels: &[Vec<String>]) -> Self {
        Self {
            total_node_hours: series_node_hours(times_hours, nodes),
            node_hours: None,
            elapsed_hours: series_elapsed_hours(times_hours, bucket_labels),
        }
    }

    /// Render the aligned text summary.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "total node-hours: {:.2}", self.total_node_hours);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:<16} {:>12} {:>12}",
            "category", "node-hours", "elapsed-h"
        );
        let _ = writeln!(
            out,
            "{:<16} {:>12} {:>12}",
            "----------------", "------------", "------------"
        );

        let mut categories: Vec<&String> = self.elapsed_hours.keys().collect();
        if let Some(node_hours) = &self.node_hours {
            for key in node_hours.keys() {
                if !categories.contains(&key) {
                    categories.push(key);
                }
            }
            categories.sort();
        }

        for category in categories {
            let node_text = match &self.node_hours {
                Some(map) => map
                    .get(category)
                    .map(|v| format!("{v:.2}"))
                    .unwrap_or_default(),
                None => String::new(),
            };
            let elapsed_text = self
                .elapsed_hours
                .get(category)
                .map(|v| format!("{v:.2}"))
                .unwrap_or_default();
            let _ = writeln!(out, "{category:<16} {node_text:>12} {elapsed_text:>12}");
        }
        out
    }
}
