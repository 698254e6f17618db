//! Fixed-resolution node-occupancy histogram
//!
//! The campaign's time range [min start, max end] is divided into
//! `resolution` equal buckets. Each job adds its node count to every bucket
//! in the half-open range its span covers and tags those buckets with its
//! classified label.

use thiserror::Error;

use crate::record::JobRecord;

/// Errors for histogram construction
#[derive(Error, Debug, PartialEq)]
pub enum HistogramError {
    #[error("no accounting records to aggregate")]
    NoRecords,

    #[error("histogram resolution must be at least 1")]
    ZeroResolution,

    #[error("need one label per record: {records} records, {labels} labels")]
    LabelMismatch { records: usize, labels: usize },
}

/// One fixed-width time interval of the histogram
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bucket {
    /// Sum of node counts of jobs active in this interval
    pub nodes: u64,
    /// Labels of those jobs, in record order; duplicates mean two jobs of
    /// the same category overlapped here
    pub labels: Vec<String>,
}

/// Node occupancy over the campaign's time range
#[derive(Debug, Clone)]
pub struct UsageHistogram {
    step_secs: f64,
    buckets: Vec<Bucket>,
}

impl UsageHistogram {
    /// Build the histogram from reconciled records and their labels.
    ///
    /// Fails on an empty record set or zero resolution rather than producing
    /// degenerate bucket boundaries. A campaign where every job is
    /// instantaneous (min start == max end) yields an all-zero histogram.
    pub fn build(
        records: &[JobRecord],
        labels: &[String],
        resolution: usize,
    ) -> Result<Self, HistogramError> {
        if resolution == 0 {
            return Err(HistogramError::ZeroResolution);
        }
        if records.is_empty() {
            return Err(HistogramError::NoRecords);
        }
        if records.len() != labels.len() {
            return Err(HistogramError::LabelMismatch {
                records: records.len(),
                labels: labels.len(),
            });
        }

        let t0 = records
            .iter()
            .map(|rec| rec.start)
            .min()
            .ok_or(HistogramError::NoRecords)?;
        let t1 = records
            .iter()
            .map(|rec| rec.end)
            .max()
            .ok_or(HistogramError::NoRecords)?;
        let step_secs = (t1 - t0).num_seconds() as f64 / resolution as f64;

        let mut buckets = vec![Bucket::default(); resolution];
        for (rec, label) in records.iter().zip(labels) {
            let begin = (rec.start - t0).num_seconds() as f64;
            let end = (rec.end - t0).num_seconds() as f64;
            let (first, bound) = bucket_range(begin, end, step_secs, resolution);
            for bucket in buckets[first..bound].iter_mut() {
                bucket.nodes += rec.nodes;
                bucket.labels.push(label.clone());
            }
        }

        Ok(Self { step_secs, buckets })
    }

    /// Bucket width in seconds.
    pub fn step_secs(&self) -> f64 {
        self.step_secs
    }

    /// Number of buckets; always equals the requested resolution.
    pub fn resolution(&self) -> usize {
        self.buckets.len()
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Node totals per bucket.
    pub fn node_counts(&self) -> Vec<u64> {
        self.buckets.iter().map(|bucket| bucket.nodes).collect()
    }

    /// Label lists per bucket.
    pub fn bucket_labels(&self) -> Vec<Vec<String>> {
        self.buckets.iter().map(|b| b.labels.clone()).collect()
    }

    /// Bucket midpoint times in hours since the campaign start.
    pub fn midpoints_hours(&self) -> Vec<f64> {
        (0..self.buckets.len())
            .map(|k| self.step_secs * (k as f64 + 0.5) / 3600.0)
            .collect()
    }
}

/// Half-open bucket range [first, bound) covered by a job spanning
/// [begin, end) seconds from the campaign start.
///
/// A job whose end falls exactly on the campaign end would floor to index
/// `resolution`; the bound is clamped so no index past `resolution - 1` is
/// ever produced, and floating-point drift cannot push it further.
fn bucket_range(begin: f64, end: f64, step: f64, resolution: usize) -> (usize, usize) {
    if step <= 0.0 || end <= begin {
        return (0, 0);
    }
    let first = ((begin / step).floor() as usize).min(resolution - 1);
    let bound = ((end / step).floor() as usize).min(resolution);
    (first, bound.max(first))
}
