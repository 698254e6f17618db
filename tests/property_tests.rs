//! Property-based tests for the aggregation core
//!
//! Covers the invariants that must hold for any input: histogram shape and
//! index bounds, the cross-check between bucket totals and node-hours,
//! reconciliation idempotence, classification fallbacks, and span splitting.

use chrono::NaiveDateTime;
use proptest::prelude::*;
use std::collections::HashSet;

use uso::category::CategoryMap;
use uso::histogram::UsageHistogram;
use uso::record::{JobRecord, JobState};
use uso::reconcile::reconcile;
use uso::spans::label_spans;

fn ts(secs: i64) -> NaiveDateTime {
    let base = NaiveDateTime::parse_from_str("2023-01-01T00:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
    base + chrono::Duration::seconds(secs)
}

fn job(id: &str, start: i64, end: i64, nodes: u64, state: JobState) -> JobRecord {
    JobRecord {
        id: id.to_string(),
        name: format!("job_{id}"),
        nodes,
        submit: ts(start),
        start: ts(start),
        end: ts(end),
        state,
    }
}

/// Random completed jobs with ordered spans.
fn jobs_strategy() -> impl Strategy<Value = Vec<JobRecord>> {
    prop::collection::vec((0i64..200_000, 0i64..200_000, 0u64..64), 1..40).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (a, b, nodes))| {
                let (start, end) = if a <= b { (a, b) } else { (b, a) };
                job(&i.to_string(), start, end, nodes, JobState::Completed)
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_histogram_bucket_count_equals_resolution(
        records in jobs_strategy(),
        resolution in 1usize..300,
    ) {
        let labels = vec!["x".to_string(); records.len()];
        let hist = UsageHistogram::build(&records, &labels, resolution).unwrap();

        prop_assert_eq!(hist.resolution(), resolution);
        prop_assert_eq!(hist.midpoints_hours().len(), resolution);
    }

    #[test]
    fn prop_histogram_totals_track_node_hours(
        records in jobs_strategy(),
        resolution in 1usize..300,
    ) {
        // Bucketing quantizes each job span to whole buckets, so the
        // integrated bucket totals match the exact node-seconds to within
        // one bucket width per record end.
        let labels = vec!["x".to_string(); records.len()];
        let hist = UsageHistogram::build(&records, &labels, resolution).unwrap();

        let step = hist.step_secs();
        let bucket_node_secs: f64 =
            hist.node_counts().iter().map(|&n| n as f64 * step).sum();
        let exact_node_secs: f64 = records
            .iter()
            .map(|r| r.duration_secs() * r.nodes as f64)
            .sum();
        let tolerance: f64 = records
            .iter()
            .map(|r| 2.0 * step * r.nodes as f64)
            .sum::<f64>()
            + 1e-6;

        prop_assert!((bucket_node_secs - exact_node_secs).abs() <= tolerance);
    }

    #[test]
    fn prop_bucket_totals_are_consistent_with_labels(
        records in jobs_strategy(),
        resolution in 1usize..100,
    ) {
        // Each record carries a distinct label, so a bucket's node total
        // must equal the summed node counts of the records labeled into it.
        let labels: Vec<String> = (0..records.len()).map(|i| i.to_string()).collect();
        let hist = UsageHistogram::build(&records, &labels, resolution).unwrap();

        for bucket in hist.buckets() {
            let expected: u64 = bucket
                .labels
                .iter()
                .map(|label| {
                    let idx: usize = label.parse().unwrap();
                    records[idx].nodes
                })
                .sum();
            prop_assert_eq!(bucket.nodes, expected);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_reconcile_is_idempotent(
        specs in prop::collection::vec(
            (0u8..12, prop::bool::ANY, 0i64..10_000, 0i64..10_000, 0u8..4),
            0..30,
        ),
    ) {
        let raw: Vec<JobRecord> = specs
            .into_iter()
            .map(|(id, is_step, a, b, state)| {
                let (start, end) = if a <= b { (a, b) } else { (b, a) };
                let id = if is_step {
                    format!("{id}.0")
                } else {
                    id.to_string()
                };
                let state = match state {
                    0 => JobState::Completed,
                    1 => JobState::NodeFail,
                    2 => JobState::Failed,
                    _ => JobState::Other("CANCELLED".to_string()),
                };
                job(&id, start, end, 1, state)
            })
            .collect();
        let keep: HashSet<String> = ["3".to_string()].into_iter().collect();

        let once = reconcile(raw, &keep);
        let twice = reconcile(once.clone(), &keep);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_unmatched_names_fall_back_to_unknown(name in "[A-Za-z0-9_]{0,24}") {
        let map = CategoryMap::from_pairs([("zzzz", "zeta")]).unwrap();
        prop_assume!(!name.starts_with("zzzz"));
        prop_assert_eq!(map.classify(&name).unwrap(), "unknown");
    }

    #[test]
    fn prop_double_matches_are_always_ambiguous(suffix in "[a-z0-9]{0,12}") {
        let map = CategoryMap::from_pairs([("ab", "first"), ("abc", "second")]).unwrap();
        let name = format!("abc{suffix}");
        prop_assert!(map.classify(&name).is_err());
    }

    #[test]
    fn prop_spans_cover_indices_and_split_on_gaps(
        indices in prop::collection::btree_set(0usize..120, 0..40),
    ) {
        let mut buckets = vec![Vec::new(); 120];
        for &idx in &indices {
            buckets[idx].push("x".to_string());
        }
        let spans = label_spans(&buckets);

        if indices.is_empty() {
            prop_assert!(spans.is_empty());
            return Ok(());
        }
        let runs = &spans["x"];

        // Every index is inside exactly one span and endpoints are members.
        for &idx in &indices {
            let containing = runs
                .iter()
                .filter(|&&(start, end)| start <= idx && idx <= end)
                .count();
            prop_assert_eq!(containing, 1);
        }
        for &(start, end) in runs {
            prop_assert!(indices.contains(&start));
            prop_assert!(indices.contains(&end));
            prop_assert!(start <= end);
        }

        // Consecutive spans are separated by a gap wider than one bucket.
        for pair in runs.windows(2) {
            prop_assert!(pair[1].0 > pair[0].1 + 1);
        }
    }
}
