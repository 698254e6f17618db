//! Contiguous bucket spans per label, for shaded plot regions

use std::collections::BTreeMap;

/// Collect, per label, the maximal runs of bucket indices where it appears.
///
/// Runs split only where consecutive indices differ by more than one, so a
/// single missing bucket still splits while an unbroken sequence never does.
/// Spans are inclusive on both ends and ordered; labels are ordered too.
pub fn label_spans(bucket_labels: &[Vec<String>]) -> BTreeMap<String, Vec<(usize, usize)>> {
    let mut indices: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, labels) in bucket_labels.iter().enumerate() {
        for label in labels {
            let entry = indices.entry(label.clone()).or_default();
            if entry.last() != Some(&idx) {
                entry.push(idx);
            }
        }
    }

    indices
        .into_iter()
        .map(|(label, idxs)| (label, runs(&idxs)))
        .collect()
}

/// Split a sorted index list into inclusive (start, end) runs.
fn runs(sorted: &[usize]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let Some((&first, rest)) = sorted.split_first() else {
        return out;
    };
    let mut start = first;
    let mut prev = first;
    for &idx in rest {
        if idx - prev > 1 {
            out.push((start, prev));
            start = idx;
        }
        prev = idx;
    }
    out.push((start, prev));
    out
}
