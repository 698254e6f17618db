//! Text data-file round trip for the usage histogram
//!
//! One line per bucket: midpoint time in seconds, node total, and an
//! optional comma-joined label list. Written after a full pipeline run and
//! read back in replot mode, so a campaign can be re-rendered without
//! touching the accounting log again.

use std::fmt::Write as _;

use thiserror::Error;

use crate::histogram::UsageHistogram;
use crate::plot::PlotSeries;

/// Errors for data-file parsing
#[derive(Error, Debug)]
pub enum DataFileError {
    #[error("data file line {line}: expected `<secs> <nodes> [labels]`, got {text:?}")]
    Malformed { line: usize, text: String },

    #[error("data file contains no buckets")]
    Empty,
}

/// Render a histogram to the data-file text format.
pub fn render(histogram: &UsageHistogram) -> String {
    let mut out = String::new();
    let midpoints = histogram.midpoints_hours();
    for (bucket, midpoint_hours) in histogram.buckets().iter().zip(midpoints) {
        let secs = midpoint_hours * 3600.0;
        if bucket.labels.is_empty() {
            let _ = writeln!(out, "{secs:.1} {}", bucket.nodes);
        } else {
            let _ = writeln!(out, "{secs:.1} {} {}", bucket.nodes, bucket.labels.join(","));
        }
    }
    out
}

/// Parse a data file back into a plottable series. Times are converted from
/// seconds to hours on the way in.
pub fn parse(text: &str) -> Result<PlotSeries, DataFileError> {
    let mut times_hours = Vec::new();
    let mut nodes = Vec::new();
    let mut labels = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(time_text), Some(node_text)) = (fields.next(), fields.next()) else {
            return Err(DataFileError::Malformed {
                line: number + 1,
                text: line.to_string(),
            });
        };
        let malformed = || DataFileError::Malformed {
            line: number + 1,
            text: line.to_string(),
        };
        let secs: f64 = time_text.parse().map_err(|_| malformed())?;
        let count: u64 = node_text.parse().map_err(|_| malformed())?;

        times_hours.push(secs / 3600.0);
        nodes.push(count);
        labels.push(match fields.next() {
            Some(list) => list.split(',').map(str::to_string).collect(),
            None => Vec::new(),
        });
    }

    if times_hours.is_empty() {
        return Err(DataFileError::Empty);
    }
    Ok(PlotSeries {
        times_hours,
        nodes,
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::UsageHistogram;
    use crate::record::{JobRecord, JobState, TIME_FORMAT};
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIME_FORMAT).unwrap()
    }

    fn histogram() -> UsageHistogram {
        let records = vec![JobRecord {
            id: "1".to_string(),
            name: "coaddDriver".to_string(),
            nodes: 3,
            submit: ts("2023-01-01T00:00:00"),
            start: ts("2023-01-01T00:00:00"),
            end: ts("2023-01-01T02:00:00"),
            state: JobState::Completed,
        }];
        UsageHistogram::build(&records, &["coadd".to_string()], 2).unwrap()
    }

    #[test]
    fn test_render_format() {
        let text = render(&histogram());
        assert_eq!(text, "1800.0 3 coadd\n5400.0 3 coadd\n");
    }

    #[test]
    fn test_round_trip() {
        let hist = histogram();
        let series = parse(&render(&hist)).unwrap();
        assert_eq!(series.times_hours, vec![0.5, 1.5]);
        assert_eq!(series.nodes, vec![3, 3]);
        assert_eq!(series.labels[0], vec!["coadd".to_string()]);
    }

    #[test]
    fn test_parse_empty_label_column() {
        let series = parse("1800.0 0\n5400.0 2 coadd,mosaic\n").unwrap();
        assert!(series.labels[0].is_empty());
        assert_eq!(series.labels[1].len(), 2);
    }

    #[test]
    fn test_parse_malformed_line() {
        let err = parse("1800.0\n").unwrap_err();
        assert!(matches!(err, DataFileError::Malformed { line: 1, .. }));
    }

    #[test]
    fn test_parse_bad_number() {
        let err = parse("abc 2\n").unwrap_err();
        assert!(matches!(err, DataFileError::Malformed { .. }));
    }

    #[test]
    fn test_parse_empty_file() {
        assert!(matches!(parse(""), Err(DataFileError::Empty)));
        assert!(matches!(parse("\n  \n"), Err(DataFileError::Empty)));
    }
}
