//! Accounting records parsed from the cluster scheduler's output
//!
//! One `JobRecord` per accounting row. Rows come in a fixed field order
//! (jobid, jobname, nnodes, submit, start, end, state); the delimiter is a
//! parameter so the parser stays agnostic to how the rows were produced.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Timestamp format used by the accounting log (second resolution, local time)
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Number of fields in an accounting row
pub const FIELD_COUNT: usize = 7;

/// Errors for malformed accounting rows
///
/// Any parsing defect is a hard failure naming the offending input; rows are
/// never silently skipped.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("malformed record: expected {FIELD_COUNT} fields, got {actual}: {line:?}")]
    FieldCount { actual: usize, line: String },

    #[error("malformed record: invalid node count {value:?}: {source}")]
    NodeCount {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("malformed record: invalid {field} timestamp {value:?}: {source}")]
    Timestamp {
        field: &'static str,
        value: String,
        source: chrono::ParseError,
    },

    #[error("malformed record {id:?}: start {start} is after end {end}")]
    StartAfterEnd {
        id: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

pub type Result<T> = std::result::Result<T, RecordError>;

/// Terminal state of an accounting entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Completed,
    NodeFail,
    Failed,
    Other(String),
}

impl JobState {
    /// Parse a state field. States may carry a detail suffix
    /// ("CANCELLED by 1234"); only the first word counts.
    pub fn parse(text: &str) -> Self {
        let word = text.split_whitespace().next().unwrap_or("");
        match word {
            "COMPLETED" => JobState::Completed,
            "NODE_FAIL" => JobState::NodeFail,
            "FAILED" => JobState::Failed,
            other => JobState::Other(other.to_string()),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, JobState::Completed)
    }
}

/// One accounting entry for a scheduled batch job or a step within one
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    /// Job id; step ids carry a `.` suffix ("1234.0", "1234.batch")
    pub id: String,
    /// Job name as submitted to the scheduler
    pub name: String,
    /// Number of allocated nodes
    pub nodes: u64,
    pub submit: NaiveDateTime,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub state: JobState,
}

impl JobRecord {
    /// Parse one delimited accounting row.
    pub fn parse_line(line: &str, delimiter: char) -> Result<Self> {
        let fields: Vec<&str> = line.trim().split(delimiter).collect();
        if fields.len() != FIELD_COUNT {
            return Err(RecordError::FieldCount {
                actual: fields.len(),
                line: line.to_string(),
            });
        }

        let nodes = fields[2]
            .trim()
            .parse::<u64>()
            .map_err(|source| RecordError::NodeCount {
                value: fields[2].to_string(),
                source,
            })?;

        let submit = parse_timestamp("submit", fields[3])?;
        let start = parse_timestamp("start", fields[4])?;
        let end = parse_timestamp("end", fields[5])?;
        if start > end {
            return Err(RecordError::StartAfterEnd {
                id: fields[0].to_string(),
                start,
                end,
            });
        }

        Ok(Self {
            id: fields[0].to_string(),
            name: fields[1].to_string(),
            nodes,
            submit,
            start,
            end,
            state: JobState::parse(fields[6]),
        })
    }

    /// Whether this entry is a step (sub-task) rather than a top-level job.
    pub fn is_step(&self) -> bool {
        self.id.contains('.')
    }

    /// Job id with any step suffix removed.
    pub fn parent_id(&self) -> &str {
        self.id.split('.').next().unwrap_or(&self.id)
    }

    /// Wall-clock duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64
    }
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIME_FORMAT).map_err(|source| {
        RecordError::Timestamp {
            field,
            value: value.to_string(),
            source,
        }
    })
}

/// Parse a block of accounting output, one record per non-empty line.
pub fn parse_records(text: &str, delimiter: char) -> Result<Vec<JobRecord>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| JobRecord::parse_line(line, delimiter))
        .collect()
}
