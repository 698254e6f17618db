//! Job-name classification into code categories
//!
//! Job names are matched against an ordered set of anchored prefix patterns
//! supplied by a JSON mapping file (or the built-in defaults). A name that
//! matches nothing is "unknown"; a name that matches more than one pattern is
//! a configuration defect and always a fatal error, never silently resolved.

use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::record::JobRecord;

/// Fallback category for names that match no configured pattern
pub const UNKNOWN: &str = "unknown";

/// Built-in prefix mapping used when no mapping file is given
const DEFAULT_MAPPING: &[(&str, &str)] = &[
    ("Wi", "singleFrame"),
    ("Co", "singleFrame"),
    ("mo", "mosaic"),
    ("co", "coadd"),
    ("mt", "multiband"),
];

/// Errors for category mapping configuration and classification
#[derive(Error, Debug)]
pub enum CategoryError {
    #[error("ambiguous mapping: job name {name:?} matches patterns [{}]", .patterns.join(", "))]
    Ambiguous { name: String, patterns: Vec<String> },

    #[error("invalid mapping pattern {pattern:?}: {source}")]
    Pattern { pattern: String, source: regex::Error },

    #[error("failed to read mapping file {path:?}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("mapping file {path:?} is not a JSON object of strings: {source}")]
    Format { path: String, source: serde_json::Error },
}

pub type Result<T> = std::result::Result<T, CategoryError>;

/// Ordered mapping from job-name prefix patterns to category names
#[derive(Debug)]
pub struct CategoryMap {
    /// (pattern text, anchored matcher, category), in configuration order
    entries: Vec<(String, Regex, String)>,
}

impl CategoryMap {
    /// Build a map from (pattern, category) pairs. Patterns match from the
    /// start of the name, like the accounting tool's prefix conventions.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut entries = Vec::new();
        for (pattern, category) in pairs {
            let pattern = pattern.into();
            let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|source| {
                CategoryError::Pattern {
                    pattern: pattern.clone(),
                    source,
                }
            })?;
            entries.push((pattern, regex, category.into()));
        }
        Ok(Self { entries })
    }

    /// The built-in mapping.
    pub fn defaults() -> Result<Self> {
        Self::from_pairs(DEFAULT_MAPPING.iter().copied())
    }

    /// Load a mapping from a JSON object file of pattern -> category.
    ///
    /// A user-supplied "un" key is discarded; "unknown" is always the
    /// fallback and never a configurable target.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| CategoryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let raw: BTreeMap<String, String> =
            serde_json::from_str(&text).map_err(|source| CategoryError::Format {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_pairs(raw.into_iter().filter(|(pattern, _)| pattern != "un"))
    }

    /// Classify one job name.
    pub fn classify(&self, name: &str) -> Result<&str> {
        let matches: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, (_, regex, _))| regex.is_match(name))
            .map(|(i, _)| i)
            .collect();

        match matches.as_slice() {
            [] => Ok(UNKNOWN),
            [single] => Ok(self.entries[*single].2.as_str()),
            many => {
                let mut patterns: Vec<String> = many
                    .iter()
                    .map(|&i| self.entries[i].0.clone())
                    .collect();
                patterns.sort();
                Err(CategoryError::Ambiguous {
                    name: name.to_string(),
                    patterns,
                })
            }
        }
    }

    /// Classify every record, one label per record in input order.
    pub fn classify_all(&self, records: &[JobRecord]) -> Result<Vec<String>> {
        records
            .iter()
            .map(|rec| self.classify(&rec.name).map(str::to_string))
            .collect()
    }

    /// Distinct category names, sorted, always including the fallback.
    /// Used to pre-seed summary tables so unused categories report as zero.
    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .map(|(_, _, category)| category.clone())
            .collect();
        names.push(UNKNOWN.to_string());
        names.sort();
        names.dedup();
        names
    }
}
