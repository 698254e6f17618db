//! Step-to-job reconciliation of raw accounting records
//!
//! A job that nominally failed (node failure, requeue) may still have one
//! completed step carrying the real timing. Reconciliation patches such jobs
//! from their steps and keeps only jobs that ended up completed, plus any
//! explicitly allow-listed failures.

use std::collections::{HashMap, HashSet};

use crate::record::{JobRecord, JobState};

/// Completed step records indexed by parent job id.
#[derive(Debug, Default)]
struct StepIndex {
    steps: HashMap<String, JobRecord>,
}

impl StepIndex {
    /// Keep one completed step per job id. When several steps share a parent
    /// the one with the latest end time wins; ties keep the earlier entry.
    fn insert(&mut self, step: JobRecord) {
        let parent = step.parent_id().to_string();
        let replace = match self.steps.get(&parent) {
            Some(current) => step.end > current.end,
            None => true,
        };
        if replace {
            self.steps.insert(parent, step);
        }
    }

    fn get(&self, id: &str) -> Option<&JobRecord> {
        self.steps.get(id)
    }
}

/// Reconcile raw accounting records into the final job list.
///
/// Top-level jobs are kept in first-seen input order; a duplicate row for the
/// same job id replaces the earlier one in place. Jobs whose final state is
/// not completed are dropped unless their id is in `keep_failed`.
///
/// Running this on its own output is a no-op: the output contains no steps
/// and no patchable jobs.
pub fn reconcile(raw: Vec<JobRecord>, keep_failed: &HashSet<String>) -> Vec<JobRecord> {
    let mut steps = StepIndex::default();
    let mut jobs: Vec<JobRecord> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();

    for rec in raw {
        if rec.is_step() {
            if rec.state.is_completed() {
                steps.insert(rec);
            }
        } else {
            match index_of.get(&rec.id) {
                Some(&i) => jobs[i] = rec,
                None => {
                    index_of.insert(rec.id.clone(), jobs.len());
                    jobs.push(rec);
                }
            }
        }
    }

    for job in &mut jobs {
        if job.state.is_completed() {
            continue;
        }
        if let Some(step) = steps.get(&job.id) {
            job.submit = step.submit;
            job.start = step.start;
            job.end = step.end;
            job.state = JobState::Completed;
        }
    }

    jobs.into_iter()
        .filter(|job| job.state.is_completed() || keep_failed.contains(&job.id))
        .collect()
}
