//! Invocation of the SLURM `sacct` accounting command
//!
//! Builds the query argv, runs the command once (blocking), and parses its
//! stdout into `JobRecord`s. One known-benign stderr warning is swallowed;
//! everything else on stderr is fatal and surfaced verbatim.

use anyhow::{bail, Context, Result};
use std::process::Command;
use tracing::debug;

use crate::record::{self, JobRecord};

/// Accounting fields requested from sacct, in parse order
pub const FIELDS: &str = "jobid,jobname,nnodes,submit,start,end,state";

/// Row delimiter passed to `--delimiter`. `|` rather than `,` so job names
/// containing commas cannot corrupt the record stream.
pub const DELIMITER: char = '|';

/// sacct emits this warning for jobs with duplicate terminal records; the
/// data is still usable, so it is the one stderr message that is ignored.
const BENIGN_WARNING: &str = "Conflicting JOB_TERMINATED record (COMPLETED)";

/// Which jobs the accounting query covers
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Comma-separated users; all users when neither users nor jobs is set
    pub users: Option<String>,
    /// Comma-separated job ids; takes precedence over `users`
    pub jobs: Option<String>,
    /// Comma-separated job ids to query even though they failed
    pub failed: Option<String>,
}

/// Build the sacct argument vector for a selection.
pub fn build_args(selection: &Selection) -> Vec<String> {
    let mut argv = vec![format!("--format={FIELDS}")];

    match (&selection.jobs, &selection.users) {
        (Some(jobs), _) => {
            let spec = match &selection.failed {
                Some(failed) => format!("{jobs},{failed}"),
                None => jobs.clone(),
            };
            argv.push(format!("--jobs={spec}"));
        }
        (None, Some(users)) => argv.push(format!("--user={users}")),
        (None, None) => argv.push("--allusers".to_string()),
    }

    // Completed jobs and node failures are always queried; node failures may
    // have completed after rescheduling. Failed jobs only when allow-listed.
    if selection.failed.is_some() {
        argv.push("--state=CD,NF,F".to_string());
    } else {
        argv.push("--state=CD,NF".to_string());
    }

    argv.push(format!("--delimiter={DELIMITER}"));
    argv.push("--noheader".to_string());
    argv.push("--parsable2".to_string());
    argv
}

/// Decide whether stderr output from the accounting command is fatal.
fn check_stderr(stderr: &str) -> Result<()> {
    if stderr.trim().is_empty() {
        return Ok(());
    }
    if stderr.contains(BENIGN_WARNING) {
        debug!("ignoring accounting warning: {}", stderr.trim());
        return Ok(());
    }
    bail!("accounting command reported: {}", stderr.trim());
}

/// Run the accounting command and parse its output.
pub fn query(command: &str, selection: &Selection) -> Result<Vec<JobRecord>> {
    let args = build_args(selection);
    debug!("running {} {}", command, args.join(" "));

    let output = Command::new(command)
        .args(&args)
        .output()
        .with_context(|| format!("failed to run accounting command {command:?}"))?;

    check_stderr(&String::from_utf8_lossy(&output.stderr))?;
    if !output.status.success() {
        bail!("accounting command exited with {}", output.status);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let records = record::parse_records(&stdout, DELIMITER)?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_all_users() {
        let args = build_args(&Selection::default());
        assert!(args.contains(&"--allusers".to_string()));
        assert!(args.contains(&"--state=CD,NF".to_string()));
        assert!(args.contains(&"--noheader".to_string()));
        assert!(args.contains(&"--parsable2".to_string()));
        assert!(args.contains(&"--delimiter=|".to_string()));
    }

    #[test]
    fn test_build_args_users() {
        let selection = Selection {
            users: Some("alice,bob".to_string()),
            ..Default::default()
        };
        let args = build_args(&selection);
        assert!(args.contains(&"--user=alice,bob".to_string()));
        assert!(!args.iter().any(|a| a == "--allusers"));
    }

    #[test]
    fn test_build_args_jobs_take_precedence() {
        let selection = Selection {
            users: Some("alice".to_string()),
            jobs: Some("100,101".to_string()),
            failed: None,
        };
        let args = build_args(&selection);
        assert!(args.contains(&"--jobs=100,101".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--user=")));
    }

    #[test]
    fn test_build_args_failed_allowlist_extends_jobs_and_states() {
        let selection = Selection {
            users: None,
            jobs: Some("100".to_string()),
            failed: Some("200,201".to_string()),
        };
        let args = build_args(&selection);
        assert!(args.contains(&"--jobs=100,200,201".to_string()));
        assert!(args.contains(&"--state=CD,NF,F".to_string()));
    }

    #[test]
    fn test_check_stderr_empty_ok() {
        assert!(check_stderr("").is_ok());
        assert!(check_stderr("  \n").is_ok());
    }

    #[test]
    fn test_check_stderr_benign_warning_swallowed() {
        let stderr = "sacct: Conflicting JOB_TERMINATED record (COMPLETED) for job 42\n";
        assert!(check_stderr(stderr).is_ok());
    }

    #[test]
    fn test_check_stderr_other_output_fatal() {
        let err = check_stderr("sacct: error: Invalid user").unwrap_err();
        assert!(err.to_string().contains("Invalid user"));
    }

    #[test]
    fn test_query_missing_command_fails() {
        let result = query("/nonexistent/sacct-binary", &Selection::default());
        assert!(result.is_err());
    }
}
