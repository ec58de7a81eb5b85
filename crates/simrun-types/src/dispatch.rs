//! Dispatch outcomes reported by execution engines.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What happened when an engine dispatched one built target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum DispatchOutcome {
    /// The target ran to completion in the foreground.
    Completed,
    /// A job was queued with a batch scheduler; completion is not awaited.
    Submitted { job_id: String, script: PathBuf },
    /// A job script was written but not submitted (dry run).
    ScriptWritten { script: PathBuf },
}

impl std::fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Submitted { job_id, .. } => write!(f, "submitted as job {job_id}"),
            Self::ScriptWritten { script } => {
                write!(f, "script written to {}", script.display())
            }
        }
    }
}
