//! Job options: the resource/topology parameters governing one run.

use serde::{Deserialize, Serialize};

use crate::target::Target;

/// Parameter set for one run. Treated as immutable once validation begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOptions {
    pub nodes: i32,
    pub cpus_per_node: i32,
    pub gpus_per_node: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub engine: String,
    pub mode: String,
    #[serde(default)]
    pub targets: Vec<Target>,
}

impl JobOptions {
    /// Email address, if one was given and is not blank.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }

    /// Total MPI ranks requested (`nodes * cpus_per_node`).
    #[must_use]
    pub fn ranks(&self) -> i64 {
        i64::from(self.nodes) * i64::from(self.cpus_per_node)
    }

    #[must_use]
    pub fn uses_gpus(&self) -> bool {
        self.gpus_per_node != 0
    }
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            nodes: 1,
            cpus_per_node: 1,
            gpus_per_node: 0,
            email: None,
            engine: "local".to_string(),
            mode: "release".to_string(),
            targets: Vec::new(),
        }
    }
}
