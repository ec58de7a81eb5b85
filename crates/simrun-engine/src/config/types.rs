//! Run profile types: defaults for job and engine settings loaded from YAML.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// MPI launcher used by the local engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LauncherKind {
    /// Pick the first of `jsrun`, `srun`, `mpirun` found on `PATH`.
    #[default]
    Auto,
    /// Run the binary without an MPI launcher.
    Direct,
    Mpirun,
    Srun,
    Jsrun,
}

impl LauncherKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Direct => "direct",
            Self::Mpirun => "mpirun",
            Self::Srun => "srun",
            Self::Jsrun => "jsrun",
        }
    }
}

impl std::fmt::Display for LauncherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Batch scheduler flavour used by the batch engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerKind {
    #[default]
    Slurm,
    Pbs,
}

impl SchedulerKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slurm => "slurm",
            Self::Pbs => "pbs",
        }
    }

    /// Submission command for this scheduler.
    #[must_use]
    pub fn submit_command(self) -> &'static str {
        match self {
            Self::Slurm => "sbatch",
            Self::Pbs => "qsub",
        }
    }
}

impl std::fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine-specific settings. Each engine reads only the fields it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub launcher: LauncherKind,
    /// Directory holding the installed target binaries.
    pub binary_dir: PathBuf,
    pub scheduler: SchedulerKind,
    pub walltime: String,
    pub partition: Option<String>,
    pub account: Option<String>,
    /// Write batch scripts without submitting them.
    pub dry_run: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            launcher: LauncherKind::Auto,
            binary_dir: PathBuf::from("build/install/bin"),
            scheduler: SchedulerKind::Slurm,
            walltime: "01:00:00".to_string(),
            partition: None,
            account: None,
            dry_run: false,
        }
    }
}

/// Defaults loaded from a profile file. Every field is optional; explicit
/// command-line values take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunProfile {
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub nodes: Option<i32>,
    #[serde(default)]
    pub cpus_per_node: Option<i32>,
    #[serde(default)]
    pub gpus_per_node: Option<i32>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub launcher: Option<LauncherKind>,
    #[serde(default)]
    pub binary_dir: Option<PathBuf>,
    #[serde(default)]
    pub scheduler: Option<SchedulerKind>,
    #[serde(default)]
    pub walltime: Option<String>,
    #[serde(default)]
    pub partition: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub dry_run: Option<bool>,
    #[serde(default)]
    pub build_dir: Option<PathBuf>,
    #[serde(default)]
    pub jobs: Option<u32>,
}
