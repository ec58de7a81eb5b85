//! Command-line job arguments and their resolution against a run profile.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use simrun_engine::config::parser::parse_profile;
use simrun_engine::config::types::{EngineSettings, LauncherKind, RunProfile, SchedulerKind};
use simrun_engine::{Builder, CmakeBuilder, PrebuiltBuilder, RunRequest};
use simrun_types::{JobOptions, Target};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LauncherArg {
    Auto,
    Direct,
    Mpirun,
    Srun,
    Jsrun,
}

impl From<LauncherArg> for LauncherKind {
    fn from(value: LauncherArg) -> Self {
        match value {
            LauncherArg::Auto => Self::Auto,
            LauncherArg::Direct => Self::Direct,
            LauncherArg::Mpirun => Self::Mpirun,
            LauncherArg::Srun => Self::Srun,
            LauncherArg::Jsrun => Self::Jsrun,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchedulerArg {
    Slurm,
    Pbs,
}

impl From<SchedulerArg> for SchedulerKind {
    fn from(value: SchedulerArg) -> Self {
        match value {
            SchedulerArg::Slurm => Self::Slurm,
            SchedulerArg::Pbs => Self::Pbs,
        }
    }
}

/// Arguments shared by `run` and `check`.
#[derive(Debug, Args)]
pub struct JobArgs {
    /// Path to the case file (YAML or JSON)
    pub input: String,
    /// Job name
    #[arg(short = '#', long, default_value = "simrun")]
    pub name: String,
    /// Execution engine (local, batch)
    #[arg(short, long)]
    pub engine: Option<String>,
    /// Build mode forwarded to the build step
    #[arg(short, long)]
    pub mode: Option<String>,
    /// Targets to run, in order ("all" for the default pipeline)
    #[arg(short, long, value_delimiter = ',', num_args = 1..)]
    pub targets: Vec<String>,
    /// Number of nodes
    #[arg(short = 'N', long, allow_negative_numbers = true)]
    pub nodes: Option<i32>,
    /// MPI ranks (CPUs) per node
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub cpus_per_node: Option<i32>,
    /// GPUs per node; must equal CPUs per node when non-zero
    #[arg(short = 'g', long, allow_negative_numbers = true)]
    pub gpus_per_node: Option<i32>,
    /// Email address for job notifications
    #[arg(short = '@', long)]
    pub email: Option<String>,
    /// MPI launcher for the local engine
    #[arg(short = 'b', long, value_enum)]
    pub launcher: Option<LauncherArg>,
    /// Directory containing the installed target binaries
    #[arg(long)]
    pub binary_dir: Option<PathBuf>,
    /// Batch scheduler for the batch engine
    #[arg(long, value_enum)]
    pub scheduler: Option<SchedulerArg>,
    /// Batch walltime (HH:MM:SS)
    #[arg(short, long)]
    pub walltime: Option<String>,
    /// Batch partition / queue
    #[arg(short, long)]
    pub partition: Option<String>,
    /// Batch account to charge
    #[arg(short, long)]
    pub account: Option<String>,
    /// Write batch scripts without submitting them
    #[arg(long)]
    pub dry_run: bool,
    /// Skip building; use the installed binaries
    #[arg(long)]
    pub no_build: bool,
    /// CMake build directory
    #[arg(long)]
    pub build_dir: Option<PathBuf>,
    /// Parallel build jobs
    #[arg(short, long)]
    pub jobs: Option<u32>,
    /// Run profile YAML supplying defaults for any of the options above
    #[arg(long)]
    pub profile: Option<PathBuf>,
}

/// A fully-resolved job: request, engine settings and build choice.
#[derive(Debug)]
pub struct ResolvedJob {
    pub request: RunRequest,
    pub settings: EngineSettings,
    pub no_build: bool,
    pub build_dir: PathBuf,
    pub jobs: Option<u32>,
}

impl ResolvedJob {
    /// Builder selected by `--no-build`.
    pub fn builder(&self) -> Box<dyn Builder> {
        if self.no_build {
            Box::new(PrebuiltBuilder)
        } else {
            Box::new(CmakeBuilder::new(&self.build_dir).with_jobs(self.jobs))
        }
    }
}

impl JobArgs {
    /// Merge explicit flags over the profile (if any) over built-in defaults.
    pub fn resolve(&self) -> Result<ResolvedJob> {
        let profile = match &self.profile {
            Some(path) => parse_profile(path)
                .with_context(|| format!("Failed to load profile: {}", path.display()))?,
            None => RunProfile::default(),
        };
        Ok(self.merge(profile))
    }

    fn merge(&self, profile: RunProfile) -> ResolvedJob {
        let defaults = JobOptions::default();
        let settings_default = EngineSettings::default();

        let options = JobOptions {
            nodes: self.nodes.or(profile.nodes).unwrap_or(defaults.nodes),
            cpus_per_node: self
                .cpus_per_node
                .or(profile.cpus_per_node)
                .unwrap_or(defaults.cpus_per_node),
            gpus_per_node: self
                .gpus_per_node
                .or(profile.gpus_per_node)
                .unwrap_or(defaults.gpus_per_node),
            email: self.email.clone().or(profile.email),
            engine: self.engine.clone().or(profile.engine).unwrap_or(defaults.engine),
            mode: self.mode.clone().or(profile.mode).unwrap_or(defaults.mode),
            targets: self
                .targets
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(Target::new)
                .collect(),
        };

        let settings = EngineSettings {
            launcher: self
                .launcher
                .map(LauncherKind::from)
                .or(profile.launcher)
                .unwrap_or(settings_default.launcher),
            binary_dir: self
                .binary_dir
                .clone()
                .or(profile.binary_dir)
                .unwrap_or(settings_default.binary_dir),
            scheduler: self
                .scheduler
                .map(SchedulerKind::from)
                .or(profile.scheduler)
                .unwrap_or(settings_default.scheduler),
            walltime: self
                .walltime
                .clone()
                .or(profile.walltime)
                .unwrap_or(settings_default.walltime),
            partition: self.partition.clone().or(profile.partition),
            account: self.account.clone().or(profile.account),
            dry_run: self
                .dry_run
                .then_some(true)
                .or(profile.dry_run)
                .unwrap_or(settings_default.dry_run),
        };

        ResolvedJob {
            request: RunRequest {
                input: self.input.clone(),
                job_name: self.name.clone(),
                options,
            },
            settings,
            no_build: self.no_build,
            build_dir: self
                .build_dir
                .clone()
                .or(profile.build_dir)
                .unwrap_or_else(|| PathBuf::from("build")),
            jobs: self.jobs.or(profile.jobs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        job: JobArgs,
    }

    fn parse(args: &[&str]) -> JobArgs {
        TestCli::parse_from(std::iter::once("simrun").chain(args.iter().copied())).job
    }

    #[test]
    fn defaults_without_profile() {
        let job = parse(&["case.yaml"]).merge(RunProfile::default());
        let opts = &job.request.options;
        assert_eq!(opts.engine, "local");
        assert_eq!(opts.mode, "release");
        assert_eq!((opts.nodes, opts.cpus_per_node, opts.gpus_per_node), (1, 1, 0));
        assert!(opts.targets.is_empty());
        assert_eq!(job.request.job_name, "simrun");
        assert_eq!(job.settings, EngineSettings::default());
        assert_eq!(job.build_dir, PathBuf::from("build"));
    }

    #[test]
    fn short_flags_and_comma_targets() {
        let job = parse(&[
            "case.yaml", "-#", "shock", "-e", "batch", "-t", "pre_process,simulation", "-N",
            "2", "-n", "4", "-g", "4", "-@", "user@example.com", "-w", "02:00:00",
        ])
        .merge(RunProfile::default());
        let opts = &job.request.options;
        assert_eq!(job.request.job_name, "shock");
        assert_eq!(opts.engine, "batch");
        assert_eq!(
            opts.targets,
            vec![Target::new("pre_process"), Target::new("simulation")]
        );
        assert_eq!((opts.nodes, opts.cpus_per_node, opts.gpus_per_node), (2, 4, 4));
        assert_eq!(opts.email.as_deref(), Some("user@example.com"));
        assert_eq!(job.settings.walltime, "02:00:00");
    }

    #[test]
    fn negative_counts_reach_validation() {
        let job = parse(&["case.yaml", "-N", "-1"]).merge(RunProfile::default());
        assert_eq!(job.request.options.nodes, -1);
    }

    #[test]
    fn flags_override_profile() {
        let profile = RunProfile {
            engine: Some("batch".into()),
            nodes: Some(8),
            walltime: Some("12:00:00".into()),
            partition: Some("gpu".into()),
            scheduler: Some(SchedulerKind::Pbs),
            ..RunProfile::default()
        };
        let job = parse(&["case.yaml", "-N", "2", "--scheduler", "slurm"]).merge(profile);
        assert_eq!(job.request.options.engine, "batch");
        assert_eq!(job.request.options.nodes, 2);
        assert_eq!(job.settings.walltime, "12:00:00");
        assert_eq!(job.settings.partition.as_deref(), Some("gpu"));
        assert_eq!(job.settings.scheduler, SchedulerKind::Slurm);
    }

    #[test]
    fn launcher_flag_maps_to_kind() {
        let job = parse(&["case.yaml", "-b", "srun", "--no-build"]).merge(RunProfile::default());
        assert_eq!(job.settings.launcher, LauncherKind::Srun);
        assert!(job.no_build);
    }

    #[test]
    fn dry_run_from_profile_or_flag() {
        let profile = RunProfile {
            dry_run: Some(true),
            ..RunProfile::default()
        };
        assert!(parse(&["case.yaml"]).merge(profile).settings.dry_run);
        assert!(parse(&["case.yaml", "--dry-run"])
            .merge(RunProfile::default())
            .settings
            .dry_run);
        assert!(!parse(&["case.yaml"]).merge(RunProfile::default()).settings.dry_run);
    }
}
