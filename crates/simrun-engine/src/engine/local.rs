//! Local engine: runs targets in the foreground on this machine.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context};
use simrun_types::{DispatchOutcome, JobOptions, Target};

use super::{absolute, on_path, Engine, EngineContext, EngineFactory};
use crate::config::types::{EngineSettings, LauncherKind};
use crate::error::{ConfigError, DispatchError, Result, RunError};

const NAME: &str = "local";

/// Launchers probed by [`LauncherKind::Auto`], in preference order.
const AUTO_PROBE: [LauncherKind; 3] = [LauncherKind::Jsrun, LauncherKind::Srun, LauncherKind::Mpirun];

/// Resolve `Auto` to the first launcher `available` reports, or `Direct`.
/// Explicit choices are returned unchanged.
pub fn resolve_launcher(kind: LauncherKind, available: impl Fn(&str) -> bool) -> LauncherKind {
    if kind != LauncherKind::Auto {
        return kind;
    }
    AUTO_PROBE
        .into_iter()
        .find(|launcher| available(launcher.as_str()))
        .unwrap_or(LauncherKind::Direct)
}

pub struct LocalEngineFactory {
    launcher: LauncherKind,
    binary_dir: PathBuf,
}

impl LocalEngineFactory {
    #[must_use]
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            launcher: settings.launcher,
            binary_dir: settings.binary_dir.clone(),
        }
    }
}

impl EngineFactory for LocalEngineFactory {
    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&self, ctx: &EngineContext<'_>) -> Result<Box<dyn Engine>> {
        let launcher = resolve_launcher(self.launcher, on_path);
        let binary_dir = absolute(&self.binary_dir).map_err(|cause| RunError::EngineInit {
            engine: NAME,
            cause,
        })?;

        tracing::debug!(
            requested = %self.launcher,
            resolved = %launcher,
            binary_dir = %binary_dir.display(),
            "Resolved local launcher"
        );

        Ok(Box::new(LocalEngine {
            launcher,
            binary_dir,
            case_dir: ctx.input.case_dir().to_path_buf(),
            nodes: ctx.options.nodes,
            cpus_per_node: ctx.options.cpus_per_node,
            gpus_per_node: ctx.options.gpus_per_node,
        }))
    }
}

/// Initialized local engine. The launcher is never `Auto`.
#[derive(Debug, Clone)]
pub struct LocalEngine {
    launcher: LauncherKind,
    binary_dir: PathBuf,
    case_dir: PathBuf,
    nodes: i32,
    cpus_per_node: i32,
    gpus_per_node: i32,
}

impl LocalEngine {
    #[must_use]
    pub fn launcher(&self) -> LauncherKind {
        self.launcher
    }

    /// Full argument vector used to run `target`.
    #[must_use]
    pub fn command_line(&self, target: &Target) -> Vec<String> {
        let ranks = i64::from(self.nodes) * i64::from(self.cpus_per_node);
        let mut argv: Vec<String> = match self.launcher {
            LauncherKind::Auto | LauncherKind::Direct => Vec::new(),
            LauncherKind::Mpirun => vec!["mpirun".into(), "-np".into(), ranks.to_string()],
            LauncherKind::Srun => vec![
                "srun".into(),
                "--nodes".into(),
                self.nodes.to_string(),
                "--ntasks-per-node".into(),
                self.cpus_per_node.to_string(),
            ],
            LauncherKind::Jsrun => vec![
                "jsrun".into(),
                "--nrs".into(),
                ranks.to_string(),
                "--cpu_per_rs".into(),
                "1".into(),
                "--gpu_per_rs".into(),
                (if self.gpus_per_node > 0 { "1" } else { "0" }).into(),
                "--tasks_per_rs".into(),
                "1".into(),
            ],
        };
        argv.push(
            self.binary_dir
                .join(target.as_str())
                .to_string_lossy()
                .into_owned(),
        );
        argv
    }
}

impl Engine for LocalEngine {
    fn name(&self) -> &'static str {
        NAME
    }

    fn validate_job_options(&self, options: &JobOptions) -> std::result::Result<(), ConfigError> {
        match self.launcher {
            LauncherKind::Auto | LauncherKind::Direct => {
                if options.nodes != 1 {
                    return Err(ConfigError::engine(
                        NAME,
                        format!(
                            "running without an MPI launcher requires exactly one node (got {})",
                            options.nodes
                        ),
                    ));
                }
                if options.cpus_per_node != 1 {
                    return Err(ConfigError::engine(
                        NAME,
                        format!(
                            "running without an MPI launcher requires exactly one CPU (got {})",
                            options.cpus_per_node
                        ),
                    ));
                }
                if options.uses_gpus() {
                    return Err(ConfigError::engine(
                        NAME,
                        format!(
                            "running without an MPI launcher cannot use GPUs (got {} per node)",
                            options.gpus_per_node
                        ),
                    ));
                }
            }
            LauncherKind::Mpirun => {
                if options.nodes != 1 {
                    return Err(ConfigError::engine(
                        NAME,
                        format!(
                            "mpirun runs on this host only; request one node or use srun/jsrun (got {})",
                            options.nodes
                        ),
                    ));
                }
            }
            LauncherKind::Srun | LauncherKind::Jsrun => {}
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "MPI Launcher  (-b)  {}\nBinaries            {}",
            self.launcher,
            self.binary_dir.display()
        )
    }

    fn dispatch(&self, target: &Target) -> std::result::Result<DispatchOutcome, DispatchError> {
        let argv = self.command_line(target);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| DispatchError::new(target, anyhow::anyhow!("empty command line")))?;

        tracing::info!(target = %target, command = %argv.join(" "), "Launching");

        let run = || -> anyhow::Result<()> {
            let status = Command::new(program)
                .args(args)
                .current_dir(&self.case_dir)
                .status()
                .with_context(|| format!("failed to launch {program}"))?;
            if !status.success() {
                bail!("{} exited with {status}", argv.join(" "));
            }
            Ok(())
        };
        run().map_err(|cause| DispatchError::new(target, cause))?;

        Ok(DispatchOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(launcher: LauncherKind, nodes: i32, cpus: i32, gpus: i32) -> LocalEngine {
        LocalEngine {
            launcher,
            binary_dir: PathBuf::from("/opt/sim/bin"),
            case_dir: PathBuf::from("/cases/shock"),
            nodes,
            cpus_per_node: cpus,
            gpus_per_node: gpus,
        }
    }

    fn options(nodes: i32, cpus: i32, gpus: i32) -> JobOptions {
        JobOptions {
            nodes,
            cpus_per_node: cpus,
            gpus_per_node: gpus,
            ..JobOptions::default()
        }
    }

    #[test]
    fn auto_prefers_jsrun_then_srun_then_mpirun() {
        assert_eq!(resolve_launcher(LauncherKind::Auto, |_| true), LauncherKind::Jsrun);
        assert_eq!(
            resolve_launcher(LauncherKind::Auto, |p| p != "jsrun"),
            LauncherKind::Srun
        );
        assert_eq!(
            resolve_launcher(LauncherKind::Auto, |p| p == "mpirun"),
            LauncherKind::Mpirun
        );
        assert_eq!(resolve_launcher(LauncherKind::Auto, |_| false), LauncherKind::Direct);
    }

    #[test]
    fn explicit_launcher_not_probed() {
        assert_eq!(
            resolve_launcher(LauncherKind::Mpirun, |_| panic!("must not probe")),
            LauncherKind::Mpirun
        );
    }

    #[test]
    fn direct_command_is_binary_only() {
        let argv = engine(LauncherKind::Direct, 1, 1, 0).command_line(&Target::new("pre_process"));
        assert_eq!(argv, vec!["/opt/sim/bin/pre_process"]);
    }

    #[test]
    fn mpirun_command_uses_total_ranks() {
        let argv = engine(LauncherKind::Mpirun, 1, 8, 0).command_line(&Target::new("simulation"));
        assert_eq!(argv, vec!["mpirun", "-np", "8", "/opt/sim/bin/simulation"]);
    }

    #[test]
    fn srun_command_uses_topology() {
        let argv = engine(LauncherKind::Srun, 2, 4, 0).command_line(&Target::new("simulation"));
        assert_eq!(
            argv,
            vec![
                "srun",
                "--nodes",
                "2",
                "--ntasks-per-node",
                "4",
                "/opt/sim/bin/simulation"
            ]
        );
    }

    #[test]
    fn jsrun_command_binds_gpus() {
        let argv = engine(LauncherKind::Jsrun, 2, 6, 6).command_line(&Target::new("simulation"));
        assert_eq!(&argv[..3], ["jsrun", "--nrs", "12"]);
        assert!(argv.windows(2).any(|w| w == ["--gpu_per_rs", "1"]));
    }

    #[test]
    fn direct_rejects_multiple_ranks_and_gpus() {
        let e = engine(LauncherKind::Direct, 1, 1, 0);
        assert!(e.validate_job_options(&options(1, 1, 0)).is_ok());
        assert!(e.validate_job_options(&options(2, 1, 0)).is_err());
        assert!(e.validate_job_options(&options(1, 4, 0)).is_err());
        let err = e.validate_job_options(&options(1, 1, 1)).unwrap_err();
        assert!(err.to_string().contains("GPUs"), "got: {err}");
    }

    #[test]
    fn mpirun_rejects_multiple_nodes() {
        let e = engine(LauncherKind::Mpirun, 1, 4, 0);
        assert!(e.validate_job_options(&options(1, 4, 0)).is_ok());
        let err = e.validate_job_options(&options(2, 4, 0)).unwrap_err();
        assert!(matches!(err, ConfigError::Engine { engine: "local", .. }));
    }

    #[test]
    fn srun_accepts_multi_node_gpu_jobs() {
        let e = engine(LauncherKind::Srun, 4, 4, 4);
        assert!(e.validate_job_options(&options(4, 4, 4)).is_ok());
    }

    #[test]
    fn describe_reports_launcher() {
        let text = engine(LauncherKind::Srun, 1, 1, 0).describe();
        assert!(text.contains("srun"));
        assert!(text.contains("/opt/sim/bin"));
    }

    #[test]
    fn dispatch_missing_binary_fails() {
        let dir = tempfile::tempdir().unwrap();
        let e = LocalEngine {
            launcher: LauncherKind::Direct,
            binary_dir: dir.path().join("bin"),
            case_dir: dir.path().to_path_buf(),
            nodes: 1,
            cpus_per_node: 1,
            gpus_per_node: 0,
        };
        let err = e.dispatch(&Target::new("simulation")).unwrap_err();
        assert_eq!(err.target, Target::new("simulation"));
        assert!(format!("{:#}", err.cause).contains("failed to launch"));
    }

    #[cfg(unix)]
    #[test]
    fn dispatch_nonzero_exit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        crate::testing::write_executable(&bin, "simulation", "exit 3");
        let e = LocalEngine {
            launcher: LauncherKind::Direct,
            binary_dir: bin,
            case_dir: dir.path().to_path_buf(),
            nodes: 1,
            cpus_per_node: 1,
            gpus_per_node: 0,
        };

        let err = e.dispatch(&Target::new("simulation")).unwrap_err();
        assert_eq!(err.target, Target::new("simulation"));
        let msg = format!("{:#}", err.cause);
        assert!(msg.contains("exited with"), "got: {msg}");
        assert!(msg.contains('3'), "got: {msg}");
    }

    #[cfg(unix)]
    #[test]
    fn dispatch_runs_in_case_dir() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        crate::testing::write_executable(&bin, "pre_process", "touch ran.marker");
        let e = LocalEngine {
            launcher: LauncherKind::Direct,
            binary_dir: bin,
            case_dir: dir.path().to_path_buf(),
            nodes: 1,
            cpus_per_node: 1,
            gpus_per_node: 0,
        };

        let outcome = e.dispatch(&Target::new("pre_process")).unwrap();
        assert_eq!(outcome, DispatchOutcome::Completed);
        assert!(dir.path().join("ran.marker").exists());
    }
}
