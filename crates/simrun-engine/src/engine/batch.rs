//! Batch engine: writes a job script per target and submits it to a
//! SLURM or PBS queue. Submission returns as soon as the job is queued.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use anyhow::{bail, Context};
use regex::Regex;
use simrun_types::{DispatchOutcome, JobOptions, Target};

use super::script::{parse_job_id, JobScript};
use super::{absolute, Engine, EngineContext, EngineFactory};
use crate::config::types::{EngineSettings, SchedulerKind};
use crate::error::{ConfigError, DispatchError, Result, RunError};

const NAME: &str = "batch";

static WALLTIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+:[0-5][0-9]:[0-5][0-9]$").expect("valid walltime regex"));

// Job names end up in script file names and scheduler directives.
static JOB_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid job name regex"));

pub struct BatchEngineFactory {
    scheduler: SchedulerKind,
    walltime: String,
    partition: Option<String>,
    account: Option<String>,
    binary_dir: PathBuf,
    dry_run: bool,
}

impl BatchEngineFactory {
    #[must_use]
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            scheduler: settings.scheduler,
            walltime: settings.walltime.trim().to_string(),
            partition: non_blank(settings.partition.as_deref()),
            account: non_blank(settings.account.as_deref()),
            binary_dir: settings.binary_dir.clone(),
            dry_run: settings.dry_run,
        }
    }
}

impl EngineFactory for BatchEngineFactory {
    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&self, ctx: &EngineContext<'_>) -> Result<Box<dyn Engine>> {
        let binary_dir = absolute(&self.binary_dir).map_err(|cause| RunError::EngineInit {
            engine: NAME,
            cause,
        })?;

        Ok(Box::new(BatchEngine {
            scheduler: self.scheduler,
            job_name: ctx.job_name.trim().to_string(),
            walltime: self.walltime.clone(),
            partition: self.partition.clone(),
            account: self.account.clone(),
            email: ctx.options.email().map(str::to_string),
            nodes: ctx.options.nodes,
            cpus_per_node: ctx.options.cpus_per_node,
            gpus_per_node: ctx.options.gpus_per_node,
            case_dir: ctx.input.case_dir().to_path_buf(),
            binary_dir,
            dry_run: self.dry_run,
            submit_program: PathBuf::from(self.scheduler.submit_command()),
        }))
    }
}

/// Initialized batch engine.
#[derive(Debug, Clone)]
pub struct BatchEngine {
    scheduler: SchedulerKind,
    job_name: String,
    walltime: String,
    partition: Option<String>,
    account: Option<String>,
    email: Option<String>,
    nodes: i32,
    cpus_per_node: i32,
    gpus_per_node: i32,
    case_dir: PathBuf,
    binary_dir: PathBuf,
    dry_run: bool,
    submit_program: PathBuf,
}

impl BatchEngine {
    /// Script parameters for `target`.
    #[must_use]
    pub fn job_script(&self, target: &Target) -> JobScript {
        let job_name = format!("{}-{}", self.job_name, target);
        JobScript {
            scheduler: self.scheduler,
            output: self.case_dir.join(format!("{job_name}.out")),
            job_name,
            nodes: self.nodes,
            tasks_per_node: self.cpus_per_node,
            gpus_per_node: self.gpus_per_node,
            walltime: self.walltime.clone(),
            partition: self.partition.clone(),
            account: self.account.clone(),
            email: self.email.clone(),
            workdir: self.case_dir.clone(),
            binary: self.binary_dir.join(target.as_str()),
        }
    }

    /// Where the script for `target` is written.
    #[must_use]
    pub fn script_path(&self, target: &Target) -> PathBuf {
        self.case_dir.join(format!("{}-{}.sh", self.job_name, target))
    }

    fn submit(&self, script: &Path) -> anyhow::Result<String> {
        let program = self.submit_program.display();
        let output = Command::new(&self.submit_program)
            .arg(script)
            .current_dir(&self.case_dir)
            .output()
            .with_context(|| format!("failed to run {program}"))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            bail!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        parse_job_id(self.scheduler, &stdout)
            .with_context(|| format!("could not find a job id in {program} output: {}", stdout.trim()))
    }
}

impl Engine for BatchEngine {
    fn name(&self) -> &'static str {
        NAME
    }

    fn validate_job_options(&self, _options: &JobOptions) -> std::result::Result<(), ConfigError> {
        if !WALLTIME_RE.is_match(&self.walltime) {
            return Err(ConfigError::engine(
                NAME,
                format!("walltime must be HH:MM:SS (got '{}')", self.walltime),
            ));
        }
        if !JOB_NAME_RE.is_match(&self.job_name) || self.job_name.contains("..") {
            return Err(ConfigError::engine(
                NAME,
                format!(
                    "job name may only use letters, digits, '_', '-' and single dots (got '{}')",
                    self.job_name
                ),
            ));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "Scheduler           {}\n\
             Nodes         (-N)  {}\n\
             CPUs (/node)  (-n)  {}\n\
             GPUs (/node)  (-g)  {}\n\
             Walltime      (-w)  {}\n\
             Partition     (-p)  {}\n\
             Account       (-a)  {}\n\
             Email         (-@)  {}\n\
             Dry Run             {}",
            self.scheduler,
            self.nodes,
            self.cpus_per_node,
            self.gpus_per_node,
            self.walltime,
            self.partition.as_deref().unwrap_or("none"),
            self.account.as_deref().unwrap_or("none"),
            self.email.as_deref().unwrap_or("none"),
            self.dry_run,
        )
    }

    fn dispatch(&self, target: &Target) -> std::result::Result<DispatchOutcome, DispatchError> {
        if !target.is_file_name() {
            return Err(DispatchError::new(
                target,
                anyhow::anyhow!("target name '{target}' cannot be used in a script file name"),
            ));
        }
        let script = self.script_path(target);
        std::fs::write(&script, self.job_script(target).render())
            .with_context(|| format!("failed to write job script {}", script.display()))
            .map_err(|cause| DispatchError::new(target, cause))?;

        if self.dry_run {
            tracing::info!(target = %target, script = %script.display(), "Dry run, not submitting");
            return Ok(DispatchOutcome::ScriptWritten { script });
        }

        let job_id = self
            .submit(&script)
            .map_err(|cause| DispatchError::new(target, cause))?;
        tracing::info!(
            target = %target,
            scheduler = %self.scheduler,
            job_id = %job_id,
            "Submitted job"
        );
        Ok(DispatchOutcome::Submitted { job_id, script })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
