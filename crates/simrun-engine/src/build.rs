//! Target builders.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context, Result};
use simrun_types::Target;

/// Per-run build parameters.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub mode: &'a str,
}

/// Compiles and links one named target, synchronously.
pub trait Builder {
    /// # Errors
    ///
    /// Returns an error if the target failed to build.
    fn build_target(&self, ctx: &BuildContext<'_>, target: &Target) -> Result<()>;
}

/// Builds targets through `cmake --build`.
#[derive(Debug, Clone)]
pub struct CmakeBuilder {
    program: PathBuf,
    build_dir: PathBuf,
    jobs: Option<u32>,
}

impl CmakeBuilder {
    #[must_use]
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("cmake"),
            build_dir: build_dir.into(),
            jobs: None,
        }
    }

    #[must_use]
    pub fn with_jobs(mut self, jobs: Option<u32>) -> Self {
        self.jobs = jobs.filter(|&j| j > 0);
        self
    }

    /// Arguments passed to `cmake` for `target`.
    #[must_use]
    pub fn args(&self, ctx: &BuildContext<'_>, target: &Target) -> Vec<String> {
        let mut args = vec![
            "--build".to_string(),
            self.build_dir.to_string_lossy().into_owned(),
            "--target".to_string(),
            target.to_string(),
            "--config".to_string(),
            ctx.mode.to_string(),
        ];
        if let Some(jobs) = self.jobs {
            args.push("--parallel".to_string());
            args.push(jobs.to_string());
        }
        args
    }
}

impl Builder for CmakeBuilder {
    fn build_target(&self, ctx: &BuildContext<'_>, target: &Target) -> Result<()> {
        let args = self.args(ctx, target);
        tracing::info!(target = %target, mode = ctx.mode, "Building");

        let program = self.program.display();
        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .with_context(|| format!("failed to run {program}"))?;
        if !status.success() {
            bail!("{program} {} exited with {status}", args.join(" "));
        }
        Ok(())
    }
}

/// Skips building; binaries are expected to be installed already.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrebuiltBuilder;

impl Builder for PrebuiltBuilder {
    fn build_target(&self, _ctx: &BuildContext<'_>, target: &Target) -> Result<()> {
        tracing::info!(target = %target, "Build skipped, using installed binary");
        Ok(())
    }
}
