//! Run orchestrator: load input, resolve and initialize the engine, report
//! the configuration, validate, then build and dispatch each target in order.
//!
//! Any failure aborts the run immediately; nothing is retried and no target
//! after a failing one is touched.

use std::path::PathBuf;

use simrun_types::target::format_targets;
use simrun_types::{DispatchOutcome, JobOptions, Target};

use crate::build::{BuildContext, Builder};
use crate::config::validator::validate_job_options;
use crate::console::Console;
use crate::engine::{Engine, EngineContext, EngineRegistry};
use crate::error::{Result, RunError};
use crate::input::{InputFile, InputLoader};

/// Parameters of one orchestrated run, as surfaced by the command line.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Path of the case input; surrounding whitespace is ignored.
    pub input: String,
    pub job_name: String,
    pub options: JobOptions,
}

/// Result of [`RunOrchestrator::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// Nothing was requested; no input was loaded and no engine touched.
    NoTargets,
    /// Every enumerated target was built and dispatched.
    Completed {
        engine: &'static str,
        dispatched: Vec<(Target, DispatchOutcome)>,
    },
}

/// Result of [`RunOrchestrator::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckReport {
    /// Nothing was requested, so nothing was loaded or validated.
    NoTargets,
    /// The job is valid for `engine` and would run `targets`.
    Valid {
        engine: &'static str,
        targets: Vec<Target>,
    },
}

struct Prepared {
    input: Box<dyn InputFile>,
    engine: Box<dyn Engine>,
}

/// Drives one run against its collaborators.
pub struct RunOrchestrator<'a> {
    engines: &'a EngineRegistry,
    loader: &'a dyn InputLoader,
    builder: &'a dyn Builder,
    console: &'a Console,
}

impl<'a> RunOrchestrator<'a> {
    pub fn new(
        engines: &'a EngineRegistry,
        loader: &'a dyn InputLoader,
        builder: &'a dyn Builder,
        console: &'a Console,
    ) -> Self {
        Self {
            engines,
            loader,
            builder,
            console,
        }
    }

    /// Execute the full pipeline for `request`.
    ///
    /// # Errors
    ///
    /// Returns the first [`RunError`] raised; remaining targets are skipped.
    pub fn run(&self, request: &RunRequest) -> Result<RunReport> {
        let span = tracing::info_span!("run", job = %request.job_name);
        let _entered = span.enter();

        self.console.print("Run:");
        let _run_scope = self.console.scope();

        if request.options.targets.is_empty() {
            self.console.print("> No target selected.");
            tracing::info!("No target selected, nothing to do");
            return Ok(RunReport::NoTargets);
        }

        let Prepared {
            mut input,
            engine,
        } = self.prepare(request)?;

        validate_job_options(&request.options, engine.as_ref())?;
        tracing::info!(engine = engine.name(), "Job options validated");

        let ctx = BuildContext {
            mode: &request.options.mode,
        };
        let mut dispatched = Vec::new();
        for target in engine.enumerate_targets(&request.options.targets) {
            let outcome = self.run_target(&ctx, input.as_mut(), engine.as_ref(), &target)?;
            dispatched.push((target, outcome));
        }

        tracing::info!(targets = dispatched.len(), "Run complete");
        Ok(RunReport::Completed {
            engine: engine.name(),
            dispatched,
        })
    }

    /// Load, initialize, report and validate without building or dispatching.
    /// Like [`run`](Self::run), an empty target list stops before loading.
    ///
    /// # Errors
    ///
    /// Returns the first [`RunError`] raised.
    pub fn check(&self, request: &RunRequest) -> Result<CheckReport> {
        let span = tracing::info_span!("check", job = %request.job_name);
        let _entered = span.enter();

        self.console.print("Check:");
        let _check_scope = self.console.scope();

        if request.options.targets.is_empty() {
            self.console.print("> No target selected.");
            return Ok(CheckReport::NoTargets);
        }

        let Prepared { engine, .. } = self.prepare(request)?;
        validate_job_options(&request.options, engine.as_ref())?;

        let targets = engine.enumerate_targets(&request.options.targets);
        self.console.print(format!(
            "Job options: OK ({})",
            format_targets(&targets, "no targets")
        ));
        Ok(CheckReport::Valid {
            engine: engine.name(),
            targets,
        })
    }

    /// Load the input, then resolve and initialize the engine, then report.
    fn prepare(&self, request: &RunRequest) -> Result<Prepared> {
        let path = PathBuf::from(request.input.trim());
        let input = self
            .loader
            .load(&path)
            .map_err(|cause| RunError::InputLoad {
                path: path.clone(),
                cause,
            })?;
        tracing::debug!(path = %input.path().display(), case_dir = %input.case_dir().display(), "Input loaded");

        let factory = self.engines.get(&request.options.engine)?;
        let engine = factory.init(&EngineContext {
            job_name: &request.job_name,
            options: &request.options,
            input: input.as_ref(),
        })?;
        tracing::debug!(engine = engine.name(), "Engine initialized");

        self.print_configuration(request, engine.as_ref());
        Ok(Prepared { input, engine })
    }

    fn print_configuration(&self, request: &RunRequest, engine: &dyn Engine) {
        let options = &request.options;
        self.console.print("Configuration:");
        let _scope = self.console.scope();
        self.console.print(format!(
            "Input               {}\n\
             Job Name      (-#)  {}\n\
             Engine        (-e)  {}\n\
             Mode          (-m)  {}\n\
             Targets       (-t)  {}\n\
             {}",
            request.input.trim(),
            request.job_name,
            options.engine,
            options.mode,
            format_targets(&options.targets, "None"),
            engine.describe(),
        ));
    }

    fn run_target(
        &self,
        ctx: &BuildContext<'_>,
        input: &mut dyn InputFile,
        engine: &dyn Engine,
        target: &Target,
    ) -> Result<DispatchOutcome> {
        let _span = tracing::info_span!("target", target = %target).entered();

        self.console.print(format!("Running {target}:"));
        let _scope = self.console.scope();

        input
            .create(target)
            .map_err(|cause| RunError::InputSpecialization {
                target: target.clone(),
                cause,
            })?;

        self.builder
            .build_target(ctx, target)
            .map_err(|cause| RunError::Build {
                target: target.clone(),
                cause,
            })?;

        let outcome = engine.dispatch(target)?;
        self.console.print(format!("> {outcome}"));
        tracing::info!(target = %target, outcome = %outcome, "Dispatched");
        Ok(outcome)
    }
}
