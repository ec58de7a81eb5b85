//! Execution engine abstraction.
//!
//! An [`EngineFactory`] is looked up by name in the [`EngineRegistry`] and
//! initialized once per run. Initialization returns a fully-populated,
//! immutable [`Engine`]; validation, reporting, target enumeration and
//! dispatch only read that state.
//!
//! # Built-in engines
//!
//! - [`LocalEngine`] (`local`) runs each target in the foreground, through
//!   an MPI launcher when one is selected.
//! - [`BatchEngine`] (`batch`) writes a job script per target and submits it
//!   to a SLURM or PBS scheduler without waiting for completion.

mod batch;
mod local;
pub mod script;

pub use batch::{BatchEngine, BatchEngineFactory};
pub use local::{resolve_launcher, LocalEngine, LocalEngineFactory};

use std::collections::BTreeMap;
use std::path::Path;

use simrun_types::target::DEFAULT_PIPELINE;
use simrun_types::{DispatchOutcome, JobOptions, Target};

use crate::config::types::EngineSettings;
use crate::error::{ConfigError, DispatchError, Result, RunError};
use crate::input::InputFile;

/// Everything an engine may read while initializing.
pub struct EngineContext<'a> {
    pub job_name: &'a str,
    pub options: &'a JobOptions,
    pub input: &'a dyn InputFile,
}

/// An initialized execution backend.
pub trait Engine {
    /// Registry name of this engine.
    fn name(&self) -> &'static str;

    /// Backend-specific job-option rules, run after the common ones.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    fn validate_job_options(&self, options: &JobOptions) -> std::result::Result<(), ConfigError>;

    /// Human-readable rendering of the resolved configuration.
    fn describe(&self) -> String;

    /// Concrete, ordered list of targets to process for `requested`.
    fn enumerate_targets(&self, requested: &[Target]) -> Vec<Target> {
        expand_targets(requested)
    }

    /// Execute one already-built target.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] if the target could not be launched or submitted.
    fn dispatch(&self, target: &Target) -> std::result::Result<DispatchOutcome, DispatchError>;
}

/// Creates an [`Engine`] for one run.
pub trait EngineFactory {
    fn name(&self) -> &'static str;

    /// One-time setup: resolve backend defaults and capture job parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::EngineInit`] if backend defaults cannot be resolved.
    fn init(&self, ctx: &EngineContext<'_>) -> Result<Box<dyn Engine>>;
}

/// Startup-time table of engines keyed by name.
#[derive(Default)]
pub struct EngineRegistry {
    factories: BTreeMap<&'static str, Box<dyn EngineFactory>>,
}

impl EngineRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the `local` and `batch` engines.
    #[must_use]
    pub fn builtin(settings: &EngineSettings) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(LocalEngineFactory::new(settings)));
        registry.register(Box::new(BatchEngineFactory::new(settings)));
        registry
    }

    /// Add (or replace) an engine under its own name.
    pub fn register(&mut self, factory: Box<dyn EngineFactory>) -> &mut Self {
        self.factories.insert(factory.name(), factory);
        self
    }

    /// Look up an engine by name.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::UnknownEngine`] if `name` is not registered.
    pub fn get(&self, name: &str) -> Result<&dyn EngineFactory> {
        self.factories
            .get(name.trim())
            .map(|factory| &**factory)
            .ok_or_else(|| RunError::UnknownEngine {
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// Registered engine names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

/// Expand `*` / `all` into the default pipeline and drop duplicates,
/// keeping the first occurrence of each target.
#[must_use]
pub fn expand_targets(requested: &[Target]) -> Vec<Target> {
    let mut targets: Vec<Target> = Vec::with_capacity(requested.len());
    for target in requested {
        let expanded: Vec<Target> = if target.is_wildcard() {
            DEFAULT_PIPELINE.iter().copied().map(Target::new).collect()
        } else {
            vec![target.clone()]
        };
        for t in expanded {
            if !targets.contains(&t) {
                targets.push(t);
            }
        }
    }
    targets
}

/// Absolute form of `path`, resolved against the current directory.
pub(crate) fn absolute(path: &Path) -> anyhow::Result<std::path::PathBuf> {
    use anyhow::Context;
    std::path::absolute(path).with_context(|| format!("cannot resolve {}", path.display()))
}

/// `true` if an executable named `program` is found on `PATH`.
pub(crate) fn on_path(program: &str) -> bool {
    std::env::var_os("PATH").is_some_and(|paths| {
        std::env::split_paths(&paths).any(|dir| dir.join(program).is_file())
    })
}
