//! Run error taxonomy.
//!
//! [`ConfigError`] names the violated job-option rule together with the
//! offending value. [`RunError`] is what the orchestrator surfaces; every
//! variant is raised at the point of detection and propagated unchanged.

use std::path::PathBuf;

use simrun_types::Target;

/// A job-option constraint was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "conflicting CPU/GPU allocation: {cpus} CPUs and {gpus} GPUs per node \
         (when using GPUs they must match)"
    )]
    ConflictingAllocation { cpus: i32, gpus: i32 },

    #[error("at least one node required (got {nodes})")]
    NoNodes { nodes: i32 },

    #[error("at least one CPU per node required (got {cpus})")]
    NoCpus { cpus: i32 },

    #[error("invalid email address: '{email}'")]
    InvalidEmail { email: String },

    /// Backend-specific rule reported by an engine's own validation.
    #[error("{engine} engine: {rule}")]
    Engine { engine: &'static str, rule: String },
}

impl ConfigError {
    /// Create a backend-specific rule violation.
    pub fn engine(engine: &'static str, rule: impl Into<String>) -> Self {
        Self::Engine {
            engine,
            rule: rule.into(),
        }
    }
}

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unknown engine '{name}' (available: {})", .available.join(", "))]
    UnknownEngine {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("failed to load input '{}': {cause:#}", .path.display())]
    InputLoad {
        path: PathBuf,
        cause: anyhow::Error,
    },

    #[error("failed to prepare input for target '{target}': {cause:#}")]
    InputSpecialization {
        target: Target,
        cause: anyhow::Error,
    },

    #[error("failed to initialize {engine} engine: {cause:#}")]
    EngineInit {
        engine: &'static str,
        cause: anyhow::Error,
    },

    #[error("failed to build target '{target}': {cause:#}")]
    Build {
        target: Target,
        cause: anyhow::Error,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Executing one already-built target failed.
#[derive(Debug, thiserror::Error)]
#[error("failed to dispatch target '{target}': {cause:#}")]
pub struct DispatchError {
    pub target: Target,
    pub cause: anyhow::Error,
}

impl DispatchError {
    pub fn new(target: &Target, cause: anyhow::Error) -> Self {
        Self {
            target: target.clone(),
            cause,
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_rule_and_value() {
        let err = ConfigError::ConflictingAllocation { cpus: 4, gpus: 2 };
        let msg = err.to_string();
        assert!(msg.contains("conflicting CPU/GPU allocation"), "got: {msg}");
        assert!(msg.contains('4') && msg.contains('2'));

        let err = ConfigError::InvalidEmail {
            email: "not-an-email".into(),
        };
        assert!(err.to_string().contains("not-an-email"));
    }

    #[test]
    fn unknown_engine_lists_available() {
        let err = RunError::UnknownEngine {
            name: "cloud".into(),
            available: vec!["batch", "local"],
        };
        assert_eq!(
            err.to_string(),
            "unknown engine 'cloud' (available: batch, local)"
        );
    }

    #[test]
    fn dispatch_error_wraps_cause_chain() {
        let cause = anyhow::anyhow!("exit status 1").context("mpirun failed");
        let err = RunError::from(DispatchError::new(&Target::new("simulation"), cause));
        let msg = err.to_string();
        assert!(msg.contains("'simulation'"), "got: {msg}");
        assert!(msg.contains("mpirun failed: exit status 1"), "got: {msg}");
    }

    #[test]
    fn config_error_converts_into_run_error() {
        let err: RunError = ConfigError::NoNodes { nodes: 0 }.into();
        assert!(matches!(err, RunError::Config(ConfigError::NoNodes { nodes: 0 })));
    }
}
