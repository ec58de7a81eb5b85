//! Job-run orchestration core for simrun.
//!
//! Validates requested jobs against the selected execution engine, then
//! prepares the input, builds, and dispatches each target in order.

pub mod build;
pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod input;
pub mod orchestrator;

#[cfg(all(test, unix))]
mod testing;

// Re-export public API for convenience
pub use build::{BuildContext, Builder, CmakeBuilder, PrebuiltBuilder};
pub use console::Console;
pub use engine::{Engine, EngineContext, EngineFactory, EngineRegistry};
pub use error::{ConfigError, DispatchError, RunError};
pub use input::{CaseFileLoader, InputFile, InputLoader};
pub use orchestrator::{CheckReport, RunOrchestrator, RunReport, RunRequest};
