//! Shared simrun job, target and dispatch types.
//!
//! Kept free of engine logic so the CLI and the orchestration core can
//! share them without circular dependencies.

pub mod dispatch;
pub mod options;
pub mod target;

pub use dispatch::DispatchOutcome;
pub use options::JobOptions;
pub use target::Target;
