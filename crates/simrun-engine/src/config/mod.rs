//! Run profile configuration and job-option validation.

pub mod parser;
pub mod types;
pub mod validator;
