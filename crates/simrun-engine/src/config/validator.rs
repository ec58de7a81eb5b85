//! Job-option validation.
//!
//! Rules run in a fixed order and the first violation is reported; the
//! selected engine's own rules run last.

use std::sync::LazyLock;

use regex::Regex;
use simrun_types::JobOptions;

use crate::engine::Engine;
use crate::error::ConfigError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^"?[-a-zA-Z0-9._+`?{}]+@\w[\w-]*(\.\w[\w-]*)+"?$"#).expect("valid email regex")
});

/// `true` if `email` looks like a deliverable address.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Engine-independent checks, in reporting order.
///
/// # Errors
///
/// Returns the first [`ConfigError`] encountered.
pub fn validate_common(options: &JobOptions) -> Result<(), ConfigError> {
    if options.gpus_per_node != 0 && options.cpus_per_node != options.gpus_per_node {
        return Err(ConfigError::ConflictingAllocation {
            cpus: options.cpus_per_node,
            gpus: options.gpus_per_node,
        });
    }

    if options.nodes <= 0 {
        return Err(ConfigError::NoNodes {
            nodes: options.nodes,
        });
    }

    if options.cpus_per_node <= 0 {
        return Err(ConfigError::NoCpus {
            cpus: options.cpus_per_node,
        });
    }

    if let Some(email) = options.email() {
        if !is_valid_email(email) {
            return Err(ConfigError::InvalidEmail {
                email: email.to_string(),
            });
        }
    }

    Ok(())
}

/// Validate job options against the common rules, then the engine's own.
///
/// # Errors
///
/// Returns the first [`ConfigError`] encountered; later rules are skipped.
pub fn validate_job_options(options: &JobOptions, engine: &dyn Engine) -> Result<(), ConfigError> {
    validate_common(options)?;
    engine.validate_job_options(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> JobOptions {
        JobOptions::default()
    }

    #[test]
    fn test_defaults_pass() {
        assert!(validate_common(&options()).is_ok());
    }

    #[test]
    fn test_gpu_cpu_conflict_reported_first() {
        let opts = JobOptions {
            nodes: 0,
            cpus_per_node: 0,
            gpus_per_node: 2,
            email: Some("garbage".into()),
            ..options()
        };
        assert_eq!(
            validate_common(&opts),
            Err(ConfigError::ConflictingAllocation { cpus: 0, gpus: 2 })
        );
    }

    #[test]
    fn test_matching_gpus_pass() {
        let opts = JobOptions {
            cpus_per_node: 4,
            gpus_per_node: 4,
            ..options()
        };
        assert!(validate_common(&opts).is_ok());
    }

    #[test]
    fn test_zero_nodes_fails_before_cpus() {
        let opts = JobOptions {
            nodes: 0,
            cpus_per_node: 0,
            ..options()
        };
        assert_eq!(validate_common(&opts), Err(ConfigError::NoNodes { nodes: 0 }));
    }

    #[test]
    fn test_zero_cpus_fails() {
        let opts = JobOptions {
            cpus_per_node: 0,
            ..options()
        };
        assert_eq!(validate_common(&opts), Err(ConfigError::NoCpus { cpus: 0 }));
    }

    #[test]
    fn test_email_patterns() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+runs@mail.cluster.edu"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("two words@example.com"));
    }

    #[test]
    fn test_invalid_email_fails() {
        let opts = JobOptions {
            email: Some("not-an-email".into()),
            ..options()
        };
        assert_eq!(
            validate_common(&opts),
            Err(ConfigError::InvalidEmail {
                email: "not-an-email".into()
            })
        );
    }

    #[test]
    fn test_blank_email_skips_pattern_check() {
        for email in ["", "   ", "\t"] {
            let opts = JobOptions {
                email: Some(email.into()),
                ..options()
            };
            assert!(validate_common(&opts).is_ok(), "email {email:?} should be ignored");
        }
    }
}
