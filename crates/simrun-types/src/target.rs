//! Target identifiers.

use serde::{Deserialize, Serialize};

/// Targets run by `*` / `all`, in execution order.
pub const DEFAULT_PIPELINE: [&str; 3] = ["pre_process", "simulation", "post_process"];

/// Opaque name of a buildable/runnable artifact (e.g. `"simulation"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    /// Create a new target identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for the wildcard selectors `*` and `all`.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self.0.as_str(), "*" | "all")
    }

    /// `true` when the name is usable as a single path component, i.e. it
    /// is not `.`/`..` and contains no separator.
    #[must_use]
    pub fn is_file_name(&self) -> bool {
        !matches!(self.0.as_str(), "" | "." | "..") && !self.0.contains(['/', '\\', '\0'])
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Into<String>> From<S> for Target {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

/// Render a target list for reports, or `none_label` when empty.
#[must_use]
pub fn format_targets(targets: &[Target], none_label: &str) -> String {
    if targets.is_empty() {
        return none_label.to_string();
    }
    targets
        .iter()
        .map(Target::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_selectors() {
        assert!(Target::new("*").is_wildcard());
        assert!(Target::new("all").is_wildcard());
        assert!(!Target::new("simulation").is_wildcard());
    }

    #[test]
    fn file_name_rejects_separators_and_dot_segments() {
        assert!(Target::new("post_process").is_file_name());
        assert!(Target::new("v1.2").is_file_name());
        for bad in ["", ".", "..", "../simulation", "bin/simulation", "a\\b"] {
            assert!(!Target::new(bad).is_file_name(), "{bad:?}");
        }
    }

    #[test]
    fn format_targets_joins_in_order() {
        let targets = vec![Target::new("simulation"), Target::new("pre_process")];
        assert_eq!(format_targets(&targets, "None"), "simulation, pre_process");
        assert_eq!(format_targets(&[], "None"), "None");
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&Target::new("post_process")).unwrap();
        assert_eq!(json, "\"post_process\"");
    }
}
