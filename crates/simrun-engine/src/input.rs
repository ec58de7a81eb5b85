//! Case input loading and per-target specialization.
//!
//! A case file is YAML (or JSON) with a flat `parameters` map of scalars and
//! optional per-target overrides:
//!
//! ```yaml
//! parameters:
//!   m: 199
//!   t_step_stop: 1000
//! targets:
//!   simulation:
//!     t_step_save: 100
//! ```
//!
//! [`InputFile::create`] writes `<case dir>/<target>.inp` as a namelist.
//! Parameter values are passed through opaquely.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use simrun_types::Target;

use crate::config::parser::substitute_env_vars;

/// Loads an input file from a path.
pub trait InputLoader {
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    fn load(&self, path: &Path) -> Result<Box<dyn InputFile>>;
}

/// A loaded input that can be specialized for each target.
pub trait InputFile {
    /// Path the input was loaded from.
    fn path(&self) -> &Path;

    /// Directory the case runs in.
    fn case_dir(&self) -> &Path;

    /// Write the input specialized for `target`, returning the written path.
    ///
    /// # Errors
    ///
    /// Returns an error if the specialized input cannot be written.
    fn create(&mut self, target: &Target) -> Result<PathBuf>;
}

/// One opaque parameter value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Namelist rendering: `T`/`F`, numbers as-is, strings single-quoted.
    fn to_namelist(&self) -> String {
        match self {
            Self::Bool(true) => "T".to_string(),
            Self::Bool(false) => "F".to_string(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => format!("{v:?}"),
            Self::Str(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CaseDocument {
    #[serde(default)]
    parameters: BTreeMap<String, Scalar>,
    #[serde(default)]
    targets: BTreeMap<String, BTreeMap<String, Scalar>>,
}

/// Loader for YAML/JSON case files, with `${VAR}` substitution.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseFileLoader;

impl InputLoader for CaseFileLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn InputFile>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read case file: {}", path.display()))?;
        let case = CaseFile::parse(path, &content)?;
        tracing::info!(
            path = %path.display(),
            parameters = case.parameters.len(),
            overrides = case.overrides.len(),
            "Loaded case file"
        );
        Ok(Box::new(case))
    }
}

/// A parsed case file.
#[derive(Debug, Clone)]
pub struct CaseFile {
    path: PathBuf,
    case_dir: PathBuf,
    parameters: BTreeMap<String, Scalar>,
    overrides: BTreeMap<String, BTreeMap<String, Scalar>>,
}

impl CaseFile {
    /// Parse case file `content` that was read from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error on missing environment variables, malformed YAML,
    /// or non-scalar parameter values.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let substituted = substitute_env_vars(content)?;
        let doc: CaseDocument =
            serde_yaml::from_str(&substituted).context("Failed to parse case file")?;

        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        let case_dir = std::path::absolute(parent.unwrap_or(Path::new(".")))
            .context("Failed to resolve case directory")?;

        Ok(Self {
            path: path.to_path_buf(),
            case_dir,
            parameters: doc.parameters,
            overrides: doc.targets,
        })
    }

    /// Parameters for `target`: common values with its overrides applied.
    #[must_use]
    pub fn parameters_for(&self, target: &Target) -> BTreeMap<String, Scalar> {
        let mut merged = self.parameters.clone();
        if let Some(overrides) = self.overrides.get(target.as_str()) {
            merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    /// Render the namelist for `target`.
    #[must_use]
    pub fn render(&self, target: &Target) -> String {
        let mut out = String::from("&user_inputs\n");
        for (key, value) in self.parameters_for(target) {
            let _ = writeln!(out, "{key} = {}", value.to_namelist());
        }
        out.push_str("&end/\n");
        out
    }
}

impl InputFile for CaseFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn case_dir(&self) -> &Path {
        &self.case_dir
    }

    fn create(&mut self, target: &Target) -> Result<PathBuf> {
        if !target.is_file_name() {
            bail!("target name '{target}' cannot be used as an input file name");
        }
        let out = self.case_dir.join(format!("{target}.inp"));
        std::fs::write(&out, self.render(target))
            .with_context(|| format!("Failed to write {}", out.display()))?;
        tracing::debug!(target = %target, path = %out.display(), "Wrote target input");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASE: &str = r"
parameters:
  m: 199
  cfl: 0.5
  viscous: false
  model: 'euler'
targets:
  simulation:
    t_step_save: 100
    viscous: true
";

    #[test]
    fn test_render_common_parameters() {
        let case = CaseFile::parse(Path::new("/cases/shock/case.yaml"), CASE).unwrap();
        assert_eq!(
            case.render(&Target::new("pre_process")),
            "&user_inputs\ncfl = 0.5\nm = 199\nmodel = 'euler'\nviscous = F\n&end/\n"
        );
    }

    #[test]
    fn test_render_applies_target_overrides() {
        let case = CaseFile::parse(Path::new("/cases/shock/case.yaml"), CASE).unwrap();
        let text = case.render(&Target::new("simulation"));
        assert!(text.contains("viscous = T\n"));
        assert!(text.contains("t_step_save = 100\n"));
    }

    #[test]
    fn test_case_dir_is_parent() {
        let case = CaseFile::parse(Path::new("/cases/shock/case.yaml"), CASE).unwrap();
        assert_eq!(case.case_dir(), Path::new("/cases/shock"));
        assert_eq!(case.path(), Path::new("/cases/shock/case.yaml"));
    }

    #[test]
    fn test_string_quotes_escaped() {
        let case =
            CaseFile::parse(Path::new("/c/case.yaml"), "parameters:\n  label: \"it's\"\n").unwrap();
        assert!(case.render(&Target::new("x")).contains("label = 'it''s'\n"));
    }

    #[test]
    fn test_nested_parameter_rejected() {
        let err = CaseFile::parse(Path::new("/c/case.yaml"), "parameters:\n  grid:\n    m: 1\n")
            .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse case file"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(CaseFile::parse(Path::new("/c/case.yaml"), "params:\n  m: 1\n").is_err());
    }

    #[test]
    fn test_json_case_accepted() {
        let case =
            CaseFile::parse(Path::new("/c/case.json"), r#"{"parameters": {"n": 0}}"#).unwrap();
        assert_eq!(case.render(&Target::new("x")), "&user_inputs\nn = 0\n&end/\n");
    }

    #[test]
    fn test_loader_missing_file() {
        let err = CaseFileLoader
            .load(Path::new("/nonexistent/simrun/case.yaml"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("Failed to read case file"));
    }

    #[test]
    fn test_create_writes_target_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.yaml");
        std::fs::write(&path, CASE).unwrap();

        let mut input = CaseFileLoader.load(&path).unwrap();
        let written = input.create(&Target::new("simulation")).unwrap();

        assert_eq!(written, dir.path().join("simulation.inp"));
        let text = std::fs::read_to_string(written).unwrap();
        assert!(text.starts_with("&user_inputs\n"));
        assert!(text.contains("t_step_save = 100"));
    }

    #[test]
    fn test_create_rejects_path_like_target() {
        let dir = tempfile::tempdir().unwrap();
        let case_dir = dir.path().join("case");
        std::fs::create_dir(&case_dir).unwrap();
        let path = case_dir.join("case.yaml");
        std::fs::write(&path, CASE).unwrap();

        let mut input = CaseFileLoader.load(&path).unwrap();
        let err = input.create(&Target::new("../simulation")).unwrap_err();

        assert!(err.to_string().contains("cannot be used as an input file name"));
        assert!(!dir.path().join("simulation.inp").exists());
    }
}
