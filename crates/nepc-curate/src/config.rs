//! Data locations and curation job configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::curation::{AugmentRule, ProcessCategory};
use crate::error::{CurateError, Result};

/// Where raw inputs, curated outputs and the id state file live.
///
/// ```text
/// $NEPC_DATA_HOME/
/// ├── raw/<source>/<species>/<title>/   # inputs, e.g. raw/lxcat/N2/fict
/// └── cs/
///     ├── next_id.tsv                   # id counters
///     └── <species>/<title>/            # curated output
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub raw_dir: PathBuf,
    pub output_dir: PathBuf,
    pub id_file: PathBuf,
}

impl DataPaths {
    /// Standard layout under a data home directory.
    pub fn from_home(home: impl AsRef<Path>) -> Self {
        let home = home.as_ref();
        Self {
            raw_dir: home.join("raw"),
            output_dir: home.join("cs"),
            id_file: home.join("cs").join("next_id.tsv"),
        }
    }

    /// Directory holding raw inputs of one source for a species/title.
    pub fn input_dir(&self, source: &str, species: &str, title: &str) -> PathBuf {
        self.raw_dir.join(source).join(species).join(title)
    }

    /// Directory receiving curated records for a species/title.
    pub fn output_dir_for(&self, species: &str, title: &str) -> PathBuf {
        self.output_dir.join(species).join(title)
    }
}

/// Inputs of a lumped job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LumpedSection {
    /// Stored cross sections to sum, in order.
    pub cs_ids: Vec<i64>,
    /// Output file stem of the lumped record.
    pub name: String,
}

fn unit_factor() -> f64 {
    1.0
}

fn default_extension() -> String {
    "txt".to_string()
}

/// Settings of one curation job, loaded from TOML or JSON.
///
/// ```toml
/// units_e = 1.0
/// units_sigma = 1.0
/// ref = "Phelps database"
/// models = ["fict"]
///
/// [[rule]]
/// match = { product = "v1" }
/// set = { rhs_a = "N2(X1Sigmag+)", lhs_v = 0, rhs_v = 1, process = "excitation_v" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationConfig {
    /// Energy scale factor to eV.
    #[serde(default = "unit_factor")]
    pub units_e: f64,
    /// Cross-section scale factor to m^2.
    #[serde(default = "unit_factor")]
    pub units_sigma: f64,
    /// Reference applied to records that do not carry one.
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
    /// Models every record of the job belongs to.
    #[serde(default)]
    pub models: Vec<String>,
    /// Augment rules, applied in order.
    #[serde(default, rename = "rule")]
    pub rules: Vec<AugmentRule>,
    /// Process categories in addition to the built-in ones.
    #[serde(default, rename = "process")]
    pub processes: Vec<ProcessCategory>,
    /// Extension of input files picked up by discovery.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Whether LXCat blocks carry an argument line.
    #[serde(default = "default_true")]
    pub has_arg: bool,
    /// Inputs when the job lumps stored cross sections.
    #[serde(default)]
    pub lumped: Option<LumpedSection>,
}

fn default_true() -> bool {
    true
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            units_e: unit_factor(),
            units_sigma: unit_factor(),
            reference: None,
            models: Vec::new(),
            rules: Vec::new(),
            processes: Vec::new(),
            extension: default_extension(),
            has_arg: true,
            lumped: None,
        }
    }
}

impl CurationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| CurateError::io(path, e))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(toml::from_str(&text)?),
            Some("json") => Ok(serde_json::from_str(&text)?),
            _ => Err(CurateError::Config(format!(
                "Unsupported config format: {} (use .toml or .json)",
                path.display()
            ))),
        }
    }

    pub fn with_units(mut self, units_e: f64, units_sigma: f64) -> Self {
        self.units_e = units_e;
        self.units_sigma = units_sigma;
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.models.push(model.into());
        self
    }

    pub fn with_rule(mut self, rule: AugmentRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_process(mut self, category: ProcessCategory) -> Self {
        self.processes.push(category);
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;
    use tempfile::TempDir;

    #[test]
    fn test_data_paths() {
        let paths = DataPaths::from_home("/data/nepc");
        assert_eq!(
            paths.input_dir("lxcat", "N2", "fict"),
            PathBuf::from("/data/nepc/raw/lxcat/N2/fict")
        );
        assert_eq!(
            paths.output_dir_for("N2", "fict"),
            PathBuf::from("/data/nepc/cs/N2/fict")
        );
        assert_eq!(paths.id_file, PathBuf::from("/data/nepc/cs/next_id.tsv"));
    }

    #[test]
    fn test_load_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("job.toml");
        fs::write(
            &path,
            r#"
units_sigma = 1.0e-20
ref = "Phelps"
models = ["fict"]

[[rule]]
match = { product = "v1" }
set = { rhs_a = "N2(X1Sigmag+)", lhs_v = 0, rhs_v = 1 }

[[process]]
name = "excitation_el"
lhs = 1
rhs = 1

[lumped]
cs_ids = [3, 4, 5]
name = "N2_vib_total"
"#,
        )
        .unwrap();

        let config = CurationConfig::load(&path).unwrap();
        assert_eq!(config.units_e, 1.0);
        assert_eq!(config.units_sigma, 1.0e-20);
        assert_eq!(config.reference.as_deref(), Some("Phelps"));
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].set.get("rhs_v"), Some(&FieldValue::Integer(1)));
        assert_eq!(config.processes[0].name, "excitation_el");
        assert_eq!(config.extension, "txt");
        assert!(config.has_arg);
        assert_eq!(config.lumped.unwrap().cs_ids, vec![3, 4, 5]);
    }

    #[test]
    fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("job.json");
        fs::write(&path, r#"{"models": ["a", "b"], "extension": "dat"}"#).unwrap();

        let config = CurationConfig::load(&path).unwrap();
        assert_eq!(config.models, vec!["a", "b"]);
        assert_eq!(config.extension, "dat");
        assert!(config.lumped.is_none());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("job.yaml");
        fs::write(&path, "models: []").unwrap();
        assert!(matches!(CurationConfig::load(&path), Err(CurateError::Config(_))));
    }
}
