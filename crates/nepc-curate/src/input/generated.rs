//! Declarative descriptions of generated cross sections.
//!
//! Generated data (model fits, scaled copies, synthetic test sets) is
//! described in a single TOML file instead of being discovered on disk:
//!
//! ```toml
//! [defaults]
//! specie = "N2"
//! ref = "fit to Itikawa (2006)"
//!
//! [[cross_section]]
//! name = "n2_ion_fit"
//! data_file = "n2_ion_fit.txt"
//!
//! [cross_section.fields]
//! process = "ionization"
//! lhs_a = "N2"
//! rhs_a = "N2^+"
//! threshold = 15.58
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CurateError, Result};
use crate::record::FieldValue;

use super::table::read_pairs;

/// One generated cross section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedEntry {
    /// Output file stem.
    pub name: String,
    /// Inline (energy, cross section) pairs.
    #[serde(default)]
    pub data: Vec<(f64, f64)>,
    /// Two-column data file, relative to the description.
    #[serde(default)]
    pub data_file: Option<PathBuf>,
    /// Cross-section fields set on this entry.
    #[serde(default)]
    pub fields: IndexMap<String, FieldValue>,
}

/// A whole description file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedSource {
    /// Fields applied to every entry before its own fields.
    #[serde(default)]
    pub defaults: IndexMap<String, FieldValue>,
    #[serde(default, rename = "cross_section")]
    pub entries: Vec<GeneratedEntry>,
}

impl GeneratedSource {
    /// Load a description and resolve every `data_file` into inline data.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| CurateError::io(path, e))?;
        let mut source: GeneratedSource = toml::from_str(&text)?;

        let base = path.parent().unwrap_or(Path::new("."));
        for entry in &mut source.entries {
            if let Some(file) = entry.data_file.take() {
                if !entry.data.is_empty() {
                    return Err(CurateError::Config(format!(
                        "{}: entry '{}' has both inline data and a data file",
                        path.display(),
                        entry.name
                    )));
                }
                let resolved = base.join(file);
                entry.data = read_pairs(&resolved)?;
                entry.data_file = Some(resolved);
            }
        }
        Ok(source)
    }
}
