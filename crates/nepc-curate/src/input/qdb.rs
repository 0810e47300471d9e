//! QDB dataset descriptions.
//!
//! A description is a small XML document naming the process, the column
//! units and a companion numeric data file:
//!
//! ```xml
//! <qdb_dataset kind="IONIZATION" specie="N2">
//!   <reaction lhs="N2" rhs="N2^+"/>
//!   <reference>Itikawa (2006)</reference>
//!   <columns>
//!     <column quantity="energy" units="eV"/>
//!     <column quantity="cross_section" units="cm2"/>
//!   </columns>
//!   <data file="N2_ionization.txt" rows="42"/>
//! </qdb_dataset>
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{CurateError, Result};

use super::record::{ProcessKind, RawProcessRecord};
use super::table::read_pairs;

/// Physical quantity of a data column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Energy,
    CrossSection,
}

/// Parsed dataset description.
#[derive(Debug, Clone, PartialEq)]
pub struct QdbDescription {
    /// Description file this was read from.
    pub path: PathBuf,
    pub kind: ProcessKind,
    pub target: String,
    pub product: Option<String>,
    pub energy_units: String,
    pub sigma_units: String,
    /// Companion data file, resolved against the description's directory.
    pub data_file: PathBuf,
    /// Declared number of data rows.
    pub rows: usize,
    /// Remaining attributes (root attributes, `ref`).
    pub fields: IndexMap<String, String>,
}

impl QdbDescription {
    /// Load and parse a description file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| CurateError::io(path, e))?;
        Self::parse(&text, path)
    }

    /// Parse description text; `path` locates the companion data file.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let doc = roxmltree::Document::parse(text)?;
        let root = doc.root_element();
        let missing = |what: &str| {
            CurateError::Config(format!("{}: missing {}", path.display(), what))
        };

        let mut fields = IndexMap::new();
        for attr in root.attributes() {
            fields.insert(attr.name().to_string(), attr.value().to_string());
        }

        let kind_attr = fields
            .shift_remove("kind")
            .ok_or_else(|| missing("'kind' attribute"))?;
        let kind = ProcessKind::from_keyword(&kind_attr.to_uppercase()).ok_or_else(|| {
            CurateError::Config(format!(
                "{}: unknown process kind '{}'",
                path.display(),
                kind_attr
            ))
        })?;

        let reaction = root.descendants().find(|n| n.has_tag_name("reaction"));
        let target = reaction
            .and_then(|n| n.attribute("lhs"))
            .map(str::to_string)
            .or_else(|| fields.get("specie").cloned())
            .ok_or_else(|| missing("reaction 'lhs' or 'specie'"))?;
        let product = reaction.and_then(|n| n.attribute("rhs")).map(str::to_string);

        if let Some(reference) = root
            .descendants()
            .find(|n| n.has_tag_name("reference"))
            .and_then(|n| n.text())
        {
            fields.insert("ref".to_string(), reference.trim().to_string());
        }

        let column_units = |quantity: &str| {
            root.descendants()
                .filter(|n| n.has_tag_name("column"))
                .find(|n| n.attribute("quantity") == Some(quantity))
                .and_then(|n| n.attribute("units"))
                .map(str::to_string)
        };
        let energy_units = column_units("energy").ok_or_else(|| missing("energy column units"))?;
        let sigma_units =
            column_units("cross_section").ok_or_else(|| missing("cross_section column units"))?;

        let data = root
            .descendants()
            .find(|n| n.has_tag_name("data"))
            .ok_or_else(|| missing("<data> element"))?;
        let file = data
            .attribute("file")
            .ok_or_else(|| missing("data 'file' attribute"))?;
        let rows = data
            .attribute("rows")
            .ok_or_else(|| missing("data 'rows' attribute"))?
            .parse::<usize>()
            .map_err(|e| {
                CurateError::Config(format!("{}: invalid row count: {}", path.display(), e))
            })?;

        let base = path.parent().unwrap_or(Path::new("."));

        Ok(Self {
            path: path.to_path_buf(),
            kind,
            target,
            product,
            energy_units,
            sigma_units,
            data_file: base.join(file),
            rows,
            fields,
        })
    }

    /// Read the companion data file into a raw record.
    ///
    /// Fails if the number of rows read differs from the declared count.
    pub fn read_record(&self) -> Result<RawProcessRecord> {
        let data = read_pairs(&self.data_file)?;
        if data.len() != self.rows {
            return Err(CurateError::RowCount {
                file: self.data_file.display().to_string(),
                expected: self.rows,
                actual: data.len(),
            });
        }
        debug!(file = %self.data_file.display(), rows = data.len(), "Read QDB data");

        let mut record = RawProcessRecord::new(self.kind, self.target.clone());
        record.product = self.product.clone();
        record.data = data;
        record.fields = self.fields.clone();
        record.source = Some(self.path.clone());
        Ok(record)
    }
}

/// Conversion factor from a units label to eV (energy) or m^2 (cross section).
///
/// Labels may carry a leading numeric scale, e.g. `1e-16 cm2`.
pub fn units_factor(units: &str, quantity: Quantity) -> Result<f64> {
    let tokens: Vec<&str> = units.split_whitespace().collect();
    let (scale, unit) = match tokens.as_slice() {
        [unit] => (1.0, *unit),
        [scale, unit] => {
            let scale = scale.parse::<f64>().map_err(|_| CurateError::InvalidValue {
                field: "units".to_string(),
                message: format!("invalid scale in '{}'", units),
            })?;
            (scale, *unit)
        }
        _ => {
            return Err(CurateError::InvalidValue {
                field: "units".to_string(),
                message: format!("cannot interpret units '{}'", units),
            });
        }
    };

    let base = match (quantity, unit.replace('^', "").as_str()) {
        (Quantity::Energy, "eV") => 1.0,
        (Quantity::Energy, "meV") => 1e-3,
        (Quantity::Energy, "keV") => 1e3,
        (Quantity::CrossSection, "m2") => 1.0,
        (Quantity::CrossSection, "cm2") => 1e-4,
        (Quantity::CrossSection, "A2" | "Å2" | "angstrom2") => 1e-20,
        (Quantity::CrossSection, "a02" | "bohr2") => 2.800_285_2e-21,
        _ => {
            return Err(CurateError::InvalidValue {
                field: "units".to_string(),
                message: format!("unrecognized {:?} units '{}'", quantity, units),
            });
        }
    };
    Ok(scale * base)
}
