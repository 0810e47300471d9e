//! Reads stored cross sections back from their file triples.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CurateError, Result};

use super::cross_section::CrossSection;
use super::writer::RecordPaths;
use super::NULL_MARKER;

/// Number of columns in a `.met` row.
const MET_COLUMNS: usize = 18;

/// A cross section as found in an output tree.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCrossSection {
    pub cs_id: i64,
    /// `csdata_id` of the first data row, if there are any rows.
    pub first_csdata_id: Option<i64>,
    /// Path of the `.met` file.
    pub path: PathBuf,
    pub cross_section: CrossSection,
}

/// Source of already-curated cross sections, looked up by id.
pub trait CrossSectionStore {
    /// Fetch one cross section.
    fn fetch(&self, cs_id: i64) -> Result<StoredCrossSection>;

    /// Fetch several, in the given order.
    fn fetch_all(&self, cs_ids: &[i64]) -> Result<Vec<StoredCrossSection>> {
        cs_ids.iter().map(|id| self.fetch(*id)).collect()
    }
}

/// Read the triple `<dir>/<stem>.{met,dat,mod}`.
pub fn read_record(dir: &Path, stem: &str) -> Result<StoredCrossSection> {
    let paths = RecordPaths::new(dir, stem);

    let met = read_rows(&paths.met)?;
    let [row] = met.as_slice() else {
        return Err(malformed(&paths.met, &format!("expected 1 row, found {}", met.len())));
    };
    if row.len() != MET_COLUMNS {
        return Err(malformed(
            &paths.met,
            &format!("expected {} columns, found {}", MET_COLUMNS, row.len()),
        ));
    }

    let text = |idx: usize| -> Option<String> {
        (row[idx] != NULL_MARKER).then(|| row[idx].clone())
    };
    let float = |idx: usize| -> Result<Option<f64>> {
        text(idx)
            .map(|v| v.parse::<f64>().map_err(|e| malformed(&paths.met, &format!("column {}: {}", idx + 1, e))))
            .transpose()
    };
    let int = |idx: usize| -> Result<Option<i64>> {
        text(idx)
            .map(|v| v.parse::<i64>().map_err(|e| malformed(&paths.met, &format!("column {}: {}", idx + 1, e))))
            .transpose()
    };
    let required = |value: Option<f64>, idx: usize| {
        value.ok_or_else(|| malformed(&paths.met, &format!("column {} is NULL", idx + 1)))
    };

    let cs_id = int(0)?.ok_or_else(|| malformed(&paths.met, "cs_id is NULL"))?;

    let mut data = Vec::new();
    let mut first_csdata_id = None;
    for (line, fields) in read_rows(&paths.dat)?.iter().enumerate() {
        let parse_err = |message: String| CurateError::Parse {
            file: paths.dat.display().to_string(),
            line: line + 1,
            message,
        };
        if fields.len() != 3 {
            return Err(parse_err(format!("expected 3 columns, found {}", fields.len())));
        }
        let id = fields[0].parse::<i64>().map_err(|e| parse_err(e.to_string()))?;
        let energy = fields[1].parse::<f64>().map_err(|e| parse_err(e.to_string()))?;
        let sigma = fields[2].parse::<f64>().map_err(|e| parse_err(e.to_string()))?;
        first_csdata_id.get_or_insert(id);
        data.push((energy, sigma));
    }

    let models = if paths.models.exists() {
        fs::read_to_string(&paths.models)
            .map_err(|e| CurateError::io(&paths.models, e))?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    };

    let units_e = required(float(3)?, 3)?;
    let cross_section = CrossSection {
        specie: row[1].clone(),
        process: row[2].clone(),
        units_e,
        units_sigma: required(float(4)?, 4)?,
        reference: text(5),
        lhs_a: text(6),
        lhs_b: text(7),
        rhs_a: text(8),
        rhs_b: text(9),
        lhs_v: int(10)?,
        rhs_v: int(11)?,
        lhs_j: int(12)?,
        rhs_j: int(13)?,
        // Stored in eV, kept in the record's own energy units.
        threshold: float(14)?.map(|t| t / units_e),
        background: text(15),
        lpu: float(16)?,
        upu: float(17)?,
        models,
        nepc_filename: stem.to_string(),
        data,
    };

    Ok(StoredCrossSection {
        cs_id,
        first_csdata_id,
        path: paths.met,
        cross_section,
    })
}

fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let file = File::open(path).map_err(|e| CurateError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn malformed(path: &Path, message: &str) -> CurateError {
    CurateError::Parse {
        file: path.display().to_string(),
        line: 1,
        message: message.to_string(),
    }
}

/// Store backed by an output directory tree, indexed by `cs_id`.
#[derive(Debug, Clone, Default)]
pub struct DirectoryStore {
    root: PathBuf,
    index: BTreeMap<i64, PathBuf>,
}

impl DirectoryStore {
    /// Scan `root` recursively for `.met` files. A missing root is an empty store.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let mut store = Self {
            root: root.clone(),
            index: BTreeMap::new(),
        };
        if root.exists() {
            store.scan(&root)?;
        }
        debug!(root = %store.root.display(), records = store.index.len(), "Indexed cross sections");
        Ok(store)
    }

    fn scan(&mut self, dir: &Path) -> Result<()> {
        let entries = fs::read_dir(dir).map_err(|e| CurateError::io(dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| CurateError::io(dir, e))?.path();
            if path.is_dir() {
                self.scan(&path)?;
            } else if path.extension().is_some_and(|ext| ext == "met") {
                let rows = read_rows(&path)?;
                let cs_id = rows
                    .first()
                    .and_then(|r| r.first())
                    .and_then(|id| id.parse::<i64>().ok())
                    .ok_or_else(|| malformed(&path, "missing cs_id"))?;
                if let Some(previous) = self.index.insert(cs_id, path.clone()) {
                    return Err(CurateError::Config(format!(
                        "cs_id {} appears in both '{}' and '{}'",
                        cs_id,
                        previous.display(),
                        path.display()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Indexed ids, ascending.
    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.index.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl CrossSectionStore for DirectoryStore {
    fn fetch(&self, cs_id: i64) -> Result<StoredCrossSection> {
        let met = self.index.get(&cs_id).ok_or(CurateError::NotFound { cs_id })?;
        let dir = met.parent().unwrap_or(Path::new("."));
        let stem = met
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        read_record(dir, &stem)
    }
}
