//! Writes finalized cross sections as `.met`/`.dat`/`.mod` file triples.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::curation::IdCounters;
use crate::error::{CurateError, Result};

use super::cross_section::CrossSection;
use super::{format_float, NULL_MARKER};

/// The three files of one stored cross section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPaths {
    pub met: PathBuf,
    pub dat: PathBuf,
    pub models: PathBuf,
}

impl RecordPaths {
    pub fn new(dir: &Path, stem: &str) -> Self {
        Self {
            met: dir.join(format!("{}.met", stem)),
            dat: dir.join(format!("{}.dat", stem)),
            models: dir.join(format!("{}.mod", stem)),
        }
    }
}

/// Writes records into one output directory.
#[derive(Debug, Clone)]
pub struct RecordWriter {
    dir: PathBuf,
}

impl RecordWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one cross section using the next free ids.
    ///
    /// Returns the counters advanced past this record: `next_cs_id` by one
    /// and `next_csdata_id` by the number of data rows. A failure part-way
    /// leaves whatever files were already written in place.
    pub fn write(&self, cs: &CrossSection, ids: IdCounters) -> Result<IdCounters> {
        let paths = RecordPaths::new(&self.dir, &cs.nepc_filename);

        let mut dat = table_writer(&paths.dat)?;
        for (offset, (energy, sigma)) in cs.data.iter().enumerate() {
            dat.write_record([
                (ids.next_csdata_id + offset as i64).to_string(),
                format_float(*energy),
                format_float(*sigma),
            ])?;
        }
        dat.flush().map_err(|e| CurateError::io(&paths.dat, e))?;

        let mut met = table_writer(&paths.met)?;
        met.write_record(metadata_row(cs, ids.next_cs_id))?;
        met.flush().map_err(|e| CurateError::io(&paths.met, e))?;

        if !cs.models.is_empty() {
            let file = File::create(&paths.models).map_err(|e| CurateError::io(&paths.models, e))?;
            let mut out = BufWriter::new(file);
            for model in &cs.models {
                writeln!(out, "{}", model).map_err(|e| CurateError::io(&paths.models, e))?;
            }
            out.flush().map_err(|e| CurateError::io(&paths.models, e))?;
        }

        debug!(
            stem = %cs.nepc_filename,
            cs_id = ids.next_cs_id,
            points = cs.data.len(),
            "Wrote cross section"
        );
        Ok(ids.advance(cs.data.len()))
    }
}

fn table_writer(path: &Path) -> Result<csv::Writer<File>> {
    let file = File::create(path).map_err(|e| CurateError::io(path, e))?;
    Ok(csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(file))
}

fn or_null(value: Option<String>) -> String {
    value.unwrap_or_else(|| NULL_MARKER.to_string())
}

/// The `.met` row, in loader column order. The threshold is written in eV.
pub(crate) fn metadata_row(cs: &CrossSection, cs_id: i64) -> Vec<String> {
    let int = |v: Option<i64>| or_null(v.map(|n| n.to_string()));
    let float = |v: Option<f64>| or_null(v.map(format_float));

    vec![
        cs_id.to_string(),
        cs.specie.clone(),
        cs.process.clone(),
        format_float(cs.units_e),
        format_float(cs.units_sigma),
        or_null(cs.reference.clone()),
        or_null(cs.lhs_a.clone()),
        or_null(cs.lhs_b.clone()),
        or_null(cs.rhs_a.clone()),
        or_null(cs.rhs_b.clone()),
        int(cs.lhs_v),
        int(cs.rhs_v),
        int(cs.lhs_j),
        int(cs.rhs_j),
        float(cs.threshold.map(|t| t * cs.units_e)),
        or_null(cs.background.clone()),
        float(cs.lpu),
        float(cs.upu),
    ]
}
