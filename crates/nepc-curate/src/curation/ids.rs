//! Persistent id counters shared by every curation run.
//!
//! The state file holds a single tab-delimited row
//! `next_cs_id<TAB>next_csdata_id`. It is read when a run starts and
//! overwritten when it finishes. There is no locking: curation runs must
//! not execute concurrently.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CurateError, Result};

/// Next free cross-section id and data-point id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdCounters {
    pub next_cs_id: i64,
    pub next_csdata_id: i64,
}

impl IdCounters {
    /// Counters of an empty database.
    pub const INITIAL: IdCounters = IdCounters {
        next_cs_id: 1,
        next_csdata_id: 1,
    };

    pub fn new(next_cs_id: i64, next_csdata_id: i64) -> Self {
        Self {
            next_cs_id,
            next_csdata_id,
        }
    }

    /// Counters after allocating one cross section with `points` data rows.
    pub fn advance(self, points: usize) -> Self {
        Self {
            next_cs_id: self.next_cs_id + 1,
            next_csdata_id: self.next_csdata_id + points as i64,
        }
    }
}

impl Default for IdCounters {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Reads and writes the counter state file.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    path: PathBuf,
}

impl IdAllocator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a state file exists yet.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the persisted counters.
    pub fn load(&self) -> Result<IdCounters> {
        if !self.path.exists() {
            return Err(CurateError::Config(format!(
                "ID state file '{}' not found; initialize the counters with a reset first",
                self.path.display()
            )));
        }

        let file = File::open(&self.path).map_err(|e| CurateError::io(&self.path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_reader(file);

        let record = reader
            .records()
            .next()
            .transpose()?
            .ok_or_else(|| self.corrupt("file is empty"))?;
        if record.len() != 2 {
            return Err(self.corrupt(&format!("expected 2 columns, found {}", record.len())));
        }

        let parse = |idx: usize| {
            record[idx]
                .trim()
                .parse::<i64>()
                .map_err(|e| self.corrupt(&format!("column {}: {}", idx + 1, e)))
        };
        let ids = IdCounters::new(parse(0)?, parse(1)?);
        if ids.next_cs_id < 1 || ids.next_csdata_id < 1 {
            return Err(self.corrupt("counters must be positive"));
        }
        Ok(ids)
    }

    /// Overwrite the state file with `ids`.
    pub fn store(&self, ids: IdCounters) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| CurateError::io(parent, e))?;
            }
        }

        let file = File::create(&self.path).map_err(|e| CurateError::io(&self.path, e))?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(file);
        writer.write_record([ids.next_cs_id.to_string(), ids.next_csdata_id.to_string()])?;
        writer.flush().map_err(|e| CurateError::io(&self.path, e))?;
        Ok(())
    }

    /// Question put to the operator before a reset.
    pub fn reset_prompt(&self) -> String {
        format!(
            "Reset ID counters in '{}' to (1, 1)? Previously curated ids will be reused.",
            self.path.display()
        )
    }

    /// Reset the counters to `(1, 1)` after `confirm` agrees.
    ///
    /// A declined confirmation leaves the file untouched and is an error.
    pub fn reset(&self, confirm: impl FnOnce(&str) -> bool) -> Result<IdCounters> {
        if !confirm(&self.reset_prompt()) {
            return Err(reset_declined());
        }
        self.store(IdCounters::INITIAL)?;
        warn!(path = %self.path.display(), "ID counters reset");
        Ok(IdCounters::INITIAL)
    }

    fn corrupt(&self, message: &str) -> CurateError {
        CurateError::Config(format!(
            "ID state file '{}' is malformed: {}",
            self.path.display(),
            message
        ))
    }
}

pub(crate) fn reset_declined() -> CurateError {
    CurateError::Config("ID counter reset declined".to_string())
}
