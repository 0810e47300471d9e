//! Curation of one cross section summed from already-curated ones.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::DataPaths;
use crate::error::{CurateError, Result};
use crate::record::{CrossSection, CrossSectionBuilder, CrossSectionStore, FieldValue, StoredCrossSection};

use super::lumping::lump;
use super::rules::RuleSet;
use super::template::{CurationJob, CurationStrategy};

/// Sums the cross sections `cs_ids` from a store into one record named `name`.
///
/// The lumped record takes `specie`, `units_e` and `units_sigma` from its
/// inputs (which must agree), the smallest input threshold, and the
/// comma-joined input references. Everything else, `process` included,
/// comes from the job's augment rules.
pub struct LumpedCuration<'a> {
    store: &'a dyn CrossSectionStore,
    cs_ids: Vec<i64>,
    name: String,
    fetched: Vec<StoredCrossSection>,
}

impl<'a> LumpedCuration<'a> {
    pub fn new(store: &'a dyn CrossSectionStore, cs_ids: Vec<i64>, name: impl Into<String>) -> Self {
        Self {
            store,
            cs_ids,
            name: name.into(),
            fetched: Vec::new(),
        }
    }
}

impl CurationStrategy for LumpedCuration<'_> {
    type Raw = StoredCrossSection;

    fn name(&self) -> &str {
        "lumped"
    }

    fn initialize_input(&mut self, _paths: &DataPaths, _job: &CurationJob) -> Result<Vec<PathBuf>> {
        if self.cs_ids.is_empty() {
            return Err(CurateError::Config("lumping needs at least one cs_id".to_string()));
        }
        self.fetched = self.store.fetch_all(&self.cs_ids)?;
        Ok(self.fetched.iter().map(|s| s.path.clone()).collect())
    }

    fn read(&mut self, input: &Path, _job: &CurationJob) -> Result<Vec<StoredCrossSection>> {
        let Some(pos) = self.fetched.iter().position(|s| s.path == input) else {
            return Ok(Vec::new());
        };
        Ok(vec![self.fetched.remove(pos)])
    }

    fn augment(&mut self, raw: Vec<StoredCrossSection>, job: &CurationJob) -> Result<Vec<CrossSection>> {
        let inputs: Vec<CrossSection> = raw.into_iter().map(|s| s.cross_section).collect();
        let lumped = lump(&inputs)?;
        let Some(first) = inputs.first() else {
            return Ok(Vec::new());
        };
        info!(name = %self.name, inputs = inputs.len(), points = lumped.data.len(), "Lumped cross sections");

        let mut builder = CrossSectionBuilder::new();
        builder.set("specie", &FieldValue::Text(first.specie.clone()))?;
        builder.set("units_e", &FieldValue::Float(first.units_e))?;
        builder.set("units_sigma", &FieldValue::Float(first.units_sigma))?;
        if let Some(threshold) = lumped.threshold {
            builder.set("threshold", &FieldValue::Float(threshold))?;
        }
        if let Some(reference) = lumped.reference.or_else(|| job.config.reference.clone()) {
            builder.set("ref", &FieldValue::Text(reference))?;
        }
        if !job.config.models.is_empty() {
            builder.set("models", &FieldValue::List(job.config.models.clone()))?;
        }
        builder.set("nepc_filename", &FieldValue::Text(self.name.clone()))?;
        builder.set_data(lumped.data);

        RuleSet::compile(&job.config.rules)?.apply(&mut builder)?;
        Ok(vec![builder.build()?])
    }
}
