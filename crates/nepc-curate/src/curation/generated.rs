//! Curation of generated data from a declarative description.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::DataPaths;
use crate::error::{CurateError, Result};
use crate::input::{GeneratedEntry, GeneratedSource};
use crate::record::{CrossSection, CrossSectionBuilder, FieldValue};

use super::process::ProcessCatalog;
use super::rules::RuleSet;
use super::template::{CurationJob, CurationStrategy};

/// Curates the entries of one description file.
///
/// The description is named directly; there is no directory discovery.
/// Description defaults are applied first, then the entry's own fields,
/// then the job's augment rules.
#[derive(Debug, Clone)]
pub struct GeneratedCuration {
    description: PathBuf,
}

impl GeneratedCuration {
    pub fn new(description: impl Into<PathBuf>) -> Self {
        Self {
            description: description.into(),
        }
    }

    pub fn description(&self) -> &Path {
        &self.description
    }
}

impl CurationStrategy for GeneratedCuration {
    type Raw = GeneratedEntry;

    fn name(&self) -> &str {
        "generated"
    }

    fn initialize_input(&mut self, _paths: &DataPaths, _job: &CurationJob) -> Result<Vec<PathBuf>> {
        if !self.description.is_file() {
            return Err(CurateError::NoInputFiles {
                dir: self.description.clone(),
            });
        }
        Ok(vec![self.description.clone()])
    }

    fn read(&mut self, input: &Path, _job: &CurationJob) -> Result<Vec<GeneratedEntry>> {
        let source = GeneratedSource::load(input)?;
        info!(file = %input.display(), entries = source.entries.len(), "Read generated description");

        Ok(source
            .entries
            .into_iter()
            .map(|mut entry| {
                let mut fields = source.defaults.clone();
                fields.extend(entry.fields);
                entry.fields = fields;
                entry
            })
            .collect())
    }

    fn augment(&mut self, raw: Vec<GeneratedEntry>, job: &CurationJob) -> Result<Vec<CrossSection>> {
        let rules = RuleSet::compile(&job.config.rules)?;
        raw.into_iter()
            .map(|entry| {
                let mut builder = CrossSectionBuilder::new();
                job.apply_defaults(&mut builder)?;
                for (field, value) in &entry.fields {
                    builder.set(field, value)?;
                }
                builder.set("nepc_filename", &FieldValue::Text(entry.name))?;
                builder.set_data(entry.data);
                rules.apply(&mut builder)?;
                builder.build()
            })
            .collect()
    }

    fn verify(&self, records: &[CrossSection], job: &CurationJob) -> Result<()> {
        let catalog = ProcessCatalog::with_categories(&job.config.processes);
        records.iter().try_for_each(|cs| catalog.verify(cs))
    }
}
