//! Curation of QDB datasets: an XML description plus a numeric data file.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::DataPaths;
use crate::error::Result;
use crate::input::{units_factor, QdbDescription, Quantity, RawProcessRecord};
use crate::record::{CrossSection, CrossSectionBuilder, FieldValue};

use super::clean::remove_zeros;
use super::process::ProcessCatalog;
use super::rules::RuleSet;
use super::template::{base_species, discover_inputs, CurationJob, CurationStrategy};

/// One dataset read from a description.
#[derive(Debug, Clone)]
pub struct QdbDataset {
    pub description: QdbDescription,
    pub record: RawProcessRecord,
}

/// Reads every `.xml` description under `raw/qdb/<species>/<title>/`.
///
/// Units come from the description's column units rather than the job
/// config. The threshold is the smallest energy left after cleaning.
#[derive(Debug, Clone, Default)]
pub struct QdbCuration;

impl QdbCuration {
    pub fn new() -> Self {
        Self
    }
}

impl CurationStrategy for QdbCuration {
    type Raw = QdbDataset;

    fn name(&self) -> &str {
        "qdb"
    }

    fn initialize_input(&mut self, paths: &DataPaths, job: &CurationJob) -> Result<Vec<PathBuf>> {
        discover_inputs(&paths.input_dir(self.name(), &job.species, &job.title), "xml")
    }

    fn read(&mut self, input: &Path, _job: &CurationJob) -> Result<Vec<QdbDataset>> {
        let description = QdbDescription::load(input)?;
        let record = description.read_record()?;
        info!(file = %input.display(), rows = record.data.len(), "Read QDB dataset");
        Ok(vec![QdbDataset {
            description,
            record,
        }])
    }

    fn clean(&mut self, raw: &mut [QdbDataset]) -> Result<()> {
        for dataset in raw {
            remove_zeros(&mut dataset.record.data);
        }
        Ok(())
    }

    fn augment(&mut self, raw: Vec<QdbDataset>, job: &CurationJob) -> Result<Vec<CrossSection>> {
        let rules = RuleSet::compile(&job.config.rules)?;
        raw.iter()
            .map(|dataset| {
                let mut builder = defaults(dataset, job)?;
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

fn defaults(dataset: &QdbDataset, job: &CurationJob) -> Result<CrossSectionBuilder> {
    let QdbDataset {
        description,
        record,
    } = dataset;
    let text = |value: &str| FieldValue::Text(value.to_string());

    let mut builder = CrossSectionBuilder::from_raw(record);
    job.apply_defaults(&mut builder)?;
    builder.set(
        "units_e",
        &FieldValue::Float(units_factor(&description.energy_units, Quantity::Energy)?),
    )?;
    builder.set(
        "units_sigma",
        &FieldValue::Float(units_factor(&description.sigma_units, Quantity::CrossSection)?),
    )?;

    let specie = description
        .fields
        .get("specie")
        .map(String::as_str)
        .unwrap_or_else(|| base_species(&description.target));
    builder.set("specie", &text(specie))?;
    builder.set("process", &text(record.kind.label()))?;
    builder.set("lhs_a", &text(&description.target))?;
    match &description.product {
        Some(product) if !record.kind.is_momentum_like() => builder.set("rhs_a", &text(product))?,
        _ => builder.set("rhs_a", &text(&description.target))?,
    }
    if let Some(reference) = description.fields.get("ref") {
        builder.set_default("ref", &text(reference))?;
    }
    if let Some(threshold) = record.data.iter().map(|p| p.0).reduce(f64::min) {
        builder.set("threshold", &FieldValue::Float(threshold))?;
    }
    let stem = description
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| record.source_stem());
    builder.set("nepc_filename", &FieldValue::Text(stem))?;
    Ok(builder)
}
