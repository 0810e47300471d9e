//! Curation of LXCat/BOLSIG+ text files.

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::input::{parse_file, RawProcessRecord};
use crate::record::{CrossSection, CrossSectionBuilder, FieldValue};

use super::clean::remove_zeros;
use super::process::ProcessCatalog;
use super::rules::RuleSet;
use super::template::{base_species, CurationJob, CurationStrategy};

/// Reads every `.txt` file under `raw/lxcat/<species>/<title>/`.
///
/// Each block becomes one cross section named `<file stem>_<block index>`.
/// Before the job's augment rules run, a record carries:
///
/// | field        | default                                         |
/// |--------------|-------------------------------------------------|
/// | `specie`     | target without its state, `N2` for `N2(X1Sigmag+)` |
/// | `process`    | block kind, lowercase                           |
/// | `lhs_a`      | target                                          |
/// | `rhs_a`      | target for momentum-like blocks, else product   |
/// | `background` | the `PROCESS:` comment line                     |
/// | `ref`        | job `ref`, else a `REF:` comment line           |
#[derive(Debug, Clone, Default)]
pub struct LxcatCuration;

impl LxcatCuration {
    pub fn new() -> Self {
        Self
    }
}

impl CurationStrategy for LxcatCuration {
    type Raw = RawProcessRecord;

    fn name(&self) -> &str {
        "lxcat"
    }

    fn read(&mut self, input: &Path, job: &CurationJob) -> Result<Vec<RawProcessRecord>> {
        let records = parse_file(input, job.config.has_arg)?;
        info!(file = %input.display(), blocks = records.len(), "Read LXCat file");
        Ok(records)
    }

    fn clean(&mut self, raw: &mut [RawProcessRecord]) -> Result<()> {
        for record in raw {
            remove_zeros(&mut record.data);
        }
        Ok(())
    }

    fn augment(&mut self, raw: Vec<RawProcessRecord>, job: &CurationJob) -> Result<Vec<CrossSection>> {
        let rules = RuleSet::compile(&job.config.rules)?;
        raw.iter()
            .map(|record| {
                let mut builder = defaults(record, job)?;
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

fn defaults(record: &RawProcessRecord, job: &CurationJob) -> Result<CrossSectionBuilder> {
    let mut builder = CrossSectionBuilder::from_raw(record);
    job.apply_defaults(&mut builder)?;

    let text = |value: &str| FieldValue::Text(value.to_string());
    builder.set("specie", &text(base_species(&record.target)))?;
    builder.set("process", &text(record.kind.label()))?;
    builder.set("lhs_a", &text(&record.target))?;
    if record.kind.is_momentum_like() {
        builder.set("rhs_a", &text(&record.target))?;
    } else if let Some(product) = &record.product {
        builder.set("rhs_a", &text(product))?;
    }
    if let Some(background) = record.fields.get("process") {
        builder.set("background", &text(background))?;
    }
    if let Some(reference) = record.fields.get("ref") {
        builder.set_default("ref", &text(reference))?;
    }
    builder.set(
        "nepc_filename",
        &FieldValue::Text(format!("{}_{}", record.source_stem(), record.index)),
    )?;
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CurationConfig;
    use crate::curation::AugmentRule;
    use crate::error::CurateError;
    use crate::input::ProcessKind;
    use std::path::PathBuf;

    fn record(kind: ProcessKind, target: &str, product: Option<&str>) -> RawProcessRecord {
        let mut raw = RawProcessRecord::new(kind, target);
        raw.product = product.map(str::to_string);
        raw.source = Some(PathBuf::from("/raw/lxcat/N2/fict/phelps.txt"));
        raw.index = 3;
        raw.data = vec![(1.0, 1.0e-20)];
        raw.fields.insert("process".to_string(), "E + N2 -> E + N2(v1), Excitation".to_string());
        raw
    }

    fn job(config: CurationConfig) -> CurationJob {
        CurationJob::new("N2", "fict", config)
    }

    #[test]
    fn test_default_fields() {
        let raw = record(ProcessKind::Excitation, "N2(X1Sigmag+)", Some("N2(v1)"));
        let cs = defaults(&raw, &job(CurationConfig::default().with_model("fict")))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(cs.specie, "N2");
        assert_eq!(cs.process, "excitation");
        assert_eq!(cs.lhs_a.as_deref(), Some("N2(X1Sigmag+)"));
        assert_eq!(cs.rhs_a.as_deref(), Some("N2(v1)"));
        assert_eq!(cs.background.as_deref(), Some("E + N2 -> E + N2(v1), Excitation"));
        assert_eq!(cs.nepc_filename, "phelps_3");
        assert_eq!(cs.models, vec!["fict"]);
        assert_eq!(cs.units_e, 1.0);
    }

    #[test]
    fn test_momentum_rhs_is_target() {
        let raw = record(ProcessKind::Momentum, "Ar", None);
        let cs = defaults(&raw, &job(CurationConfig::default())).unwrap().build().unwrap();
        assert_eq!(cs.rhs_a.as_deref(), Some("Ar"));
    }

    #[test]
    fn test_reference_precedence() {
        let mut raw = record(ProcessKind::Ionization, "N2", Some("N2^+"));
        raw.fields.insert("ref".to_string(), "Rapp 1965".to_string());

        let from_block = defaults(&raw, &job(CurationConfig::default())).unwrap().build().unwrap();
        assert_eq!(from_block.reference.as_deref(), Some("Rapp 1965"));

        let from_job = defaults(&raw, &job(CurationConfig::default().with_reference("Phelps")))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(from_job.reference.as_deref(), Some("Phelps"));
    }

    #[test]
    fn test_rules_then_verify() {
        let config = CurationConfig::default().with_rule(
            AugmentRule::new()
                .matching("product", "v1")
                .setting("process", "excitation_v")
                .setting("rhs_a", "N2(X1Sigmag+)")
                .setting("lhs_v", 0i64),
        );
        let job = job(config);
        let mut strategy = LxcatCuration::new();

        let records = strategy
            .augment(vec![record(ProcessKind::Excitation, "N2(X1Sigmag+)", Some("v1"))], &job)
            .unwrap();
        assert_eq!(records[0].process, "excitation_v");

        // rhs_v was never supplied.
        let err = strategy.verify(&records, &job).unwrap_err();
        assert!(matches!(err, CurateError::AugmentMapping { .. }));
    }

    #[test]
    fn test_clean_trims_every_record() {
        let mut raw = vec![record(ProcessKind::Excitation, "N2", Some("v1"))];
        raw[0].data = vec![(0.0, 0.0), (0.5, 0.0), (1.0, 2.0e-20), (3.0, 0.0)];
        LxcatCuration::new().clean(&mut raw).unwrap();
        assert_eq!(raw[0].data, vec![(1.0, 2.0e-20)]);
    }
}
