//! The fixed curation sequence and the strategy hooks it calls.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::{CurationConfig, DataPaths};
use crate::error::{CurateError, Result};
use crate::record::{CrossSection, CrossSectionBuilder, FieldValue, RecordWriter};

use super::ids::{reset_declined, IdAllocator, IdCounters};

/// What to curate: a species/title pair and the job settings.
#[derive(Debug, Clone)]
pub struct CurationJob {
    pub species: String,
    pub title: String,
    pub config: CurationConfig,
}

impl CurationJob {
    pub fn new(species: impl Into<String>, title: impl Into<String>, config: CurationConfig) -> Self {
        Self {
            species: species.into(),
            title: title.into(),
            config,
        }
    }

    /// Set `units_e`, `units_sigma`, `models` and a default `ref` from the job config.
    pub(crate) fn apply_defaults(&self, builder: &mut CrossSectionBuilder) -> Result<()> {
        builder.set("units_e", &FieldValue::Float(self.config.units_e))?;
        builder.set("units_sigma", &FieldValue::Float(self.config.units_sigma))?;
        if !self.config.models.is_empty() {
            builder.set("models", &FieldValue::List(self.config.models.clone()))?;
        }
        if let Some(reference) = &self.config.reference {
            builder.set("ref", &FieldValue::Text(reference.clone()))?;
        }
        Ok(())
    }
}

/// Source-specific steps of a curation run.
///
/// [`Curator::curate`] calls them in a fixed order; a strategy only decides
/// what each step does.
pub trait CurationStrategy {
    /// Raw data produced by [`read`](Self::read).
    type Raw;

    /// Source name, also the directory under `raw/` holding its inputs.
    fn name(&self) -> &str;

    /// Enumerate input files. Must fail with [`CurateError::NoInputFiles`]
    /// rather than return an empty list.
    fn initialize_input(&mut self, paths: &DataPaths, job: &CurationJob) -> Result<Vec<PathBuf>> {
        discover_inputs(
            &paths.input_dir(self.name(), &job.species, &job.title),
            &job.config.extension,
        )
    }

    /// Read one input file.
    fn read(&mut self, input: &Path, job: &CurationJob) -> Result<Vec<Self::Raw>>;

    /// Clean raw data in place. No-op by default.
    fn clean(&mut self, _raw: &mut [Self::Raw]) -> Result<()> {
        Ok(())
    }

    /// Turn raw data into complete cross sections.
    fn augment(&mut self, raw: Vec<Self::Raw>, job: &CurationJob) -> Result<Vec<CrossSection>>;

    /// Check augmented records. No-op by default.
    fn verify(&self, _records: &[CrossSection], _job: &CurationJob) -> Result<()> {
        Ok(())
    }
}

/// Files in `dir` with the given extension, sorted by name.
pub fn discover_inputs(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if dir.is_dir() {
        for entry in fs::read_dir(dir).map_err(|e| CurateError::io(dir, e))? {
            let path = entry.map_err(|e| CurateError::io(dir, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
                files.push(path);
            }
        }
    }

    if files.is_empty() {
        return Err(CurateError::NoInputFiles {
            dir: dir.to_path_buf(),
        });
    }
    files.sort();
    Ok(files)
}

/// An input file consumed by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    pub path: PathBuf,
    /// SHA-256 of the file contents.
    pub hash: String,
    /// Raw records read from it.
    pub records: usize,
}

impl InputFile {
    fn hash(path: &Path) -> Result<Self> {
        let contents = fs::read(path).map_err(|e| CurateError::io(path, e))?;
        let mut hasher = Sha256::new();
        hasher.update(&contents);
        Ok(Self {
            path: path.to_path_buf(),
            hash: format!("sha256:{:x}", hasher.finalize()),
            records: 0,
        })
    }
}

/// What a run wrote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationSummary {
    pub strategy: String,
    pub species: String,
    pub title: String,
    pub output_dir: PathBuf,
    pub records: usize,
    pub points: usize,
    /// Counters when the run started.
    pub first_ids: IdCounters,
    /// Counters after the last record.
    pub next_ids: IdCounters,
    /// Whether counters were persisted.
    pub persisted: bool,
    pub inputs: Vec<InputFile>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CurationSummary {
    /// `cs_id`s written, as a half-open range.
    pub fn cs_ids(&self) -> std::ops::Range<i64> {
        self.first_ids.next_cs_id..self.next_ids.next_cs_id
    }

    /// `csdata_id`s written, as a half-open range.
    pub fn csdata_ids(&self) -> std::ops::Range<i64> {
        self.first_ids.next_csdata_id..self.next_ids.next_csdata_id
    }
}

/// Drives a strategy through the curation sequence.
///
/// ```no_run
/// use nepc_curate::{CurationConfig, CurationJob, Curator, DataPaths, LxcatCuration};
///
/// let curator = Curator::new(DataPaths::from_home("/data/nepc"));
/// let job = CurationJob::new("N2", "fict", CurationConfig::default());
/// let summary = curator.curate(&mut LxcatCuration::new(), &job, |_| false).unwrap();
/// println!("wrote {} cross sections", summary.records);
/// ```
#[derive(Debug, Clone)]
pub struct Curator {
    paths: DataPaths,
    reset: bool,
    debug: bool,
}

impl Curator {
    pub fn new(paths: DataPaths) -> Self {
        Self {
            paths,
            reset: false,
            debug: false,
        }
    }

    /// Reset the ID counters to `(1, 1)` before curating (asks for confirmation).
    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Start from `(1, 1)` without reading or persisting the ID counters.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// Run every step in order.
    ///
    /// `confirm` is asked before a reset. Any error aborts the run before
    /// the ID counters are persisted.
    pub fn curate<S: CurationStrategy>(
        &self,
        strategy: &mut S,
        job: &CurationJob,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<CurationSummary> {
        let started_at = Utc::now();
        info!(strategy = strategy.name(), species = %job.species, title = %job.title, "Starting curation");

        let first_ids = self.initialize_db(confirm)?;
        let inputs = strategy.initialize_input(&self.paths, job)?;
        // Hash before the output directory is recreated; inputs may live there.
        let mut provenance = inputs
            .iter()
            .map(|input| InputFile::hash(input))
            .collect::<Result<Vec<_>>>()?;
        let output_dir = self.initialize_output(job)?;

        // Read
        let mut raw = Vec::new();
        for (input, file) in inputs.iter().zip(&mut provenance) {
            let records = strategy.read(input, job)?;
            file.records = records.len();
            raw.extend(records);
        }
        debug!(records = raw.len(), "Read raw data");

        // Clean, augment and verify
        strategy.clean(&mut raw)?;
        let records = strategy.augment(raw, job)?;
        strategy.verify(&records, job)?;
        check_unique_names(&records)?;

        // Write
        let writer = RecordWriter::new(&output_dir);
        let mut next_ids = first_ids;
        for record in &records {
            next_ids = writer.write(record, next_ids)?;
        }

        let persisted = self.finalize(next_ids)?;
        let summary = CurationSummary {
            strategy: strategy.name().to_string(),
            species: job.species.clone(),
            title: job.title.clone(),
            output_dir,
            records: records.len(),
            points: records.iter().map(|r| r.data.len()).sum(),
            first_ids,
            next_ids,
            persisted,
            inputs: provenance,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            records = summary.records,
            points = summary.points,
            next_cs_id = next_ids.next_cs_id,
            next_csdata_id = next_ids.next_csdata_id,
            "Curation complete"
        );
        Ok(summary)
    }

    fn initialize_db(&self, confirm: impl FnOnce(&str) -> bool) -> Result<IdCounters> {
        let allocator = IdAllocator::new(&self.paths.id_file);
        if self.reset {
            if self.debug {
                // Debug runs never touch the state file.
                return Err(if confirm(&allocator.reset_prompt()) {
                    CurateError::Config("cannot reset ID counters in debug mode".to_string())
                } else {
                    reset_declined()
                });
            }
            return allocator.reset(confirm);
        }
        if self.debug {
            debug!("Debug run, starting ids at (1, 1)");
            return Ok(IdCounters::INITIAL);
        }
        allocator.load()
    }

    /// Delete and recreate the output directory for the job.
    fn initialize_output(&self, job: &CurationJob) -> Result<PathBuf> {
        let dir = self.paths.output_dir_for(&job.species, &job.title);
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| CurateError::io(&dir, e))?;
        }
        fs::create_dir_all(&dir).map_err(|e| CurateError::io(&dir, e))?;
        debug!(dir = %dir.display(), "Output directory ready");
        Ok(dir)
    }

    fn finalize(&self, next_ids: IdCounters) -> Result<bool> {
        if self.debug {
            warn!(
                next_cs_id = next_ids.next_cs_id,
                next_csdata_id = next_ids.next_csdata_id,
                "Debug run, ID counters not persisted"
            );
            return Ok(false);
        }
        IdAllocator::new(&self.paths.id_file).store(next_ids)?;
        Ok(true)
    }
}

fn check_unique_names(records: &[CrossSection]) -> Result<()> {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.nepc_filename.as_str()) {
            return Err(CurateError::Config(format!(
                "two cross sections share the output name '{}'",
                record.nepc_filename
            )));
        }
    }
    Ok(())
}

/// Species part of a state label, e.g. `N2` for `N2(X1Sigmag+)`.
pub(crate) fn base_species(label: &str) -> &str {
    label.split('(').next().unwrap_or(label).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Strategy over `<name>.txt` files whose lines are `energy sigma`.
    struct Lines;

    impl CurationStrategy for Lines {
        type Raw = (String, Vec<(f64, f64)>);

        fn name(&self) -> &str {
            "lines"
        }

        fn read(&mut self, input: &Path, _job: &CurationJob) -> Result<Vec<Self::Raw>> {
            let stem = input.file_stem().unwrap().to_string_lossy().into_owned();
            Ok(vec![(stem, crate::input::read_pairs(input)?)])
        }

        fn augment(&mut self, raw: Vec<Self::Raw>, job: &CurationJob) -> Result<Vec<CrossSection>> {
            raw.into_iter()
                .map(|(stem, data)| {
                    let mut b = CrossSectionBuilder::new();
                    job.apply_defaults(&mut b)?;
                    b.set("specie", &job.species.as_str().into())?;
                    b.set("process", &"elastic".into())?;
                    b.set("nepc_filename", &stem.as_str().into())?;
                    b.set_data(data);
                    b.build()
                })
                .collect()
        }
    }

    fn setup(files: &[(&str, &str)]) -> (TempDir, DataPaths) {
        let home = TempDir::new().unwrap();
        let paths = DataPaths::from_home(home.path());
        let input = paths.input_dir("lines", "Ar", "t");
        fs::create_dir_all(&input).unwrap();
        for (name, body) in files {
            fs::write(input.join(name), body).unwrap();
        }
        (home, paths)
    }

    fn job() -> CurationJob {
        CurationJob::new("Ar", "t", CurationConfig::default())
    }

    #[test]
    fn test_curate_writes_and_persists() {
        let (_home, paths) = setup(&[("a.txt", "1 1\n2 2\n"), ("b.txt", "1 3\n"), ("skip.dat", "")]);
        IdAllocator::new(&paths.id_file).store(IdCounters::new(5, 50)).unwrap();

        let summary = Curator::new(paths.clone())
            .curate(&mut Lines, &job(), |_| panic!("no prompt expected"))
            .unwrap();

        assert_eq!(summary.records, 2);
        assert_eq!(summary.points, 3);
        assert_eq!(summary.cs_ids(), 5..7);
        assert_eq!(summary.csdata_ids(), 50..53);
        assert_eq!(summary.inputs.len(), 2);
        assert!(summary.inputs[0].hash.starts_with("sha256:"));
        assert!(summary.persisted);
        assert_eq!(IdAllocator::new(&paths.id_file).load().unwrap(), IdCounters::new(7, 53));
        assert!(paths.output_dir_for("Ar", "t").join("b.met").exists());
    }

    #[test]
    fn test_no_inputs_leaves_output_alone() {
        let (_home, paths) = setup(&[]);
        IdAllocator::new(&paths.id_file).store(IdCounters::INITIAL).unwrap();
        let out = paths.output_dir_for("Ar", "t");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("keep.met"), "").unwrap();

        let err = Curator::new(paths).curate(&mut Lines, &job(), |_| false).unwrap_err();
        assert!(matches!(err, CurateError::NoInputFiles { .. }));
        assert!(out.join("keep.met").exists());
    }

    #[test]
    fn test_output_directory_recreated() {
        let (_home, paths) = setup(&[("a.txt", "1 1\n")]);
        IdAllocator::new(&paths.id_file).store(IdCounters::INITIAL).unwrap();
        let out = paths.output_dir_for("Ar", "t");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("stale.met"), "").unwrap();

        Curator::new(paths).curate(&mut Lines, &job(), |_| false).unwrap();
        assert!(!out.join("stale.met").exists());
        assert!(out.join("a.dat").exists());
    }

    #[test]
    fn test_error_does_not_advance_counters() {
        let (_home, paths) = setup(&[("a.txt", "1 1\nnot numbers\n")]);
        IdAllocator::new(&paths.id_file).store(IdCounters::new(3, 30)).unwrap();

        assert!(Curator::new(paths.clone()).curate(&mut Lines, &job(), |_| false).is_err());
        assert_eq!(IdAllocator::new(&paths.id_file).load().unwrap(), IdCounters::new(3, 30));
    }

    #[test]
    fn test_debug_run_not_persisted() {
        let (_home, paths) = setup(&[("a.txt", "1 1\n")]);

        let summary = Curator::new(paths.clone())
            .with_debug(true)
            .curate(&mut Lines, &job(), |_| false)
            .unwrap();
        assert_eq!(summary.first_ids, IdCounters::INITIAL);
        assert!(!summary.persisted);
        assert!(!paths.id_file.exists());
    }

    #[test]
    fn test_reset_and_debug_conflict() {
        let (_home, paths) = setup(&[("a.txt", "1 1\n")]);
        let curator = Curator::new(paths.clone()).with_reset(true).with_debug(true);

        match curator.curate(&mut Lines, &job(), |_| true) {
            Err(CurateError::Config(message)) => assert!(message.contains("debug")),
            other => panic!("expected usage error, got {:?}", other.map(|s| s.records)),
        }
        assert!(!paths.id_file.exists());
    }

    #[test]
    fn test_reset_confirmed() {
        let (_home, paths) = setup(&[("a.txt", "1 1\n")]);
        IdAllocator::new(&paths.id_file).store(IdCounters::new(40, 400)).unwrap();

        let summary = Curator::new(paths.clone())
            .with_reset(true)
            .curate(&mut Lines, &job(), |_| true)
            .unwrap();
        assert_eq!(summary.cs_ids(), 1..2);
        assert_eq!(IdAllocator::new(&paths.id_file).load().unwrap(), IdCounters::new(2, 2));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let a = CrossSectionBuilder::new();
        let mut records = Vec::new();
        for _ in 0..2 {
            let mut b = a.clone();
            b.set("specie", &"Ar".into()).unwrap();
            b.set("process", &"elastic".into()).unwrap();
            b.set("units_e", &1.0.into()).unwrap();
            b.set("units_sigma", &1.0.into()).unwrap();
            b.set("nepc_filename", &"same".into()).unwrap();
            records.push(b.build().unwrap());
        }
        assert!(check_unique_names(&records).is_err());
    }

    #[test]
    fn test_base_species() {
        assert_eq!(base_species("N2(X1Sigmag+)"), "N2");
        assert_eq!(base_species("Ar"), "Ar");
        assert_eq!(base_species("O2 (a1Deltag)"), "O2");
    }
}
