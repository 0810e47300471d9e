//! Integration tests for curation runs against a data home on disk.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use nepc_curate::{
    AugmentRule, CrossSectionStore, CurateError, CurationConfig, CurationJob, CurationSummary,
    Curator, DataPaths, DirectoryStore, IdAllocator, IdCounters, LumpedCuration, LxcatCuration,
};

const EXCITATION_V1: &str = "\
EXCITATION
N2(X1Sigmag+) -> v1
 0.29
SPECIES: e / N2
PROCESS: E + N2 -> E + N2(v1), Excitation
-----------------------------
 0.0\t0.0
 0.5\t0.0
 1.0\t2.0e-20
 2.0\t1.0e-20
 3.0\t0.0
-----------------------------
";

/// Data home with initialized id counters.
fn data_home() -> (TempDir, DataPaths) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let paths = DataPaths::from_home(dir.path());
    IdAllocator::new(&paths.id_file)
        .store(IdCounters::INITIAL)
        .expect("Failed to initialize id counters");
    (dir, paths)
}

fn write_input(paths: &DataPaths, species: &str, title: &str, file: &str, content: &str) {
    let dir = paths.input_dir("lxcat", species, title);
    fs::create_dir_all(&dir).expect("Failed to create input dir");
    fs::write(dir.join(file), content).expect("Failed to write input");
}

fn vibrational_config() -> CurationConfig {
    CurationConfig::default().with_model("fict").with_rule(
        AugmentRule::new()
            .matching("product", "^v1$")
            .setting("rhs_a", "N2(X1Sigmag+)")
            .setting("lhs_v", 0i64)
            .setting("rhs_v", 1i64),
    )
}

fn read_table(path: &Path) -> Vec<Vec<String>> {
    fs::read_to_string(path)
        .expect("Failed to read output")
        .lines()
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

fn curate_lxcat(
    paths: &DataPaths,
    title: &str,
    config: CurationConfig,
) -> nepc_curate::Result<CurationSummary> {
    Curator::new(paths.clone()).curate(
        &mut LxcatCuration::new(),
        &CurationJob::new("N2", title, config),
        |_| false,
    )
}

// =============================================================================
// LXCat End-to-End Tests
// =============================================================================

#[test]
fn test_lxcat_excitation_end_to_end() {
    let (_dir, paths) = data_home();
    write_input(&paths, "N2", "fict", "phelps.txt", EXCITATION_V1);

    let summary = curate_lxcat(&paths, "fict", vibrational_config()).expect("Curation failed");

    assert_eq!(summary.strategy, "lxcat");
    assert_eq!(summary.records, 1);
    assert_eq!(summary.points, 2);
    assert_eq!(summary.cs_ids(), 1..2);
    assert_eq!(summary.csdata_ids(), 1..3);
    assert!(summary.persisted);
    assert_eq!(summary.inputs.len(), 1);
    assert_eq!(summary.inputs[0].records, 1);
    assert!(summary.inputs[0].hash.starts_with("sha256:"));

    let out = paths.output_dir_for("N2", "fict");
    let dat = read_table(&out.join("phelps_0.dat"));
    assert_eq!(
        dat,
        vec![
            vec!["1".to_string(), "1".to_string(), "2e-20".to_string()],
            vec!["2".to_string(), "2".to_string(), "1e-20".to_string()],
        ]
    );

    let met = read_table(&out.join("phelps_0.met"));
    assert_eq!(met.len(), 1);
    let row = &met[0];
    assert_eq!(row[0], "1");
    assert_eq!(row[1], "N2");
    assert!(row[2].contains("excitation"));
    assert_eq!(row[6], "N2(X1Sigmag+)");
    assert_eq!(row[8], "N2(X1Sigmag+)");
    assert_eq!(row[10], "0");
    assert_eq!(row[11], "1");

    let models = fs::read_to_string(out.join("phelps_0.mod")).expect("Missing .mod file");
    assert_eq!(models.trim(), "fict");

    let next = IdAllocator::new(&paths.id_file).load().unwrap();
    assert_eq!(next, IdCounters::new(2, 3));
}

#[test]
fn test_curated_record_reads_back() {
    let (_dir, paths) = data_home();
    write_input(&paths, "N2", "fict", "phelps.txt", EXCITATION_V1);
    curate_lxcat(&paths, "fict", vibrational_config()).unwrap();

    let store = DirectoryStore::open(&paths.output_dir).unwrap();
    assert_eq!(store.len(), 1);

    let stored = store.fetch(1).unwrap();
    assert_eq!(stored.first_csdata_id, Some(1));
    let cs = stored.cross_section;
    assert_eq!(cs.specie, "N2");
    assert_eq!(cs.process, "excitation");
    assert_eq!(cs.threshold, Some(0.29));
    assert_eq!(cs.lhs_v, Some(0));
    assert_eq!(cs.rhs_v, Some(1));
    assert_eq!(cs.models, vec!["fict".to_string()]);
    assert_eq!(cs.data, vec![(1.0, 2.0e-20), (2.0, 1.0e-20)]);

    assert!(matches!(store.fetch(2), Err(CurateError::NotFound { cs_id: 2 })));
}

#[test]
fn test_unmapped_vibrational_process_fails_verification() {
    let (_dir, paths) = data_home();
    write_input(&paths, "N2", "fict", "phelps.txt", EXCITATION_V1);

    // Claims a vibrational category without setting the levels.
    let config = CurationConfig::default().with_rule(
        AugmentRule::new()
            .matching("product", "^v1$")
            .setting("process", "excitation_v"),
    );
    let err = curate_lxcat(&paths, "fict", config).unwrap_err();

    assert!(matches!(err, CurateError::AugmentMapping { .. }));
    let next = IdAllocator::new(&paths.id_file).load().unwrap();
    assert_eq!(next, IdCounters::INITIAL);
}

// =============================================================================
// ID Allocation Tests
// =============================================================================

#[test]
fn test_ids_increase_across_runs() {
    let (_dir, paths) = data_home();
    write_input(&paths, "N2", "phelps", "phelps.txt", EXCITATION_V1);
    write_input(&paths, "N2", "itikawa", "itikawa.txt", EXCITATION_V1);

    let first = curate_lxcat(&paths, "phelps", vibrational_config()).unwrap();
    let second = curate_lxcat(&paths, "itikawa", vibrational_config()).unwrap();

    assert_eq!(first.next_ids, second.first_ids);
    assert!(second.cs_ids().start >= first.cs_ids().end);
    assert!(second.csdata_ids().start >= first.csdata_ids().end);

    let store = DirectoryStore::open(&paths.output_dir).unwrap();
    assert_eq!(store.ids().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(store.fetch(2).unwrap().first_csdata_id, Some(3));
}

#[test]
fn test_rerun_replaces_output_with_new_ids() {
    let (_dir, paths) = data_home();
    write_input(&paths, "N2", "fict", "phelps.txt", EXCITATION_V1);

    curate_lxcat(&paths, "fict", vibrational_config()).unwrap();
    let rerun = curate_lxcat(&paths, "fict", vibrational_config()).unwrap();

    assert_eq!(rerun.cs_ids(), 2..3);
    let store = DirectoryStore::open(&paths.output_dir).unwrap();
    assert_eq!(store.ids().collect::<Vec<_>>(), vec![2]);
}

#[test]
fn test_debug_run_leaves_counters_alone() {
    let (_dir, paths) = data_home();
    IdAllocator::new(&paths.id_file)
        .store(IdCounters::new(40, 900))
        .unwrap();
    write_input(&paths, "N2", "fict", "phelps.txt", EXCITATION_V1);

    let summary = Curator::new(paths.clone())
        .with_debug(true)
        .curate(
            &mut LxcatCuration::new(),
            &CurationJob::new("N2", "fict", vibrational_config()),
            |_| false,
        )
        .unwrap();

    assert_eq!(summary.first_ids, IdCounters::INITIAL);
    assert!(!summary.persisted);
    let next = IdAllocator::new(&paths.id_file).load().unwrap();
    assert_eq!(next, IdCounters::new(40, 900));
}

#[test]
fn test_missing_input_dir_fails_without_output() {
    let (_dir, paths) = data_home();

    let err = curate_lxcat(&paths, "absent", vibrational_config()).unwrap_err();

    assert!(matches!(err, CurateError::NoInputFiles { .. }));
    assert!(!paths.output_dir_for("N2", "absent").exists());
}

// =============================================================================
// Lumping Tests
// =============================================================================

const TWO_LEVELS: &str = "\
EXCITATION
N2(X1Sigmag+) -> v1
 0.29
-----------------------------
 1.0\t2.0e-20
 2.0\t1.0e-20
 10.0\t5.0e-21
-----------------------------

EXCITATION
N2(X1Sigmag+) -> v2
 0.59
-----------------------------
 1.0\t2.0e-20
 2.0\t1.0e-20
 10.0\t5.0e-21
-----------------------------
";

fn vibrational_levels() -> CurationConfig {
    CurationConfig::default()
        .with_rule(
            AugmentRule::new()
                .matching("product", "^v1$")
                .setting("rhs_a", "N2(X1Sigmag+)")
                .setting("lhs_v", 0i64)
                .setting("rhs_v", 1i64),
        )
        .with_rule(
            AugmentRule::new()
                .matching("product", "^v2$")
                .setting("rhs_a", "N2(X1Sigmag+)")
                .setting("lhs_v", 0i64)
                .setting("rhs_v", 2i64),
        )
}

fn lumped_config() -> CurationConfig {
    CurationConfig::default().with_rule(
        AugmentRule::new()
            .matching("nepc_filename", "vib_sum")
            .setting("process", "excitation")
            .setting("lhs_a", "N2(X1Sigmag+)")
            .setting("rhs_a", "N2(X1Sigmag+)"),
    )
}

#[test]
fn test_lumped_sum_of_identical_levels() {
    let (_dir, paths) = data_home();
    write_input(&paths, "N2", "fict", "levels.txt", TWO_LEVELS);
    curate_lxcat(&paths, "fict", vibrational_levels()).unwrap();

    let store = DirectoryStore::open(&paths.output_dir).unwrap();
    let mut strategy = LumpedCuration::new(&store, vec![1, 2], "vib_sum");
    let summary = Curator::new(paths.clone())
        .curate(
            &mut strategy,
            &CurationJob::new("N2", "lumped", lumped_config()),
            |_| false,
        )
        .unwrap();

    assert_eq!(summary.records, 1);
    assert_eq!(summary.cs_ids(), 3..4);
    assert_eq!(summary.inputs.len(), 2);

    let lumped = DirectoryStore::open(&paths.output_dir)
        .unwrap()
        .fetch(3)
        .unwrap()
        .cross_section;
    assert_eq!(lumped.nepc_filename, "vib_sum");
    assert_eq!(lumped.process, "excitation");
    assert_eq!(lumped.specie, "N2");
    assert_eq!(lumped.threshold, Some(0.29));

    let (first_e, first_sigma) = lumped.data[0];
    assert!((first_e - 1.0).abs() < 1e-12);
    assert!((first_sigma - 4.0e-20).abs() < 1e-30);
    let (_, at_two) = lumped
        .data
        .iter()
        .copied()
        .find(|(e, _)| (e - 2.0).abs() < 0.01)
        .expect("grid covers 2 eV");
    assert!((at_two - 2.0e-20).abs() / 2.0e-20 < 0.01);
}

#[test]
fn test_lumping_rejects_mismatched_units() {
    let (_dir, paths) = data_home();
    write_input(&paths, "N2", "ev", "phelps.txt", EXCITATION_V1);
    write_input(&paths, "N2", "mev", "phelps.txt", EXCITATION_V1);
    curate_lxcat(&paths, "ev", vibrational_config()).unwrap();
    curate_lxcat(&paths, "mev", vibrational_config().with_units(1e-3, 1.0)).unwrap();

    let store = DirectoryStore::open(&paths.output_dir).unwrap();
    let mut strategy = LumpedCuration::new(&store, vec![1, 2], "vib_sum");
    let err = Curator::new(paths.clone())
        .curate(
            &mut strategy,
            &CurationJob::new("N2", "lumped", lumped_config()),
            |_| false,
        )
        .unwrap_err();

    match err {
        CurateError::Consistency { fields, .. } => assert_eq!(fields, vec!["units_e".to_string()]),
        other => panic!("expected a consistency error, got {other:?}"),
    }
    assert!(!paths.output_dir_for("N2", "lumped").join("vib_sum.met").exists());
}

#[test]
fn test_lumping_joins_differing_references() {
    let (_dir, paths) = data_home();
    write_input(&paths, "N2", "phelps", "phelps.txt", EXCITATION_V1);
    write_input(&paths, "N2", "itikawa", "itikawa.txt", EXCITATION_V1);
    curate_lxcat(&paths, "phelps", vibrational_config().with_reference("Phelps")).unwrap();
    curate_lxcat(&paths, "itikawa", vibrational_config().with_reference("Itikawa")).unwrap();

    let store = DirectoryStore::open(&paths.output_dir).unwrap();
    let mut strategy = LumpedCuration::new(&store, vec![1, 2], "vib_sum");
    Curator::new(paths.clone())
        .curate(
            &mut strategy,
            &CurationJob::new("N2", "lumped", lumped_config()),
            |_| false,
        )
        .unwrap();

    let lumped = DirectoryStore::open(&paths.output_dir)
        .unwrap()
        .fetch(3)
        .unwrap()
        .cross_section;
    assert_eq!(lumped.reference.as_deref(), Some("Phelps,Itikawa"));
}

// =============================================================================
// Energy Unit Tests
// =============================================================================

const IONIZATION_MEV: &str = "\
IONIZATION
N2 -> N2^+
 15600
-----------------------------
 15600\t0.0
 20000\t1.0e-20
 100000\t2.5e-20
-----------------------------
";

#[test]
fn test_threshold_written_in_ev() {
    let (_dir, paths) = data_home();
    write_input(&paths, "N2", "mev", "ion.txt", IONIZATION_MEV);

    curate_lxcat(&paths, "mev", CurationConfig::default().with_units(1e-3, 1.0)).unwrap();

    let met = read_table(&paths.output_dir_for("N2", "mev").join("ion_0.met"));
    let row = &met[0];
    assert_eq!(row[3], "0.001");
    let threshold: f64 = row[14].parse().unwrap();
    assert!((threshold - 15.6).abs() < 1e-9);

    let cs = DirectoryStore::open(&paths.output_dir)
        .unwrap()
        .fetch(1)
        .unwrap()
        .cross_section;
    assert_eq!(cs.units_e, 1e-3);
    let stored = cs.threshold.expect("threshold read back");
    assert!((stored - 15600.0).abs() < 1e-6);
}
