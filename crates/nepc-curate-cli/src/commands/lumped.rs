//! Lumped command - sum stored cross sections into one record.

use nepc_curate::{DataPaths, DirectoryStore, LumpedCuration};
use tracing::debug;

use super::curate::{execute, job};
use crate::cli::RunArgs;

pub fn run(
    paths: &DataPaths,
    args: RunArgs,
    ids: Vec<i64>,
    name: Option<String>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let job = job(&args)?;

    // Command-line ids and name win over the config's [lumped] section
    let section = job.config.lumped.clone().unwrap_or_default();
    let ids = if ids.is_empty() { section.cs_ids } else { ids };
    let name = name
        .or_else(|| (!section.name.is_empty()).then_some(section.name))
        .unwrap_or_else(|| format!("{}_{}_lumped", args.species, args.title));

    let store = DirectoryStore::open(&paths.output_dir)?;
    debug!(records = store.len(), "Opened cross-section store");

    let mut strategy = LumpedCuration::new(&store, ids, name);
    execute(paths, &args, &mut strategy, &job, json_output)
}
