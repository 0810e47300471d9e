//! Curation commands - run a strategy and report what was written.

use std::path::PathBuf;

use colored::Colorize;
use nepc_curate::{
    CurationConfig, CurationJob, CurationStrategy, CurationSummary, Curator, DataPaths,
    GeneratedCuration, LxcatCuration, QdbCuration,
};
use tracing::debug;

use super::confirm;
use crate::cli::RunArgs;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub fn lxcat(paths: &DataPaths, args: RunArgs, no_arg: bool, json_output: bool) -> CommandResult {
    let mut job = job(&args)?;
    if no_arg {
        job.config.has_arg = false;
    }
    execute(paths, &args, &mut LxcatCuration::new(), &job, json_output)
}

pub fn generated(
    paths: &DataPaths,
    args: RunArgs,
    description: PathBuf,
    json_output: bool,
) -> CommandResult {
    let job = job(&args)?;
    execute(paths, &args, &mut GeneratedCuration::new(description), &job, json_output)
}

pub fn qdb(paths: &DataPaths, args: RunArgs, json_output: bool) -> CommandResult {
    let job = job(&args)?;
    execute(paths, &args, &mut QdbCuration::new(), &job, json_output)
}

/// Build the job from the command line and optional config file.
pub(crate) fn job(args: &RunArgs) -> Result<CurationJob, Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => {
            let config = CurationConfig::load(path)?;
            debug!(
                config = %path.display(),
                rules = config.rules.len(),
                "Loaded job config"
            );
            config
        }
        None => CurationConfig::default(),
    };
    Ok(CurationJob::new(&args.species, &args.title, config))
}

/// Run one strategy through the curator and print the summary.
pub(crate) fn execute<S: CurationStrategy>(
    paths: &DataPaths,
    args: &RunArgs,
    strategy: &mut S,
    job: &CurationJob,
    json_output: bool,
) -> CommandResult {
    let curator = Curator::new(paths.clone())
        .with_reset(args.reset)
        .with_debug(args.debug);

    let summary = curator.curate(strategy, job, confirm)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &CurationSummary) {
    println!(
        "{} {} {}/{}",
        "Curated".green().bold(),
        summary.strategy.cyan(),
        summary.species.white().bold(),
        summary.title.white().bold()
    );
    println!();

    println!("{}", "Inputs:".yellow().bold());
    for input in &summary.inputs {
        println!(
            "  {} ({} records) {}",
            input.path.display(),
            input.records,
            input.hash.dimmed()
        );
    }
    println!();

    println!("{}", "Output:".yellow().bold());
    println!("  Directory:    {}", summary.output_dir.display());
    println!("  Records:      {}", summary.records.to_string().white().bold());
    println!("  Data points:  {}", summary.points.to_string().white());

    let cs_ids = summary.cs_ids();
    let csdata_ids = summary.csdata_ids();
    if !cs_ids.is_empty() {
        println!("  cs_id:        {}..={}", cs_ids.start, cs_ids.end - 1);
    }
    if !csdata_ids.is_empty() {
        println!("  csdata_id:    {}..={}", csdata_ids.start, csdata_ids.end - 1);
    }
    println!();

    if summary.persisted {
        println!(
            "Next ids: {} / {}",
            summary.next_ids.next_cs_id.to_string().cyan(),
            summary.next_ids.next_csdata_id.to_string().cyan()
        );
    } else {
        println!(
            "{}",
            "Debug run: ID counters were not saved.".yellow()
        );
    }
    println!(
        "Finished in {} ms",
        (summary.finished_at - summary.started_at).num_milliseconds()
    );
}
