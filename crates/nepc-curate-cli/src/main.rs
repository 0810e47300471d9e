//! nepc-curate CLI - cross-section curation driver.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use nepc_curate::DataPaths;
use tracing_subscriber::prelude::*;

fn init_logging(verbose: bool) {
    let default = if verbose {
        "nepc_curate=debug,nepc_curate_cli=debug"
    } else {
        "nepc_curate=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let paths = DataPaths::from_home(&cli.data_home);

    let result = match cli.command {
        Commands::Lxcat { run, no_arg } => commands::curate::lxcat(&paths, run, no_arg, cli.json),

        Commands::Generated { run, description } => {
            commands::curate::generated(&paths, run, description, cli.json)
        }

        Commands::Qdb { run } => commands::curate::qdb(&paths, run, cli.json),

        Commands::Lumped { run, ids, name } => {
            commands::lumped::run(&paths, run, ids, name, cli.json)
        }

        Commands::Ids { action } => commands::ids::run(&paths, action, cli.json),

        Commands::Show { cs_id, data } => commands::show::run(&paths, cs_id, data, cli.json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
