//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// nepc-curate: curate electron-impact cross sections into NEPC records
#[derive(Parser)]
#[command(name = "nepc-curate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data home holding raw/ inputs and cs/ outputs
    #[arg(long, global = true, env = "NEPC_DATA_HOME", default_value = ".")]
    pub data_home: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Arguments shared by every curation command.
#[derive(Args, Clone)]
pub struct RunArgs {
    /// Species directory, e.g. N2
    #[arg(value_name = "SPECIES")]
    pub species: String,

    /// Title directory, e.g. fict
    #[arg(value_name = "TITLE")]
    pub title: String,

    /// Job config (.toml or .json) with units, models and augment rules
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Reset the ID counters to (1, 1) first (asks for confirmation)
    #[arg(long)]
    pub reset: bool,

    /// Start ids at (1, 1) and do not persist the counters
    #[arg(long)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Curate LXCat files from raw/lxcat/<SPECIES>/<TITLE>/
    Lxcat {
        #[command(flatten)]
        run: RunArgs,

        /// Blocks have no argument line
        #[arg(long)]
        no_arg: bool,
    },

    /// Curate the entries of a generated-data description
    Generated {
        #[command(flatten)]
        run: RunArgs,

        /// Description file (TOML)
        #[arg(short, long, value_name = "FILE")]
        description: PathBuf,
    },

    /// Curate QDB datasets from raw/qdb/<SPECIES>/<TITLE>/
    Qdb {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Sum stored cross sections into one lumped record
    Lumped {
        #[command(flatten)]
        run: RunArgs,

        /// cs_ids to lump (default: the config's [lumped] section)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<i64>,

        /// Output name of the lumped record
        #[arg(long)]
        name: Option<String>,
    },

    /// Inspect or reset the persistent ID counters
    Ids {
        #[command(subcommand)]
        action: IdsAction,
    },

    /// Show a stored cross section by cs_id
    Show {
        /// Cross section id
        #[arg(value_name = "CS_ID")]
        cs_id: i64,

        /// Print every data point
        #[arg(long)]
        data: bool,
    },
}

#[derive(Subcommand, Clone, Copy)]
pub enum IdsAction {
    /// Print the next cs_id and csdata_id
    Show,
    /// Reset the counters to (1, 1)
    Reset,
}
