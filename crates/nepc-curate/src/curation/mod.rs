//! The curation pipeline: the fixed step sequence, its strategies and the
//! shared pieces they use.
//!
//! A run goes through `initialize_db`, `initialize_input`,
//! `initialize_output`, read, clean, augment, verify, write and `finalize`
//! in that order (see [`Curator::curate`]). Strategies fill in the
//! source-specific steps:
//!
//! - [`LxcatCuration`] for LXCat/BOLSIG+ text files
//! - [`GeneratedCuration`] for declarative generated-data descriptions
//! - [`QdbCuration`] for QDB XML descriptions with a data file
//! - [`LumpedCuration`] for sums of already-curated cross sections

mod clean;
mod generated;
mod ids;
mod lumped;
pub mod lumping;
mod lxcat;
mod process;
mod qdb;
mod rules;
mod template;

pub use clean::remove_zeros;
pub use generated::GeneratedCuration;
pub use ids::{IdAllocator, IdCounters};
pub use lumped::LumpedCuration;
pub use lumping::{lump, LumpedCurve};
pub use lxcat::LxcatCuration;
pub use process::{ProcessCatalog, ProcessCategory};
pub use qdb::{QdbCuration, QdbDataset};
pub use rules::{AugmentRule, RuleSet};
pub use template::{
    discover_inputs, CurationJob, CurationStrategy, CurationSummary, Curator, InputFile,
};
