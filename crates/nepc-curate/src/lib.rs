//! nepc-curate: curation of electron-impact cross-section data.
//!
//! Raw cross sections from LXCat text files, generated-data descriptions
//! and QDB datasets are parsed, cleaned, given physical metadata by
//! ordered augment rules, verified against their process category and
//! written as flat `.met`/`.dat`/`.mod` records for the database loader.
//! Already-curated records can be summed into lumped cross sections.
//!
//! Every record gets a `cs_id` and every data point a `csdata_id` from
//! counters persisted between runs, so ids never repeat across sources.
//!
//! # Example
//!
//! ```no_run
//! use nepc_curate::{AugmentRule, CurationConfig, CurationJob, Curator, DataPaths, LxcatCuration};
//!
//! let config = CurationConfig::default().with_model("fict").with_rule(
//!     AugmentRule::new()
//!         .matching("product", "^v1$")
//!         .setting("rhs_a", "N2(X1Sigmag+)")
//!         .setting("lhs_v", 0i64)
//!         .setting("rhs_v", 1i64),
//! );
//! let job = CurationJob::new("N2", "fict", config);
//!
//! let curator = Curator::new(DataPaths::from_home("/data/nepc"));
//! let summary = curator.curate(&mut LxcatCuration::new(), &job, |_| false).unwrap();
//! println!("cs_ids {:?}", summary.cs_ids());
//! ```

pub mod config;
pub mod curation;
pub mod error;
pub mod input;
pub mod record;

pub use config::{CurationConfig, DataPaths, LumpedSection};
pub use curation::{
    AugmentRule, CurationJob, CurationStrategy, CurationSummary, Curator, GeneratedCuration,
    IdAllocator, IdCounters, LumpedCuration, LxcatCuration, ProcessCatalog, ProcessCategory,
    QdbCuration,
};
pub use error::{CurateError, Result};
pub use input::{ProcessKind, RawProcessRecord};
pub use record::{
    CrossSection, CrossSectionBuilder, CrossSectionStore, DirectoryStore, FieldValue,
    RecordWriter, StoredCrossSection, UncertaintyBounds,
};
