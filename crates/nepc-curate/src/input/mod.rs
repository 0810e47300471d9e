//! Source formats: LXCat text files, QDB descriptions and generated-data descriptions.

pub mod generated;
pub mod lxcat;
pub mod qdb;
mod record;
mod table;

pub use generated::{GeneratedEntry, GeneratedSource};
pub use lxcat::{parse_file, LxcatParser};
pub use qdb::{units_factor, QdbDescription, Quantity};
pub use record::{ProcessKind, RawProcessRecord};
pub use table::read_pairs;
