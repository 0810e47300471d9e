//! Cross-section records and their on-disk form.
//!
//! Each finalized cross section is stored as three files sharing a stem:
//!
//! ```text
//! cs/N2/fict/
//! ├── N2_fict_0.met     # one metadata row, keyed by cs_id
//! ├── N2_fict_0.dat     # one row per point, keyed by csdata_id
//! └── N2_fict_0.mod     # model names, one per line (optional)
//! ```
//!
//! Files are tab-delimited without headers; absent values are written as
//! `\N` so the database loader reads them as NULL.

mod cross_section;
mod reader;
mod writer;

pub use cross_section::{
    CrossSection, CrossSectionBuilder, FieldValue, UncertaintyBounds, FIELD_NAMES,
};
pub use reader::{read_record, CrossSectionStore, DirectoryStore, StoredCrossSection};
pub use writer::{RecordPaths, RecordWriter};

/// NULL marker understood by the database loader.
pub const NULL_MARKER: &str = "\\N";

/// Format a float so that it parses back to the same value.
///
/// Moderate magnitudes are written positionally, everything else in
/// exponent form, which keeps cross sections like `2e-20` compact.
pub fn format_float(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 || (1e-3..1e7).contains(&magnitude) || !value.is_finite() {
        format!("{}", value)
    } else {
        format!("{:e}", value)
    }
}
