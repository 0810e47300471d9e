//! Process categories and the field counts they require.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CurateError, Result};
use crate::record::CrossSection;

/// What a process category expects a cross section to carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessCategory {
    pub name: String,
    /// Number of left-hand species (`lhs_a`, `lhs_b`).
    pub lhs: usize,
    /// Number of right-hand species (`rhs_a`, `rhs_b`).
    pub rhs: usize,
    /// Vibrational levels required on both sides.
    #[serde(default)]
    pub vibrational: bool,
    /// Rotational levels required on both sides.
    #[serde(default)]
    pub rotational: bool,
}

impl ProcessCategory {
    pub fn new(name: impl Into<String>, lhs: usize, rhs: usize) -> Self {
        Self {
            name: name.into(),
            lhs,
            rhs,
            vibrational: false,
            rotational: false,
        }
    }

    pub fn with_vibrational(mut self) -> Self {
        self.vibrational = true;
        self
    }

    pub fn with_rotational(mut self) -> Self {
        self.rotational = true;
        self
    }
}

/// Known process categories, keyed by name.
#[derive(Debug, Clone)]
pub struct ProcessCatalog {
    categories: IndexMap<String, ProcessCategory>,
}

impl Default for ProcessCatalog {
    fn default() -> Self {
        let builtin = [
            ProcessCategory::new("momentum", 1, 1),
            ProcessCategory::new("elastic", 1, 1),
            ProcessCategory::new("effective", 1, 1),
            ProcessCategory::new("excitation", 1, 1),
            ProcessCategory::new("excitation_v", 1, 1).with_vibrational(),
            ProcessCategory::new("excitation_j", 1, 1).with_rotational(),
            ProcessCategory::new("ionization", 1, 1),
            ProcessCategory::new("ionization_total", 1, 1),
            ProcessCategory::new("dissociative_ionization", 1, 2),
            ProcessCategory::new("attachment", 1, 1),
            ProcessCategory::new("dissociative_attachment", 1, 2),
        ];
        Self {
            categories: builtin
                .into_iter()
                .map(|c| (c.name.clone(), c))
                .collect(),
        }
    }
}

impl ProcessCatalog {
    /// Built-in categories plus `extra`; an extra category replaces a built-in of the same name.
    pub fn with_categories(extra: &[ProcessCategory]) -> Self {
        let mut catalog = Self::default();
        for category in extra {
            catalog
                .categories
                .insert(category.name.clone(), category.clone());
        }
        catalog
    }

    pub fn get(&self, name: &str) -> Option<&ProcessCategory> {
        self.categories.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Check that augmentation supplied what the record's category declares.
    ///
    /// Species counts must match exactly; required quantum levels must be
    /// present on both sides.
    pub fn verify(&self, cs: &CrossSection) -> Result<()> {
        let mismatch = |message: String| CurateError::AugmentMapping {
            record: cs.nepc_filename.clone(),
            process: cs.process.clone(),
            message,
        };

        let category = self
            .get(&cs.process)
            .ok_or_else(|| mismatch("unknown process category".to_string()))?;

        if cs.lhs_count() != category.lhs {
            return Err(mismatch(format!(
                "expected {} lhs species, augmentation supplied {}",
                category.lhs,
                cs.lhs_count()
            )));
        }
        if cs.rhs_count() != category.rhs {
            return Err(mismatch(format!(
                "expected {} rhs species, augmentation supplied {}",
                category.rhs,
                cs.rhs_count()
            )));
        }

        let mut missing = Vec::new();
        if category.vibrational {
            if cs.lhs_v.is_none() {
                missing.push("lhs_v");
            }
            if cs.rhs_v.is_none() {
                missing.push("rhs_v");
            }
        }
        if category.rotational {
            if cs.lhs_j.is_none() {
                missing.push("lhs_j");
            }
            if cs.rhs_j.is_none() {
                missing.push("rhs_j");
            }
        }
        if !missing.is_empty() {
            return Err(mismatch(format!("missing {}", missing.join(", "))));
        }
        Ok(())
    }
}
