//! Augment rules: regex matchers that assign fields to records.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::record::{CrossSectionBuilder, FieldValue};

/// One rule: if every criterion matches, every override is set.
///
/// Criteria are regular expressions searched (not fully matched) against
/// the record's current field values. A rule with no criteria matches
/// every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AugmentRule {
    #[serde(default, rename = "match")]
    pub criteria: IndexMap<String, String>,
    #[serde(default)]
    pub set: IndexMap<String, FieldValue>,
}

impl AugmentRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a criterion.
    pub fn matching(mut self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.criteria.insert(field.into(), pattern.into());
        self
    }

    /// Add an override.
    pub fn setting(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }
}

struct CompiledRule {
    criteria: Vec<(String, Regex)>,
    set: IndexMap<String, FieldValue>,
}

/// Compiled, ordered rule list.
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile every pattern; fails on the first invalid regex.
    pub fn compile(rules: &[AugmentRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                let criteria = rule
                    .criteria
                    .iter()
                    .map(|(field, pattern)| Ok((field.clone(), Regex::new(pattern)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CompiledRule {
                    criteria,
                    set: rule.set.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply rules in order; later rules see and may overwrite earlier results.
    ///
    /// Returns the number of rules that matched.
    pub fn apply(&self, builder: &mut CrossSectionBuilder) -> Result<usize> {
        let mut matched = 0;
        for (idx, rule) in self.rules.iter().enumerate() {
            let hit = rule.criteria.iter().all(|(field, regex)| {
                builder
                    .get(field)
                    .is_some_and(|value| regex.is_match(&value))
            });
            if !hit {
                continue;
            }

            debug!(record = %builder.label(), rule = idx, "Augment rule matched");
            for (field, value) in &rule.set {
                builder.set(field, value)?;
            }
            matched += 1;
        }
        Ok(matched)
    }
}
