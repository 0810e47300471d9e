//! Cross-section records and their incremental builder.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CurateError, Result};
use crate::input::RawProcessRecord;

/// Names of every settable cross-section field, in `.met` column order
/// followed by the fields that are not part of the metadata row.
pub const FIELD_NAMES: &[&str] = &[
    "specie",
    "process",
    "units_e",
    "units_sigma",
    "ref",
    "lhs_a",
    "lhs_b",
    "rhs_a",
    "rhs_b",
    "lhs_v",
    "rhs_v",
    "lhs_j",
    "rhs_j",
    "threshold",
    "background",
    "lpu",
    "upu",
    "models",
    "nepc_filename",
];

/// A loosely-typed field value from a rule or description file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    fn as_text(&self) -> String {
        match self {
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(","),
        }
    }

    fn as_float(&self, field: &str) -> Result<f64> {
        match self {
            FieldValue::Integer(i) => Ok(*i as f64),
            FieldValue::Float(f) => Ok(*f),
            FieldValue::Text(s) => s.trim().parse().map_err(|_| invalid(field, "expected a number")),
            FieldValue::List(_) => Err(invalid(field, "expected a number, found a list")),
        }
    }

    fn as_integer(&self, field: &str) -> Result<i64> {
        match self {
            FieldValue::Integer(i) => Ok(*i),
            FieldValue::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
            FieldValue::Text(s) => s.trim().parse().map_err(|_| invalid(field, "expected an integer")),
            _ => Err(invalid(field, "expected an integer")),
        }
    }

    fn as_list(&self) -> Vec<String> {
        match self {
            FieldValue::List(items) => items.clone(),
            other => other
                .as_text()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

fn invalid(field: &str, message: &str) -> CurateError {
    CurateError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn text(value: &Option<String>) -> Option<Cow<'_, str>> {
    value.as_deref().map(Cow::Borrowed)
}

fn number(value: Option<f64>) -> Option<Cow<'static, str>> {
    value.map(|n| Cow::Owned(n.to_string()))
}

fn int(value: Option<i64>) -> Option<Cow<'static, str>> {
    value.map(|n| Cow::Owned(n.to_string()))
}

/// Storage text cannot contain the row or column delimiters.
fn sanitize(text: &str) -> String {
    text.replace(['\t', '\n', '\r'], " ")
}

/// Lower/upper percent uncertainty of a cross section.
///
/// `-1` (or a missing value) marks a bound as absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UncertaintyBounds {
    pub lpu: Option<f64>,
    pub upu: Option<f64>,
}

impl UncertaintyBounds {
    /// Sentinel used by source data for "no bound".
    pub const ABSENT: f64 = -1.0;

    pub fn new(lpu: Option<f64>, upu: Option<f64>) -> Self {
        Self { lpu, upu }
    }

    /// The band to use, if any.
    ///
    /// When only one bound is given it is mirrored onto the other.
    pub fn effective(&self) -> Option<(f64, f64)> {
        let present = |b: Option<f64>| b.filter(|v| *v != Self::ABSENT);
        match (present(self.lpu), present(self.upu)) {
            (Some(l), Some(u)) => Some((l, u)),
            (Some(l), None) => Some((l, l)),
            (None, Some(u)) => Some((u, u)),
            (None, None) => None,
        }
    }
}

/// A finalized cross section, ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    pub specie: String,
    pub process: String,
    /// Multiply energies by this to get eV.
    pub units_e: f64,
    /// Multiply cross sections by this to get m^2.
    pub units_sigma: f64,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub lhs_a: Option<String>,
    pub lhs_b: Option<String>,
    pub rhs_a: Option<String>,
    pub rhs_b: Option<String>,
    pub lhs_v: Option<i64>,
    pub rhs_v: Option<i64>,
    pub lhs_j: Option<i64>,
    pub rhs_j: Option<i64>,
    pub threshold: Option<f64>,
    pub background: Option<String>,
    pub lpu: Option<f64>,
    pub upu: Option<f64>,
    pub models: Vec<String>,
    /// Output file stem.
    pub nepc_filename: String,
    pub data: Vec<(f64, f64)>,
}

impl CrossSection {
    /// Number of left-hand species set.
    pub fn lhs_count(&self) -> usize {
        usize::from(self.lhs_a.is_some()) + usize::from(self.lhs_b.is_some())
    }

    /// Number of right-hand species set.
    pub fn rhs_count(&self) -> usize {
        usize::from(self.rhs_a.is_some()) + usize::from(self.rhs_b.is_some())
    }

    pub fn uncertainty(&self) -> UncertaintyBounds {
        UncertaintyBounds::new(self.lpu, self.upu)
    }
}

/// Incrementally populated cross section.
///
/// Each pipeline stage sets what it knows; `build` checks that every
/// required field was supplied.
#[derive(Debug, Clone, Default)]
pub struct CrossSectionBuilder {
    specie: Option<String>,
    process: Option<String>,
    units_e: Option<f64>,
    units_sigma: Option<f64>,
    reference: Option<String>,
    lhs_a: Option<String>,
    lhs_b: Option<String>,
    rhs_a: Option<String>,
    rhs_b: Option<String>,
    lhs_v: Option<i64>,
    rhs_v: Option<i64>,
    lhs_j: Option<i64>,
    rhs_j: Option<i64>,
    threshold: Option<f64>,
    background: Option<String>,
    lpu: Option<f64>,
    upu: Option<f64>,
    models: Vec<String>,
    nepc_filename: Option<String>,
    data: Vec<(f64, f64)>,
    /// Source fields visible to rule matching but never written.
    source_fields: IndexMap<String, String>,
}

impl CrossSectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a raw record: data, threshold and all raw fields for matching.
    pub fn from_raw(raw: &RawProcessRecord) -> Self {
        let mut source_fields = IndexMap::new();
        for name in ["kind", "target", "product", "mass_ratio", "weight_ratio"] {
            if let Some(value) = raw.field(name) {
                source_fields.insert(name.to_string(), value.into_owned());
            }
        }
        for (key, value) in &raw.fields {
            source_fields.insert(key.clone(), value.clone());
        }

        Self {
            threshold: raw.threshold,
            data: raw.data.clone(),
            source_fields,
            ..Self::default()
        }
    }

    /// Set a field by name from a loosely-typed value.
    pub fn set(&mut self, field: &str, value: &FieldValue) -> Result<()> {
        match field {
            "specie" => self.specie = Some(sanitize(&value.as_text())),
            "process" => self.process = Some(sanitize(&value.as_text())),
            "units_e" => self.units_e = Some(value.as_float(field)?),
            "units_sigma" => self.units_sigma = Some(value.as_float(field)?),
            "ref" => self.reference = Some(sanitize(&value.as_text())),
            "lhs_a" => self.lhs_a = Some(sanitize(&value.as_text())),
            "lhs_b" => self.lhs_b = Some(sanitize(&value.as_text())),
            "rhs_a" => self.rhs_a = Some(sanitize(&value.as_text())),
            "rhs_b" => self.rhs_b = Some(sanitize(&value.as_text())),
            "lhs_v" => self.lhs_v = Some(value.as_integer(field)?),
            "rhs_v" => self.rhs_v = Some(value.as_integer(field)?),
            "lhs_j" => self.lhs_j = Some(value.as_integer(field)?),
            "rhs_j" => self.rhs_j = Some(value.as_integer(field)?),
            "threshold" => self.threshold = Some(value.as_float(field)?),
            "background" => self.background = Some(sanitize(&value.as_text())),
            "lpu" => self.lpu = Some(value.as_float(field)?),
            "upu" => self.upu = Some(value.as_float(field)?),
            "models" => self.models = value.as_list().iter().map(|m| sanitize(m)).collect(),
            "nepc_filename" => self.nepc_filename = Some(sanitize(&value.as_text())),
            other => return Err(CurateError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    /// Current value of a field, falling back to source fields.
    pub fn get(&self, field: &str) -> Option<Cow<'_, str>> {
        let value = match field {
            "specie" => text(&self.specie),
            "process" => text(&self.process),
            "units_e" => number(self.units_e),
            "units_sigma" => number(self.units_sigma),
            "ref" => text(&self.reference),
            "lhs_a" => text(&self.lhs_a),
            "lhs_b" => text(&self.lhs_b),
            "rhs_a" => text(&self.rhs_a),
            "rhs_b" => text(&self.rhs_b),
            "lhs_v" => int(self.lhs_v),
            "rhs_v" => int(self.rhs_v),
            "lhs_j" => int(self.lhs_j),
            "rhs_j" => int(self.rhs_j),
            "threshold" => number(self.threshold),
            "background" => text(&self.background),
            "lpu" => number(self.lpu),
            "upu" => number(self.upu),
            "models" if !self.models.is_empty() => Some(Cow::Owned(self.models.join(","))),
            "nepc_filename" => text(&self.nepc_filename),
            _ => None,
        };
        value.or_else(|| self.source_fields.get(field).map(|v| Cow::Borrowed(v.as_str())))
    }

    /// Whether a cross-section field has been set (source fields do not count).
    pub fn is_set(&self, field: &str) -> bool {
        match field {
            "specie" => self.specie.is_some(),
            "process" => self.process.is_some(),
            "units_e" => self.units_e.is_some(),
            "units_sigma" => self.units_sigma.is_some(),
            "ref" => self.reference.is_some(),
            "lhs_a" => self.lhs_a.is_some(),
            "lhs_b" => self.lhs_b.is_some(),
            "rhs_a" => self.rhs_a.is_some(),
            "rhs_b" => self.rhs_b.is_some(),
            "lhs_v" => self.lhs_v.is_some(),
            "rhs_v" => self.rhs_v.is_some(),
            "lhs_j" => self.lhs_j.is_some(),
            "rhs_j" => self.rhs_j.is_some(),
            "threshold" => self.threshold.is_some(),
            "background" => self.background.is_some(),
            "lpu" => self.lpu.is_some(),
            "upu" => self.upu.is_some(),
            "models" => !self.models.is_empty(),
            "nepc_filename" => self.nepc_filename.is_some(),
            _ => false,
        }
    }

    /// Set a field only if nothing has set it yet.
    pub fn set_default(&mut self, field: &str, value: &FieldValue) -> Result<()> {
        if self.is_set(field) {
            return Ok(());
        }
        self.set(field, value)
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.data
    }

    pub fn set_data(&mut self, data: Vec<(f64, f64)>) {
        self.data = data;
    }

    /// Label used in error messages before the record is finalized.
    pub fn label(&self) -> String {
        self.nepc_filename
            .clone()
            .or_else(|| self.process.clone())
            .unwrap_or_else(|| "<unnamed>".to_string())
    }

    /// Finalize; fails on the first missing required field.
    pub fn build(self) -> Result<CrossSection> {
        let label = self.label();
        let missing = |field: &str| CurateError::MissingField {
            record: label.clone(),
            field: field.to_string(),
        };

        Ok(CrossSection {
            specie: self.specie.ok_or_else(|| missing("specie"))?,
            process: self.process.ok_or_else(|| missing("process"))?,
            units_e: self.units_e.ok_or_else(|| missing("units_e"))?,
            units_sigma: self.units_sigma.ok_or_else(|| missing("units_sigma"))?,
            nepc_filename: self.nepc_filename.ok_or_else(|| missing("nepc_filename"))?,
            reference: self.reference,
            lhs_a: self.lhs_a,
            lhs_b: self.lhs_b,
            rhs_a: self.rhs_a,
            rhs_b: self.rhs_b,
            lhs_v: self.lhs_v,
            rhs_v: self.rhs_v,
            lhs_j: self.lhs_j,
            rhs_j: self.rhs_j,
            threshold: self.threshold,
            background: self.background,
            lpu: self.lpu,
            upu: self.upu,
            models: self.models,
            data: self.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ProcessKind;

    fn complete_builder() -> CrossSectionBuilder {
        let mut b = CrossSectionBuilder::new();
        b.set("specie", &"N2".into()).unwrap();
        b.set("process", &"excitation".into()).unwrap();
        b.set("units_e", &1.0.into()).unwrap();
        b.set("units_sigma", &1.0.into()).unwrap();
        b.set("nepc_filename", &"n2_0".into()).unwrap();
        b
    }

    #[test]
    fn test_build_requires_fields() {
        let mut b = CrossSectionBuilder::new();
        b.set("specie", &"N2".into()).unwrap();
        match b.build() {
            Err(CurateError::MissingField { field, .. }) => assert_eq!(field, "process"),
            other => panic!("expected missing field, got {:?}", other),
        }

        let cs = complete_builder().build().unwrap();
        assert_eq!(cs.specie, "N2");
        assert_eq!(cs.reference, None);
    }

    #[test]
    fn test_typed_setters() {
        let mut b = complete_builder();
        b.set("rhs_v", &FieldValue::Integer(1)).unwrap();
        b.set("lhs_v", &FieldValue::Text("0".to_string())).unwrap();
        b.set("threshold", &FieldValue::Integer(2)).unwrap();
        b.set("models", &FieldValue::Text("fict, phelps".to_string())).unwrap();
        assert!(b.set("lhs_j", &FieldValue::Text("high".to_string())).is_err());
        assert!(matches!(
            b.set("colour", &"red".into()),
            Err(CurateError::UnknownField(_))
        ));

        let cs = b.build().unwrap();
        assert_eq!(cs.rhs_v, Some(1));
        assert_eq!(cs.lhs_v, Some(0));
        assert_eq!(cs.threshold, Some(2.0));
        assert_eq!(cs.models, vec!["fict", "phelps"]);
    }

    #[test]
    fn test_text_is_sanitized() {
        let mut b = complete_builder();
        b.set("background", &"line one\nline\ttwo".into()).unwrap();
        assert_eq!(b.build().unwrap().background.as_deref(), Some("line one line two"));
    }

    #[test]
    fn test_get_falls_back_to_source_fields() {
        let mut raw = RawProcessRecord::new(ProcessKind::Excitation, "N2(X1Sigmag+)");
        raw.product = Some("v1".to_string());
        raw.fields.insert("process".to_string(), "E + N2 -> E + N2(v1)".to_string());

        let mut b = CrossSectionBuilder::from_raw(&raw);
        assert_eq!(b.get("product").as_deref(), Some("v1"));
        assert_eq!(b.get("process").as_deref(), Some("E + N2 -> E + N2(v1)"));

        b.set("process", &"excitation".into()).unwrap();
        assert_eq!(b.get("process").as_deref(), Some("excitation"));
    }

    #[test]
    fn test_set_default_keeps_existing() {
        let mut b = complete_builder();
        b.set_default("specie", &"Ar".into()).unwrap();
        b.set_default("ref", &"Phelps".into()).unwrap();
        let cs = b.build().unwrap();
        assert_eq!(cs.specie, "N2");
        assert_eq!(cs.reference.as_deref(), Some("Phelps"));
    }

    #[test]
    fn test_effective_uncertainty() {
        assert_eq!(UncertaintyBounds::new(Some(10.0), Some(20.0)).effective(), Some((10.0, 20.0)));
        assert_eq!(UncertaintyBounds::new(Some(-1.0), Some(20.0)).effective(), Some((20.0, 20.0)));
        assert_eq!(UncertaintyBounds::new(Some(15.0), None).effective(), Some((15.0, 15.0)));
        assert_eq!(UncertaintyBounds::new(Some(-1.0), Some(-1.0)).effective(), None);
        assert_eq!(UncertaintyBounds::default().effective(), None);
    }
}
