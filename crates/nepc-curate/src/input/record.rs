//! Raw process records as read from a source file.

use std::borrow::Cow;
use std::path::PathBuf;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// `Key: value` lines inside a block's comment section.
static COMMENT_FIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z][\w.]*):(.*)$").unwrap());

/// Kind of collision process, one per block keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessKind {
    Momentum,
    Elastic,
    Effective,
    Excitation,
    Ionization,
    Attachment,
}

impl ProcessKind {
    /// All kinds, in keyword order.
    pub const ALL: [ProcessKind; 6] = [
        ProcessKind::Momentum,
        ProcessKind::Elastic,
        ProcessKind::Effective,
        ProcessKind::Excitation,
        ProcessKind::Ionization,
        ProcessKind::Attachment,
    ];

    /// Match a block keyword line. Only exact keywords open a block.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "MOMENTUM" => Some(ProcessKind::Momentum),
            "ELASTIC" => Some(ProcessKind::Elastic),
            "EFFECTIVE" => Some(ProcessKind::Effective),
            "EXCITATION" => Some(ProcessKind::Excitation),
            "IONIZATION" => Some(ProcessKind::Ionization),
            "ATTACHMENT" => Some(ProcessKind::Attachment),
            _ => None,
        }
    }

    /// The block keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            ProcessKind::Momentum => "MOMENTUM",
            ProcessKind::Elastic => "ELASTIC",
            ProcessKind::Effective => "EFFECTIVE",
            ProcessKind::Excitation => "EXCITATION",
            ProcessKind::Ionization => "IONIZATION",
            ProcessKind::Attachment => "ATTACHMENT",
        }
    }

    /// Lowercase process label used as the default `process` of a record.
    pub fn label(&self) -> &'static str {
        match self {
            ProcessKind::Momentum => "momentum",
            ProcessKind::Elastic => "elastic",
            ProcessKind::Effective => "effective",
            ProcessKind::Excitation => "excitation",
            ProcessKind::Ionization => "ionization",
            ProcessKind::Attachment => "attachment",
        }
    }

    /// Momentum-transfer style blocks carry a mass ratio argument.
    pub fn is_momentum_like(&self) -> bool {
        matches!(
            self,
            ProcessKind::Momentum | ProcessKind::Elastic | ProcessKind::Effective
        )
    }

    /// Whether blocks of this kind have an argument line at all.
    pub fn has_argument_line(&self) -> bool {
        !matches!(self, ProcessKind::Attachment)
    }
}

impl std::fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// One process block parsed from a source file.
///
/// Data points are kept exactly as read; cleaning happens later in the
/// curation pipeline and mutates `data` in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProcessRecord {
    pub kind: ProcessKind,
    /// Reactant state label.
    pub target: String,
    /// Result state label, when the target line has an arrow.
    pub product: Option<String>,
    /// Threshold energy, absent for momentum-like blocks.
    pub threshold: Option<f64>,
    /// Electron/target mass ratio of momentum-like blocks.
    pub mass_ratio: Option<f64>,
    /// Statistical weight ratio of reversible (`<->`) processes.
    pub weight_ratio: Option<f64>,
    /// (energy, cross section) pairs.
    pub data: Vec<(f64, f64)>,
    /// Metadata from the comment section, keys lowercased and period-stripped.
    pub fields: IndexMap<String, String>,
    /// File the block was read from.
    pub source: Option<PathBuf>,
    /// Position of the block within its file.
    pub index: usize,
}

impl RawProcessRecord {
    /// Create an empty record of the given kind.
    pub fn new(kind: ProcessKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            product: None,
            threshold: None,
            mass_ratio: None,
            weight_ratio: None,
            data: Vec::new(),
            fields: IndexMap::new(),
            source: None,
            index: 0,
        }
    }

    /// Look up a field by name, covering both structural and comment fields.
    pub fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "kind" => Some(Cow::Borrowed(self.kind.keyword())),
            "target" => Some(Cow::Borrowed(self.target.as_str())),
            "product" => self.product.as_deref().map(Cow::Borrowed),
            "threshold" => self.threshold.map(|t| Cow::Owned(t.to_string())),
            "mass_ratio" => self.mass_ratio.map(|m| Cow::Owned(m.to_string())),
            "weight_ratio" => self.weight_ratio.map(|w| Cow::Owned(w.to_string())),
            _ => self.fields.get(name).map(|v| Cow::Borrowed(v.as_str())),
        }
    }

    /// Stem of the source file name, or `"unknown"`.
    pub fn source_stem(&self) -> String {
        self.source
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Merge a block's comment section into `fields`.
    ///
    /// A `comment` entry is folded into `process` as a parenthetical and
    /// does not survive as a field of its own.
    pub fn merge_comment(&mut self, comment: &str) {
        for line in comment.lines() {
            let Some(caps) = COMMENT_FIELD.captures(line.trim()) else {
                continue;
            };
            let key = caps[1].to_lowercase().replace('.', "");
            let value = caps[2].trim_start().to_string();
            self.fields.insert(key, value);
        }

        if let Some(comment) = self.fields.shift_remove("comment") {
            let comment = comment.to_lowercase().replace('.', "");
            let process = match self.fields.get("process") {
                Some(p) if !p.is_empty() => format!("{} ({})", p, comment),
                _ => format!("({})", comment),
            };
            self.fields.insert("process".to_string(), process);
        }
    }
}
