//! Parser for BOLSIG+/LXCat formatted cross-section files.
//!
//! A file is a sequence of blocks, each opened by a keyword line:
//!
//! ```text
//! EXCITATION
//! N2(X1Sigmag+) -> N2(X1Sigmag+,v=1)
//!  2.900000e-1
//! SPECIES: e / N2
//! PROCESS: E + N2 -> E + N2(v1), Excitation
//! -----------------------------
//!  1.000000e+0	2.000000e-20
//! -----------------------------
//! ```
//!
//! Lines that are not a known keyword are ignored until one appears.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::error::{CurateError, Result};

use super::record::{ProcessKind, RawProcessRecord};
use super::table::parse_pair;

static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-----+").unwrap());
static ARROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"<?->").unwrap());

/// Streaming block parser over one source.
///
/// Yields records in file order. A block whose header or argument line is
/// malformed is skipped; a malformed data table ends the iteration with an
/// error.
pub struct LxcatParser<R: BufRead> {
    lines: Lines<R>,
    file: String,
    line_no: usize,
    has_arg: bool,
    blocks_read: usize,
    done: bool,
}

impl<R: BufRead> LxcatParser<R> {
    /// Create a parser over `reader`; `file` is used in errors and logs.
    pub fn new(reader: R, file: impl Into<String>) -> Self {
        Self {
            lines: reader.lines(),
            file: file.into(),
            line_no: 0,
            has_arg: true,
            blocks_read: 0,
            done: false,
        }
    }

    /// Treat every block as having no argument line.
    pub fn without_arguments(mut self) -> Self {
        self.has_arg = false;
        self
    }

    /// Number of blocks successfully read so far.
    pub fn blocks_read(&self) -> usize {
        self.blocks_read
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.next() {
            Some(Ok(line)) => {
                self.line_no += 1;
                Ok(Some(line))
            }
            Some(Err(e)) => Err(CurateError::io(PathBuf::from(&self.file), e)),
            None => Ok(None),
        }
    }

    /// Read trimmed lines up to (not including) the next separator.
    fn read_until_separator(&mut self) -> Result<Vec<(usize, String)>> {
        let mut lines = Vec::new();
        while let Some(line) = self.next_line()? {
            let line = line.trim();
            if SEPARATOR.is_match(line) {
                break;
            }
            lines.push((self.line_no, line.to_string()));
        }
        Ok(lines)
    }

    /// Read one block after its keyword line. `Ok(None)` means the block was skipped.
    fn read_block(&mut self, kind: ProcessKind) -> Result<Option<RawProcessRecord>> {
        let Some(target) = self.next_line()? else {
            debug!(file = %self.file, kind = %kind, "Block truncated before target line");
            return Ok(None);
        };
        let target = target.trim().to_string();

        let arg = if self.has_arg && kind.has_argument_line() {
            match self.next_line()? {
                Some(line) => Some(line.trim().to_string()),
                None => {
                    debug!(file = %self.file, kind = %kind, "Block truncated before argument line");
                    return Ok(None);
                }
            }
        } else {
            None
        };

        let comment = self
            .read_until_separator()?
            .into_iter()
            .map(|(_, line)| line)
            .collect::<Vec<_>>()
            .join("\n");

        let Some(mut record) = interpret_header(kind, &target, arg.as_deref()) else {
            // Drain the table unparsed.
            self.read_until_separator()?;
            debug!(file = %self.file, kind = %kind, target = %target, "Skipping malformed block");
            return Ok(None);
        };

        let mut data = Vec::new();
        for (line_no, line) in self.read_until_separator()? {
            if line.is_empty() {
                continue;
            }
            let pair = parse_pair(&line).map_err(|message| CurateError::Parse {
                file: self.file.clone(),
                line: line_no,
                message,
            })?;
            data.push(pair);
        }

        record.data = data;
        record.merge_comment(&comment);
        debug!(file = %self.file, kind = %kind, target = %record.target, "Read process");
        Ok(Some(record))
    }
}

impl<R: BufRead> Iterator for LxcatParser<R> {
    type Item = Result<RawProcessRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = match self.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.done = true;
                    info!(file = %self.file, "Parsing complete. {} processes read", self.blocks_read);
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            let Some(kind) = ProcessKind::from_keyword(line.trim()) else {
                continue;
            };
            debug!(file = %self.file, line = self.line_no, "New process of type '{}'", kind);

            match self.read_block(kind) {
                Ok(Some(mut record)) => {
                    record.index = self.blocks_read;
                    self.blocks_read += 1;
                    return Some(Ok(record));
                }
                Ok(None) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Build the structural part of a record from its target and argument lines.
fn interpret_header(kind: ProcessKind, target: &str, arg: Option<&str>) -> Option<RawProcessRecord> {
    let first_arg = |arg: Option<&str>| -> Option<Option<f64>> {
        match arg {
            None => Some(None),
            Some(a) => a.split_whitespace().next()?.parse::<f64>().ok().map(Some),
        }
    };

    match kind {
        ProcessKind::Momentum | ProcessKind::Elastic | ProcessKind::Effective => {
            let mut record = RawProcessRecord::new(kind, target);
            record.mass_ratio = first_arg(arg)?;
            Some(record)
        }
        ProcessKind::Excitation | ProcessKind::Ionization => {
            let sides: Vec<&str> = ARROW.split(target).map(str::trim).collect();
            let [lhs, rhs] = sides.as_slice() else {
                return None;
            };
            let mut record = RawProcessRecord::new(kind, *lhs);
            record.product = Some(rhs.to_string());

            let reversible = ARROW.find(target).is_some_and(|m| m.as_str() == "<->");
            match arg {
                Some(a) if reversible => {
                    let mut tokens = a.split_whitespace();
                    record.threshold = Some(tokens.next()?.parse().ok()?);
                    record.weight_ratio = Some(tokens.next()?.parse().ok()?);
                }
                _ => record.threshold = first_arg(arg)?,
            }
            Some(record)
        }
        ProcessKind::Attachment => {
            let sides: Vec<&str> = ARROW.split(target).map(str::trim).collect();
            let mut record = match sides.as_slice() {
                [lhs, rhs] => {
                    let mut record = RawProcessRecord::new(kind, *lhs);
                    record.product = Some(rhs.to_string());
                    record
                }
                _ => RawProcessRecord::new(kind, target),
            };
            record.threshold = Some(0.0);
            Some(record)
        }
    }
}

/// Parse every block of an LXCat file.
///
/// Records are tagged with the file path and their block index.
pub fn parse_file(path: impl AsRef<Path>, has_arg: bool) -> Result<Vec<RawProcessRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CurateError::io(path, e))?;

    let mut parser = LxcatParser::new(BufReader::new(file), path.display().to_string());
    if !has_arg {
        parser = parser.without_arguments();
    }

    let mut records = Vec::new();
    for record in parser {
        let mut record = record?;
        record.source = Some(path.to_path_buf());
        records.push(record);
    }
    Ok(records)
}
