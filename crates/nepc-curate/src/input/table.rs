//! Two-column numeric tables.

use std::fs;
use std::path::Path;

use crate::error::{CurateError, Result};

/// Parse one `energy  cross_section` row.
pub(crate) fn parse_pair(line: &str) -> std::result::Result<(f64, f64), String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 2 {
        return Err(format!("expected 2 columns, found {}", tokens.len()));
    }

    let parse = |token: &str| {
        token
            .parse::<f64>()
            .map_err(|e| format!("invalid number '{}': {}", token, e))
    };
    Ok((parse(tokens[0])?, parse(tokens[1])?))
}

/// Read a whitespace-delimited two-column file, skipping blank and `#` lines.
pub fn read_pairs(path: impl AsRef<Path>) -> Result<Vec<(f64, f64)>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| CurateError::io(path, e))?;

    let mut pairs = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let pair = parse_pair(line).map_err(|message| CurateError::Parse {
            file: path.display().to_string(),
            line: idx + 1,
            message,
        })?;
        pairs.push(pair);
    }
    Ok(pairs)
}
