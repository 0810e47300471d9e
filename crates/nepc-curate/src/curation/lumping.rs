//! Summing several cross sections on a shared log-spaced energy grid.
//!
//! Each input curve is interpolated in log-log space at every grid energy
//! and the contributions are added. Outside an input's own energy range
//! its log value is [`EXTRAPOLATION_SENTINEL`], which exponentiates to
//! zero.

use tracing::{debug, warn};

use crate::error::{CurateError, Result};
use crate::record::CrossSection;

/// Grid density.
pub const POINTS_PER_DECADE: usize = 100;

/// Log value used outside an input's energy range.
pub const EXTRAPOLATION_SENTINEL: f64 = -1000.0;

/// Lumped values smaller than this in magnitude are written as exactly zero.
pub const NOISE_FLOOR: f64 = 1e-24;

/// Fields that must agree across every lumped input.
const REQUIRED_EQUAL: [&str; 3] = ["specie", "units_e", "units_sigma"];

/// One-dimensional piecewise-linear interpolation.
///
/// `xp` must be increasing. Below `xp[0]` returns `left`, above the last
/// point returns `right`. An exact hit on a sample point returns its value.
/// When the linear formula produces NaN (infinite samples) the segment is
/// evaluated from its right end, and a flat segment yields its value.
pub fn interp(x: f64, xp: &[f64], fp: &[f64], left: f64, right: f64) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 || x.is_nan() {
        return f64::NAN;
    }
    if x < xp[0] {
        return left;
    }
    if x > xp[n - 1] {
        return right;
    }
    if x == xp[n - 1] {
        return fp[n - 1];
    }

    if n < 2 {
        return f64::NAN;
    }

    // Last j with xp[j] <= x
    let j = xp[..n].partition_point(|&v| v <= x).saturating_sub(1).min(n - 2);
    if x == xp[j] {
        return fp[j];
    }

    let slope = (fp[j + 1] - fp[j]) / (xp[j + 1] - xp[j]);
    let mut value = slope * (x - xp[j]) + fp[j];
    if value.is_nan() {
        value = slope * (x - xp[j + 1]) + fp[j + 1];
        if value.is_nan() && fp[j] == fp[j + 1] {
            value = fp[j];
        }
    }
    value
}

/// Energies `10^k` for `k` from `floor(log10(min))` to `ceil(log10(max))`
/// in steps of `1 / POINTS_PER_DECADE`.
pub fn log_grid(min_energy: f64, max_energy: f64) -> Vec<f64> {
    let low = min_energy.log10().floor() as i64;
    let high = max_energy.log10().ceil() as i64;
    if high < low {
        return Vec::new();
    }

    let count = (high - low) as usize * POINTS_PER_DECADE + 1;
    (0..count)
        .map(|i| 10f64.powf(low as f64 + i as f64 / POINTS_PER_DECADE as f64))
        .collect()
}

/// Check required-equal metadata pairwise along the input order.
///
/// Names every field that differs between any two neighbours.
pub fn check_consistency(inputs: &[CrossSection]) -> Result<()> {
    let mut fields: Vec<String> = Vec::new();
    let mut details = Vec::new();

    for pair in inputs.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        for field in REQUIRED_EQUAL {
            let (left, right) = match field {
                "specie" => (a.specie.clone(), b.specie.clone()),
                "units_e" => (a.units_e.to_string(), b.units_e.to_string()),
                _ => (a.units_sigma.to_string(), b.units_sigma.to_string()),
            };
            if left == right {
                continue;
            }
            details.push(format!(
                "{}: '{}' has {}, '{}' has {}",
                field, a.nepc_filename, left, b.nepc_filename, right
            ));
            if !fields.iter().any(|f| f == field) {
                fields.push(field.to_string());
            }
        }
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(CurateError::Consistency {
            fields,
            message: details.join("; "),
        })
    }
}

/// Result of summing several cross sections.
#[derive(Debug, Clone, PartialEq)]
pub struct LumpedCurve {
    pub data: Vec<(f64, f64)>,
    /// Smallest threshold among the inputs.
    pub threshold: Option<f64>,
    /// Distinct input references, comma-joined in input order.
    pub reference: Option<String>,
}

/// Sum `inputs` on a common grid.
///
/// Fails if the inputs disagree on required-equal metadata or if none of
/// them has a positive energy to anchor the grid.
pub fn lump(inputs: &[CrossSection]) -> Result<LumpedCurve> {
    check_consistency(inputs)?;

    let positive = || {
        inputs
            .iter()
            .flat_map(|cs| cs.data.iter().map(|&(e, _)| e))
            .filter(|e| *e > 0.0)
    };
    let (Some(min_energy), Some(max_energy)) = (
        positive().reduce(f64::min),
        positive().reduce(f64::max),
    ) else {
        return Err(CurateError::Config(
            "lumped inputs have no positive energies".to_string(),
        ));
    };

    let curves: Vec<(Vec<f64>, Vec<f64>)> = inputs
        .iter()
        .map(|cs| {
            cs.data
                .iter()
                .map(|&(e, sigma)| (e.ln(), sigma.ln()))
                .unzip()
        })
        .collect();

    let grid = log_grid(min_energy, max_energy);
    let mut data = Vec::with_capacity(grid.len());
    let mut dropped = 0;
    for energy in grid {
        let x = energy.ln();
        let total: f64 = curves
            .iter()
            .map(|(xp, fp)| {
                interp(x, xp, fp, EXTRAPOLATION_SENTINEL, EXTRAPOLATION_SENTINEL).exp()
            })
            .sum();

        if total.is_nan() {
            dropped += 1;
            continue;
        }
        let total = if total.abs() < NOISE_FLOOR { 0.0 } else { total };
        data.push((energy, total));
    }
    if dropped > 0 {
        warn!(dropped, "Dropped lumped grid points with undefined values");
    }

    let threshold = inputs
        .iter()
        .filter_map(|cs| cs.threshold)
        .reduce(f64::min);

    let mut references: Vec<&str> = Vec::new();
    for reference in inputs.iter().filter_map(|cs| cs.reference.as_deref()) {
        if !references.contains(&reference) {
            references.push(reference);
        }
    }
    let reference = (!references.is_empty()).then(|| references.join(","));

    debug!(inputs = inputs.len(), points = data.len(), "Lumped cross sections");
    Ok(LumpedCurve {
        data,
        threshold,
        reference,
    })
}
