//! Numeric collaborators invoked by commands.
//!
//! Pure functions over value arrays; the engine treats them as opaque and
//! only relies on their error signaling.

use thiserror::Error;

pub type TransformResult<T> = Result<T, TransformError>;

#[derive(Error, Debug, PartialEq)]
pub enum TransformError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-finite value for {what}")]
    NonFinite { what: &'static str },
}

fn is_missing(value: f64, missing: f64) -> bool {
    value.is_nan() || value == missing
}

/// Multiply every non-missing value in place.
pub fn scale_in_place(values: &mut [f64], factor: f64, missing: f64) -> TransformResult<()> {
    if !factor.is_finite() {
        return Err(TransformError::NonFinite {
            what: "scale factor",
        });
    }
    for v in values.iter_mut() {
        if !is_missing(*v, missing) {
            *v *= factor;
        }
    }
    Ok(())
}

/// Replace missing values with a constant, returning the number filled.
pub fn fill_constant(values: &mut [f64], fill: f64, missing: f64) -> usize {
    let mut filled = 0;
    for v in values.iter_mut() {
        if is_missing(*v, missing) {
            *v = fill;
            filled += 1;
        }
    }
    filled
}

/// Lag-K routing: shift the series by `lag` steps, then apply first-order
/// attenuation with storage coefficient `k` (in steps). `k = 0` is a pure
/// lag. Output before the lag horizon, and across missing input, is missing.
pub fn lag_k(values: &[f64], lag: usize, k: f64, missing: f64) -> TransformResult<Vec<f64>> {
    if !k.is_finite() || k < 0.0 {
        return Err(TransformError::InvalidArg {
            what: "k must be finite and non-negative",
        });
    }
    let c = 1.0 / (k + 1.0);
    let mut out = vec![missing; values.len()];
    let mut prev: Option<f64> = None;
    for i in lag..values.len() {
        let inflow = values[i - lag];
        if is_missing(inflow, missing) {
            prev = None;
            continue;
        }
        let routed = match prev {
            Some(p) => p + c * (inflow - p),
            None => inflow,
        };
        out[i] = routed;
        prev = Some(routed);
    }
    Ok(out)
}

/// Count non-missing values per percentile bin.
///
/// `percentiles` are ascending levels in (0,1); thresholds are computed
/// from the series' own distribution, giving `percentiles.len() + 1` bins.
/// The `legacy` flag preserves the historical inclusive-upper boundary
/// (`value <= threshold`); the standard boundary is exclusive
/// (`value < threshold`).
pub fn percentile_bin_counts(
    values: &[f64],
    percentiles: &[f64],
    legacy: bool,
    missing: f64,
) -> TransformResult<Vec<usize>> {
    if percentiles.is_empty() {
        return Err(TransformError::InvalidArg {
            what: "at least one percentile is required",
        });
    }
    for pair in percentiles.windows(2) {
        if pair[0] >= pair[1] {
            return Err(TransformError::InvalidArg {
                what: "percentiles must be strictly ascending",
            });
        }
    }
    if percentiles.iter().any(|p| !(0.0..1.0).contains(p) || *p <= 0.0) {
        return Err(TransformError::InvalidArg {
            what: "percentiles must be in (0,1)",
        });
    }

    let data: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| !is_missing(*v, missing))
        .collect();
    let mut counts = vec![0usize; percentiles.len() + 1];
    if data.is_empty() {
        return Ok(counts);
    }

    let mut sorted = data.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let thresholds: Vec<f64> = percentiles.iter().map(|p| quantile(&sorted, *p)).collect();

    for v in data {
        let bin = thresholds
            .iter()
            .position(|t| if legacy { v <= *t } else { v < *t })
            .unwrap_or(thresholds.len());
        counts[bin] += 1;
    }
    Ok(counts)
}

/// Linear-interpolation quantile over a sorted slice.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = p * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let frac = rank - lo as f64;
    if lo + 1 >= n {
        sorted[n - 1]
    } else {
        sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING: f64 = -999.0;

    #[test]
    fn scale_skips_missing() {
        let mut values = vec![1.0, MISSING, 3.0];
        scale_in_place(&mut values, 2.0, MISSING).unwrap();
        assert_eq!(values, vec![2.0, MISSING, 6.0]);
        assert!(scale_in_place(&mut values, f64::NAN, MISSING).is_err());
    }

    #[test]
    fn fill_counts_replacements() {
        let mut values = vec![1.0, MISSING, f64::NAN, 4.0];
        let filled = fill_constant(&mut values, 0.0, MISSING);
        assert_eq!(filled, 2);
        assert_eq!(values, vec![1.0, 0.0, 0.0, 4.0]);
        assert_eq!(fill_constant(&mut values, 0.0, MISSING), 0);
    }

    #[test]
    fn pure_lag_shifts_values() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        let out = lag_k(&values, 2, 0.0, MISSING).unwrap();
        assert_eq!(out, vec![MISSING, MISSING, 1.0, 2.0]);
    }

    #[test]
    fn attenuation_smooths_toward_inflow() {
        let values = vec![0.0, 10.0, 10.0, 10.0];
        let out = lag_k(&values, 0, 1.0, MISSING).unwrap();
        // First value passes through, then o[i] = o[i-1] + (in - o[i-1]) / 2.
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 5.0);
        assert_eq!(out[2], 7.5);
        assert_eq!(out[3], 8.75);
    }

    #[test]
    fn lag_k_rejects_negative_k() {
        assert!(lag_k(&[1.0], 0, -1.0, MISSING).is_err());
    }

    #[test]
    fn percentile_bins_standard_vs_legacy_boundary() {
        // Median of [1,2,3] is exactly 2, so the boundary rule matters.
        let values = vec![1.0, 2.0, 3.0];
        let standard = percentile_bin_counts(&values, &[0.5], false, MISSING).unwrap();
        assert_eq!(standard, vec![1, 2]); // 1 below, {2,3} at-or-above
        let legacy = percentile_bin_counts(&values, &[0.5], true, MISSING).unwrap();
        assert_eq!(legacy, vec![2, 1]); // {1,2} at-or-below, 3 above
    }

    #[test]
    fn percentile_bins_validate_levels() {
        let values = vec![1.0];
        assert!(percentile_bin_counts(&values, &[], false, MISSING).is_err());
        assert!(percentile_bin_counts(&values, &[0.75, 0.25], false, MISSING).is_err());
        assert!(percentile_bin_counts(&values, &[0.0], false, MISSING).is_err());
        assert!(percentile_bin_counts(&values, &[1.5], false, MISSING).is_err());
    }

    #[test]
    fn percentile_bins_of_all_missing_series() {
        let values = vec![MISSING, MISSING];
        let counts = percentile_bin_counts(&values, &[0.5], false, MISSING).unwrap();
        assert_eq!(counts, vec![0, 0]);
    }
}
