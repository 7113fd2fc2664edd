//! Time-series, ensemble, and table value types.

use crate::ident::TsIdent;
use chrono::NaiveDate;

/// Default sentinel for missing data points.
pub const DEFAULT_MISSING: f64 = -999.0;

/// Derived summary statistics for a time series, skipping missing values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesLimits {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub missing_count: usize,
    pub non_missing_count: usize,
}

/// A single time series: identifier, metadata, and a regular value array.
///
/// A header-only series (empty value array, `start` possibly unset) is the
/// discovery-phase representation; full data exists only after a run.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSeries {
    pub ident: TsIdent,
    pub alias: Option<String>,
    pub units: String,
    pub description: String,
    pub start: Option<NaiveDate>,
    pub values: Vec<f64>,
    pub missing_value: f64,
    pub limits: Option<SeriesLimits>,
}

impl TimeSeries {
    /// Create a header-only series (no data), as produced in discovery.
    pub fn header(ident: TsIdent) -> Self {
        Self {
            ident,
            alias: None,
            units: String::new(),
            description: String::new(),
            start: None,
            values: Vec::new(),
            missing_value: DEFAULT_MISSING,
            limits: None,
        }
    }

    pub fn is_header_only(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_missing(&self, value: f64) -> bool {
        value.is_nan() || value == self.missing_value
    }

    /// Count of missing points in the value array.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| self.is_missing(**v)).count()
    }

    /// Recompute derived limits over non-missing values.
    ///
    /// A series with no non-missing data gets limits with zero counts and
    /// zeroed statistics rather than NaN.
    pub fn compute_limits(&mut self) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut n = 0usize;
        let mut missing = 0usize;
        for &v in &self.values {
            if self.is_missing(v) {
                missing += 1;
                continue;
            }
            min = min.min(v);
            max = max.max(v);
            sum += v;
            n += 1;
        }
        self.limits = Some(if n == 0 {
            SeriesLimits {
                missing_count: missing,
                ..SeriesLimits::default()
            }
        } else {
            SeriesLimits {
                min,
                max,
                mean: sum / n as f64,
                missing_count: missing,
                non_missing_count: n,
            }
        });
    }
}

/// A named group of series, holding stable member positions in the
/// results pool.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ensemble {
    pub id: String,
    pub name: String,
    pub members: Vec<usize>,
}

/// A simple string table registered by commands.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Table {
    pub id: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(id: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            id: id.into(),
            columns,
            rows: Vec::new(),
        }
    }
}
