//! Time-series list selection against a pool view.

use crate::pool::PoolView;
use crate::properties::contains_token;
use core::fmt;
use hs_core::TimeSeries;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Pattern contains an unresolved property token: {pattern}")]
    UnresolvedToken { pattern: String },

    #[error("Selection mode {mode} requires parameter {param}")]
    MissingParameter { mode: ListMode, param: &'static str },

    #[error("Ensemble not found: {id}")]
    EnsembleNotFound { id: String },

    #[error("Unrecognized TSList value: {value}")]
    UnknownMode { value: String },
}

/// How a command selects its input series.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListMode {
    All,
    AllMatching,
    FirstMatching,
    LastMatching,
    EnsembleId,
}

impl fmt::Display for ListMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Canonical script spellings.
        match self {
            ListMode::All => write!(f, "AllTS"),
            ListMode::AllMatching => write!(f, "AllMatchingTSID"),
            ListMode::FirstMatching => write!(f, "FirstMatchingTSID"),
            ListMode::LastMatching => write!(f, "LastMatchingTSID"),
            ListMode::EnsembleId => write!(f, "EnsembleID"),
        }
    }
}

impl FromStr for ListMode {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, SelectorError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allts" | "all" => Ok(ListMode::All),
            "allmatchingtsid" => Ok(ListMode::AllMatching),
            "firstmatchingtsid" => Ok(ListMode::FirstMatching),
            "lastmatchingtsid" => Ok(ListMode::LastMatching),
            "ensembleid" => Ok(ListMode::EnsembleId),
            _ => Err(SelectorError::UnknownMode {
                value: s.to_string(),
            }),
        }
    }
}

/// A (mode, pattern, ensemble id) selection.
///
/// The pattern must already have its properties resolved; the selector
/// never performs substitution itself.
#[derive(Clone, Debug)]
pub struct TsSelector {
    pub mode: ListMode,
    pub pattern: Option<String>,
    pub ensemble_id: Option<String>,
}

/// Result of resolving a selector: series references plus their stable
/// pool positions, in pool order. `series.len() == indices.len()` always.
#[derive(Debug)]
pub struct ResolvedSelection<'a> {
    pub series: Vec<&'a TimeSeries>,
    pub indices: Vec<usize>,
}

impl<'a> ResolvedSelection<'a> {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl TsSelector {
    pub fn all() -> Self {
        Self {
            mode: ListMode::All,
            pattern: None,
            ensemble_id: None,
        }
    }

    pub fn matching(mode: ListMode, pattern: impl Into<String>) -> Self {
        Self {
            mode,
            pattern: Some(pattern.into()),
            ensemble_id: None,
        }
    }

    pub fn ensemble(id: impl Into<String>) -> Self {
        Self {
            mode: ListMode::EnsembleId,
            pattern: None,
            ensemble_id: Some(id.into()),
        }
    }

    /// Resolve the selection against a pool view.
    ///
    /// An empty pool or zero matches is an empty, non-error result; callers
    /// decide whether that is fatal for their own requirement strictness.
    pub fn resolve<'a>(&self, view: &PoolView<'a>) -> Result<ResolvedSelection<'a>, SelectorError> {
        match self.mode {
            ListMode::All => Ok(collect(view.series_iter())),
            ListMode::AllMatching | ListMode::FirstMatching | ListMode::LastMatching => {
                let pattern = self.pattern.as_deref().filter(|p| !p.is_empty()).ok_or(
                    SelectorError::MissingParameter {
                        mode: self.mode,
                        param: "TSID",
                    },
                )?;
                if contains_token(pattern) {
                    return Err(SelectorError::UnresolvedToken {
                        pattern: pattern.to_string(),
                    });
                }
                let mut all = collect(
                    view.series_iter()
                        .filter(|(_, ts)| ts.ident.matches(pattern)),
                );
                match self.mode {
                    ListMode::FirstMatching => {
                        all.series.truncate(1);
                        all.indices.truncate(1);
                    }
                    ListMode::LastMatching => {
                        if all.len() > 1 {
                            let last = all.len() - 1;
                            all.series = vec![all.series[last]];
                            all.indices = vec![all.indices[last]];
                        }
                    }
                    _ => {}
                }
                Ok(all)
            }
            ListMode::EnsembleId => {
                let id = self.ensemble_id.as_deref().filter(|p| !p.is_empty()).ok_or(
                    SelectorError::MissingParameter {
                        mode: self.mode,
                        param: "EnsembleID",
                    },
                )?;
                if contains_token(id) {
                    return Err(SelectorError::UnresolvedToken {
                        pattern: id.to_string(),
                    });
                }
                let ensemble = view
                    .ensemble(id)
                    .ok_or_else(|| SelectorError::EnsembleNotFound { id: id.to_string() })?;
                let mut series = Vec::new();
                let mut indices = Vec::new();
                for &member in &ensemble.members {
                    if let Some(ts) = view.series(member) {
                        series.push(ts);
                        indices.push(member);
                    }
                }
                Ok(ResolvedSelection { series, indices })
            }
        }
    }
}

fn collect<'a>(iter: impl Iterator<Item = (usize, &'a TimeSeries)>) -> ResolvedSelection<'a> {
    let mut series = Vec::new();
    let mut indices = Vec::new();
    for (i, ts) in iter {
        indices.push(i);
        series.push(ts);
    }
    ResolvedSelection { series, indices }
}
