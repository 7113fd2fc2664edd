//! Typed request/response mediator between commands and the engine.
//!
//! Commands never reach into the pool directly for cross-command state;
//! they issue requests against their [`CommandContext`] and handle a
//! missing result by logging a FAILURE entry and continuing with the next
//! item of their own loop.
//!
//! [`CommandContext`]: crate::context::CommandContext

use crate::selector::{SelectorError, TsSelector};
use hs_core::{SeriesLimits, Table, TimeSeries};
use thiserror::Error;

/// Named operations commands may issue against the engine.
#[derive(Clone, Debug)]
pub enum Request {
    /// Resolve a selection against the forward-only pool view.
    ResolveSelection { selector: TsSelector },
    /// Fetch a copy of a visible series by stable pool position.
    SeriesByIndex { index: usize },
    /// Recompute derived limits of a visible series in place.
    RecomputeLimits { index: usize },
    /// Register a table, replacing an existing table with the same id.
    RegisterTable { table: Table },
    /// Stable pool position of a series by alias or identifier.
    SeriesPosition { key: String },
}

/// Responses paired with [`Request`] variants.
#[derive(Clone, Debug)]
pub enum Response {
    Selection { indices: Vec<usize> },
    Series(Box<TimeSeries>),
    Limits(SeriesLimits),
    TableRegistered { index: usize },
    Position { index: usize },
}

/// Request failures. `NotFound` severity is policy-dependent at the call
/// site; `BusFailure` is always a FAILURE.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("No result for request: {what}")]
    NotFound { what: String },

    #[error("Request failed: {what}")]
    BusFailure { what: String },

    #[error(transparent)]
    Selector(#[from] SelectorError),
}

impl Response {
    /// Selection indices, or a `BusFailure` if the response kind is wrong.
    pub fn into_selection(self) -> Result<Vec<usize>, RequestError> {
        match self {
            Response::Selection { indices } => Ok(indices),
            other => Err(mismatch("Selection", &other)),
        }
    }

    pub fn into_series(self) -> Result<TimeSeries, RequestError> {
        match self {
            Response::Series(ts) => Ok(*ts),
            other => Err(mismatch("Series", &other)),
        }
    }

    pub fn into_position(self) -> Result<usize, RequestError> {
        match self {
            Response::Position { index } => Ok(index),
            other => Err(mismatch("Position", &other)),
        }
    }
}

fn mismatch(expected: &str, got: &Response) -> RequestError {
    RequestError::BusFailure {
        what: format!("expected {} response, got {:?}", expected, got),
    }
}
