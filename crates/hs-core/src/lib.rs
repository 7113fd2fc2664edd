//! hs-core: shared data model for the hydroscript pipeline.
//!
//! Provides:
//! - Composite time-series identifiers with wildcard matching
//! - Time-series, ensemble, and table value types
//! - Data intervals and derived series limits

pub mod error;
pub mod ident;
pub mod series;

pub use error::{CoreError, CoreResult};
pub use ident::{Interval, TsIdent};
pub use series::{Ensemble, SeriesLimits, Table, TimeSeries, DEFAULT_MISSING};
