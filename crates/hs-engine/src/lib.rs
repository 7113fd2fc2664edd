//! hs-engine: the hydroscript command pipeline execution engine.
//!
//! Provides:
//! - Two-phase command protocol (discovery and run) with per-phase status logs
//! - Scoped property store with `${Name}` / `${ts:Name}` substitution
//! - Time-series list selection against a forward-only results pool view
//! - Typed request/response mediator between commands and the engine
//! - Sequential pipeline orchestration with progress and cancellation
//!
//! # Example
//!
//! ```
//! use hs_engine::{Pipeline, PropertyStore, Phase, RunOptions};
//!
//! let mut props = PropertyStore::new();
//! props.set("OutputStart", "2020-01-01");
//! let mut pipeline = Pipeline::new(props);
//! let report = pipeline.run(Phase::Run, &RunOptions::default()).unwrap();
//! assert!(report.commands.is_empty());
//! ```

pub mod alias;
pub mod command;
pub mod context;
pub mod error;
pub mod params;
pub mod phase;
pub mod pipeline;
pub mod pool;
pub mod properties;
pub mod request;
pub mod selector;
pub mod status;

pub use alias::{expand_alias, expand_percent, ts_scope};
pub use command::{validation_failed, Command, CommandBase, CommandError};
pub use context::{CommandContext, EngineContext};
pub use error::{EngineError, EngineResult};
pub use params::ParamMap;
pub use phase::{Phase, Severity};
pub use pipeline::{CommandReport, Pipeline, ProgressEvent, RunOptions, RunReport};
pub use pool::{PoolView, ResultsPool};
pub use properties::{PropertyError, PropertyStore, ScopeChain};
pub use request::{Request, RequestError, Response};
pub use selector::{ListMode, ResolvedSelection, SelectorError, TsSelector};
pub use status::{StatusEntry, StatusLog};
