//! Execution context passed to commands.
//!
//! Replaces ambient processor state: every engine capability a command
//! needs during execute flows through the [`CommandContext`].

use crate::alias;
use crate::phase::Phase;
use crate::pool::{PoolView, ResultsPool};
use crate::properties::{PropertyError, PropertyStore, ScopeChain};
use crate::request::{Request, RequestError, Response};
use hs_core::{Ensemble, TimeSeries, TsIdent};

/// Engine-wide state shared by all commands of one pipeline.
#[derive(Debug, Default)]
pub struct EngineContext {
    pub pool: ResultsPool,
    pub properties: PropertyStore,
}

impl EngineContext {
    pub fn new(properties: PropertyStore) -> Self {
        Self {
            pool: ResultsPool::new(),
            properties,
        }
    }
}

/// Per-command view of the engine during one phase of execution.
pub struct CommandContext<'a> {
    engine: &'a mut EngineContext,
    command_index: usize,
    phase: Phase,
    command_scope: PropertyStore,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        engine: &'a mut EngineContext,
        command_index: usize,
        phase: Phase,
        command_scope: PropertyStore,
    ) -> Self {
        Self {
            engine,
            command_index,
            phase,
            command_scope,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn command_index(&self) -> usize {
        self.command_index
    }

    pub fn processor_property(&self, name: &str) -> Option<&str> {
        self.engine.properties.get(name)
    }

    /// Forward-only pool view for this command.
    pub fn view(&self) -> PoolView<'_> {
        self.engine.pool.view(self.command_index)
    }

    /// Resolve `${...}` tokens in a raw parameter value.
    ///
    /// Property resolution happens only during the run phase; in discovery
    /// the raw text passes through unchanged.
    pub fn resolve(&self, raw: &str) -> Result<String, PropertyError> {
        if self.phase != Phase::Run {
            return Ok(raw.to_string());
        }
        ScopeChain::new(&self.engine.properties)
            .with_command(&self.command_scope)
            .resolve(raw)
    }

    /// Expand an alias template for an output series, optionally pushing a
    /// per-series scope for `${ts:Name}` tokens.
    pub fn expand_alias(
        &self,
        template: &str,
        ident: &TsIdent,
        ts_scope: Option<&PropertyStore>,
    ) -> Result<String, PropertyError> {
        if self.phase != Phase::Run {
            // Discovery: skip the property pass, keep the percent pass.
            return Ok(alias::expand_percent(template, ident));
        }
        let mut chain =
            ScopeChain::new(&self.engine.properties).with_command(&self.command_scope);
        if let Some(scope) = ts_scope {
            chain = chain.with_ts(scope);
        }
        alias::expand_alias(template, &chain, ident)
    }

    /// Append an output series produced by this command.
    pub fn append_series(&mut self, series: TimeSeries) -> usize {
        self.engine.pool.append_series(self.command_index, series)
    }

    pub fn append_ensemble(&mut self, ensemble: Ensemble) -> usize {
        self.engine.pool.append_ensemble(self.command_index, ensemble)
    }

    /// In-place mutation of a visible series by its stable pool position.
    pub fn series_mut(&mut self, index: usize) -> Result<&mut TimeSeries, RequestError> {
        let before = self.command_index;
        self.engine
            .pool
            .series_mut_before(index, before)
            .ok_or_else(|| RequestError::NotFound {
                what: format!("no visible time series at position {}", index),
            })
    }

    /// Dispatch a mediator request.
    pub fn request(&mut self, request: Request) -> Result<Response, RequestError> {
        match request {
            Request::ResolveSelection { selector } => {
                let selection = selector.resolve(&self.view())?;
                Ok(Response::Selection {
                    indices: selection.indices,
                })
            }
            Request::SeriesByIndex { index } => {
                let series = self.view().series(index).ok_or_else(|| RequestError::NotFound {
                    what: format!("no visible time series at position {}", index),
                })?;
                Ok(Response::Series(Box::new(series.clone())))
            }
            Request::RecomputeLimits { index } => {
                let series = self.series_mut(index)?;
                series.compute_limits();
                let limits = series.limits.ok_or_else(|| RequestError::BusFailure {
                    what: format!("limits not computed for position {}", index),
                })?;
                Ok(Response::Limits(limits))
            }
            Request::RegisterTable { table } => {
                let index = self
                    .engine
                    .pool
                    .register_or_replace_table(self.command_index, table);
                Ok(Response::TableRegistered { index })
            }
            Request::SeriesPosition { key } => {
                let index = self
                    .view()
                    .position_of(&key)
                    .ok_or_else(|| RequestError::NotFound {
                        what: format!("no visible time series matching '{}'", key),
                    })?;
                Ok(Response::Position { index })
            }
        }
    }
}
