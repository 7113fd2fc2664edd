//! Copy command: duplicate a time series under a new identifier.

use crate::common::build_selector;
use hs_core::{TimeSeries, TsIdent};
use hs_engine::{
    ts_scope, Command, CommandBase, CommandContext, CommandError, ParamMap, Phase, PropertyStore,
    Request,
};

const ALLOWED: &[&str] = &["TSList", "TSID", "EnsembleID", "NewTSID", "Alias"];

/// Deep-copy the first matching input series, reassign its identifier to
/// `NewTSID`, and optionally set an alias from a template.
pub struct Copy {
    base: CommandBase,
}

impl Copy {
    pub fn new(params: ParamMap) -> Self {
        Self {
            base: CommandBase::new("Copy", params),
        }
    }

    pub fn boxed(params: ParamMap) -> Box<dyn Command> {
        Box::new(Self::new(params))
    }
}

impl Command for Copy {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn validate(&mut self, _properties: &PropertyStore) {
        self.base.check_allowed_params(ALLOWED);
        self.base.require_param("TSID");
        if let Some(tsid) = self.base.require_param("NewTSID") {
            if !tsid.contains("${") && TsIdent::parse(&tsid).is_err() {
                self.base.status.failure(
                    Phase::Initialization,
                    format!("NewTSID is not a valid identifier: {}", tsid),
                    "Use Location.DataType.Interval[.Scenario]",
                );
            }
        }
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
        let phase = ctx.phase();
        let raw_tsid = self.base.param("NewTSID").unwrap_or_default().to_string();
        let resolved_tsid = ctx.resolve(&raw_tsid).map_err(|e| {
            self.base.status.failure(
                phase,
                format!("Cannot resolve NewTSID: {}", e),
                "Define the referenced property before this command",
            );
            CommandError::Fatal { what: e.to_string() }
        })?;

        let ident = match TsIdent::parse(&resolved_tsid) {
            Ok(ident) => ident,
            Err(e) if phase == Phase::Discovery => {
                self.base.set_discovery(Vec::new());
                tracing::debug!(tsid = %resolved_tsid, error = %e, "skipping discovery header");
                return Ok(());
            }
            Err(e) => {
                self.base.status.failure(
                    phase,
                    format!("NewTSID is not a valid identifier: {}", resolved_tsid),
                    "Use Location.DataType.Interval[.Scenario]",
                );
                return Err(CommandError::Fatal { what: e.to_string() });
            }
        };

        if phase == Phase::Discovery {
            // The copy's contents are unknown until the run, but its header
            // is fully determined by NewTSID.
            let mut header = TimeSeries::header(ident.clone());
            if let Some(template) = self.base.param("Alias").filter(|a| !a.is_empty()) {
                header.alias = Some(
                    ctx.expand_alias(template, &ident, None)
                        .map_err(|e| CommandError::Fatal { what: e.to_string() })?,
                );
            }
            self.base.set_discovery(vec![header]);
            return Ok(());
        }

        let selector = build_selector(&self.base.params, ctx).map_err(|what| {
            self.base.status.failure(
                phase,
                format!("Cannot determine input time series: {}", what),
                "Correct the TSList/TSID/EnsembleID parameters",
            );
            CommandError::Fatal { what }
        })?;
        let indices = ctx
            .request(Request::ResolveSelection { selector })
            .and_then(|r| r.into_selection())
            .map_err(|e| {
                self.base.status.failure(
                    phase,
                    format!("Selection could not be resolved: {}", e),
                    "Verify that upstream commands produce the expected time series",
                );
                CommandError::Fatal { what: e.to_string() }
            })?;
        let source_index = match indices.first() {
            Some(index) => *index,
            None => {
                let what = format!(
                    "no time series matched {}",
                    self.base.params.get_or("TSID", "")
                );
                self.base.status.failure(
                    phase,
                    what.clone(),
                    "Run a command that produces the input series first",
                );
                return Err(CommandError::Fatal { what });
            }
        };

        let mut copy = ctx
            .request(Request::SeriesByIndex { index: source_index })
            .and_then(|r| r.into_series())
            .map_err(|e| CommandError::Fatal { what: e.to_string() })?;
        copy.ident = ident.clone();
        copy.alias = None;
        if let Some(template) = self.base.param("Alias").filter(|a| !a.is_empty()) {
            let scope = ts_scope(&copy);
            let alias = ctx.expand_alias(template, &ident, Some(&scope)).map_err(|e| {
                self.base.status.failure(
                    phase,
                    format!("Cannot expand Alias: {}", e),
                    "Define the referenced property before this command",
                );
                CommandError::Fatal { what: e.to_string() }
            })?;
            copy.alias = Some(alias);
        }
        ctx.append_series(copy);
        Ok(())
    }
}
