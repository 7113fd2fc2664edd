//! NewTimeSeries command: create a series with a constant initial value.

use crate::common::check_literal_f64;
use chrono::{Datelike, NaiveDate};
use hs_core::{Interval, TimeSeries, TsIdent, DEFAULT_MISSING};
use hs_engine::{
    Command, CommandBase, CommandContext, CommandError, ParamMap, Phase, PropertyStore,
};

const ALLOWED: &[&str] = &[
    "NewTSID",
    "Alias",
    "Description",
    "Units",
    "SetStart",
    "SetEnd",
    "InitialValue",
];

/// Create a new time series over a date range.
///
/// The period defaults to the processor's `OutputStart`/`OutputEnd`
/// properties when `SetStart`/`SetEnd` are not given. Values are
/// initialized to `InitialValue`, or to the missing sentinel when unset.
pub struct NewTimeSeries {
    base: CommandBase,
}

impl NewTimeSeries {
    pub fn new(params: ParamMap) -> Self {
        Self {
            base: CommandBase::new("NewTimeSeries", params),
        }
    }

    pub fn boxed(params: ParamMap) -> Box<dyn Command> {
        Box::new(Self::new(params))
    }

    fn period_bound(
        &self,
        ctx: &CommandContext<'_>,
        param: &str,
        property: &str,
    ) -> Result<NaiveDate, String> {
        let raw = match self.base.param(param) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => ctx
                .processor_property(property)
                .map(str::to_string)
                .ok_or_else(|| {
                    format!("{} is not set and processor {} is undefined", param, property)
                })?,
        };
        let resolved = ctx.resolve(&raw).map_err(|e| e.to_string())?;
        NaiveDate::parse_from_str(&resolved, "%Y-%m-%d")
            .map_err(|_| format!("{} is not a date (expected YYYY-MM-DD): {}", param, resolved))
    }
}

impl Command for NewTimeSeries {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn validate(&mut self, _properties: &PropertyStore) {
        self.base.check_allowed_params(ALLOWED);
        if let Some(tsid) = self.base.require_param("NewTSID") {
            if !tsid.contains("${") && TsIdent::parse(&tsid).is_err() {
                self.base.status.failure(
                    Phase::Initialization,
                    format!("NewTSID is not a valid identifier: {}", tsid),
                    "Use Location.DataType.Interval[.Scenario]",
                );
            }
        }
        check_literal_f64(&mut self.base, "InitialValue");
        for name in ["SetStart", "SetEnd"] {
            if let Some(v) = self.base.params.get(name) {
                if !v.is_empty()
                    && !v.contains("${")
                    && NaiveDate::parse_from_str(v, "%Y-%m-%d").is_err()
                {
                    self.base.status.failure(
                        Phase::Initialization,
                        format!("{} is not a date: {}", name, v),
                        "Use the format YYYY-MM-DD",
                    );
                }
            }
        }
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
        let phase = ctx.phase();
        let raw_tsid = self
            .base
            .param("NewTSID")
            .unwrap_or_default()
            .to_string();
        let resolved_tsid = match ctx.resolve(&raw_tsid) {
            Ok(v) => v,
            Err(e) => {
                self.base.status.failure(
                    phase,
                    format!("Cannot resolve NewTSID: {}", e),
                    "Define the referenced property before this command",
                );
                return Err(CommandError::Fatal { what: e.to_string() });
            }
        };

        let ident = match TsIdent::parse(&resolved_tsid) {
            Ok(ident) => ident,
            Err(e) if phase == Phase::Discovery => {
                // Unresolvable in discovery (e.g. templated TSID); no header.
                tracing::debug!(tsid = %resolved_tsid, error = %e, "skipping discovery header");
                self.base.set_discovery(Vec::new());
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

        let mut series = TimeSeries::header(ident.clone());
        series.units = self.base.params.get_or("Units", "").to_string();
        series.description = self.base.params.get_or("Description", "").to_string();
        if let Some(template) = self.base.param("Alias").filter(|a| !a.is_empty()) {
            match ctx.expand_alias(template, &ident, None) {
                Ok(alias) => series.alias = Some(alias),
                Err(e) => {
                    self.base.status.failure(
                        phase,
                        format!("Cannot expand Alias: {}", e),
                        "Define the referenced property before this command",
                    );
                    return Err(CommandError::Fatal { what: e.to_string() });
                }
            }
        }

        if phase == Phase::Discovery {
            self.base.set_discovery(vec![series]);
            return Ok(());
        }

        let start = self
            .period_bound(ctx, "SetStart", "OutputStart")
            .map_err(|what| {
                self.base.status.failure(
                    phase,
                    what.clone(),
                    "Set SetStart or the processor OutputStart property",
                );
                CommandError::Fatal { what }
            })?;
        let end = self
            .period_bound(ctx, "SetEnd", "OutputEnd")
            .map_err(|what| {
                self.base.status.failure(
                    phase,
                    what.clone(),
                    "Set SetEnd or the processor OutputEnd property",
                );
                CommandError::Fatal { what }
            })?;
        if end < start {
            let what = format!("period end {} precedes start {}", end, start);
            self.base.status.failure(
                phase,
                what.clone(),
                "Swap the period bounds",
            );
            return Err(CommandError::Fatal { what });
        }

        let initial = match self.base.param("InitialValue").filter(|v| !v.is_empty()) {
            Some(raw) => {
                let resolved = ctx.resolve(raw).map_err(|e| {
                    self.base.status.failure(
                        phase,
                        format!("Cannot resolve InitialValue: {}", e),
                        "Define the referenced property before this command",
                    );
                    CommandError::Fatal { what: e.to_string() }
                })?;
                resolved.parse::<f64>().map_err(|_| {
                    let what = format!("InitialValue is not a number: {}", resolved);
                    self.base.status.failure(
                        phase,
                        what.clone(),
                        "Specify a numeric InitialValue",
                    );
                    CommandError::Fatal { what }
                })?
            }
            None => DEFAULT_MISSING,
        };

        match steps_between(start, end, ident.interval) {
            Some(steps) => {
                series.start = Some(start);
                series.values = vec![initial; steps];
            }
            None => {
                self.base.status.warning(
                    phase,
                    "Irregular interval series created without data",
                    "Use a regular interval to allocate a value array",
                );
            }
        }
        series.compute_limits();
        ctx.append_series(series);
        Ok(())
    }
}

/// Number of regular steps from start to end inclusive, or None for
/// irregular series.
fn steps_between(start: NaiveDate, end: NaiveDate, interval: Interval) -> Option<usize> {
    let days = (end - start).num_days();
    debug_assert!(days >= 0);
    let days = days as usize;
    match interval {
        Interval::Day => Some(days + 1),
        Interval::Month => {
            let months = (end.year() - start.year()) * 12 + end.month() as i32
                - start.month() as i32;
            Some(months.max(0) as usize + 1)
        }
        Interval::Year => Some((end.year() - start.year()).max(0) as usize + 1),
        Interval::Hour(n) => Some(days * 24 / n as usize + 1),
        Interval::Minute(n) => Some(days * 1440 / n as usize + 1),
        Interval::Irregular => None,
    }
}
