//! LagK command: route a series through lag and attenuation, in place.

use crate::common::{check_literal_f64, resolve_selection};
use crate::transforms;
use hs_engine::{
    Command, CommandBase, CommandContext, CommandError, ParamMap, Phase, PropertyStore, Request,
};

const ALLOWED: &[&str] = &["TSList", "TSID", "EnsembleID", "Lag", "K"];

/// Route each selected series through the lag-K collaborator: shift by
/// `Lag` whole steps, then attenuate with storage coefficient `K`
/// (expressed in steps; `K=0` is a pure lag).
pub struct LagK {
    base: CommandBase,
}

impl LagK {
    pub fn new(params: ParamMap) -> Self {
        Self {
            base: CommandBase::new("LagK", params),
        }
    }

    pub fn boxed(params: ParamMap) -> Box<dyn Command> {
        Box::new(Self::new(params))
    }

    fn numeric_param(
        &mut self,
        ctx: &CommandContext<'_>,
        name: &str,
        default: f64,
    ) -> Result<f64, CommandError> {
        let phase = ctx.phase();
        let raw = match self.base.param(name).filter(|v| !v.is_empty()) {
            Some(v) => v.to_string(),
            None => return Ok(default),
        };
        let resolved = ctx.resolve(&raw).map_err(|e| {
            self.base.status.failure(
                phase,
                format!("Cannot resolve {}: {}", name, e),
                "Define the referenced property before this command",
            );
            CommandError::Fatal { what: e.to_string() }
        })?;
        resolved.parse::<f64>().map_err(|_| {
            let what = format!("{} is not a number: {}", name, resolved);
            self.base.status.failure(
                phase,
                what.clone(),
                format!("Specify a numeric value for {}", name),
            );
            CommandError::Fatal { what }
        })
    }
}

impl Command for LagK {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn validate(&mut self, _properties: &PropertyStore) {
        self.base.check_allowed_params(ALLOWED);
        self.base.require_param("TSID");
        check_literal_f64(&mut self.base, "Lag");
        check_literal_f64(&mut self.base, "K");
        if let Some(lag) = self.base.params.get("Lag") {
            if let Ok(v) = lag.parse::<f64>() {
                if v < 0.0 || v.fract() != 0.0 {
                    self.base.status.failure(
                        Phase::Initialization,
                        format!("Lag must be a non-negative whole number of steps: {}", lag),
                        "Specify Lag as a whole step count",
                    );
                }
            }
        }
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
        let phase = ctx.phase();
        if phase == Phase::Discovery {
            self.base.set_discovery(Vec::new());
            return Ok(());
        }

        let lag = self.numeric_param(ctx, "Lag", 0.0)?;
        if lag < 0.0 || lag.fract() != 0.0 {
            let what = format!("Lag must be a non-negative whole number of steps: {}", lag);
            self.base.status.failure(
                phase,
                what.clone(),
                "Specify Lag as a whole step count",
            );
            return Err(CommandError::Fatal { what });
        }
        let lag = lag as usize;
        let k = self.numeric_param(ctx, "K", 0.0)?;

        let indices = resolve_selection(&mut self.base, ctx)?;
        let mut failures = 0usize;
        for index in indices {
            {
                let series = match ctx.series_mut(index) {
                    Ok(series) => series,
                    Err(e) => {
                        self.base.status.failure(
                            phase,
                            format!("Cannot access time series at position {}: {}", index, e),
                            "Verify that the series is produced by an earlier command",
                        );
                        failures += 1;
                        continue;
                    }
                };
                let missing = series.missing_value;
                match transforms::lag_k(&series.values, lag, k, missing) {
                    Ok(routed) => series.values = routed,
                    Err(e) => {
                        self.base.status.failure(
                            phase,
                            format!("Routing failed for {}: {}", series.ident, e),
                            "Specify finite, non-negative Lag and K",
                        );
                        failures += 1;
                        continue;
                    }
                }
            }
            if let Err(e) = ctx.request(Request::RecomputeLimits { index }) {
                tracing::warn!(index, error = %e, "limits not refreshed after routing");
            }
        }
        if failures > 0 {
            return Err(CommandError::Warning {
                what: format!("{} time series could not be routed", failures),
            });
        }
        Ok(())
    }
}
