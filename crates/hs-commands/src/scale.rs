//! Scale command: multiply selected series by a factor, in place.

use crate::common::{check_literal_f64, resolve_selection};
use crate::transforms;
use hs_engine::{
    Command, CommandBase, CommandContext, CommandError, ParamMap, Phase, PropertyStore, Request,
};

const ALLOWED: &[&str] = &["TSList", "TSID", "EnsembleID", "ScaleValue"];

/// Multiply every non-missing value of each selected series by
/// `ScaleValue`. Mutates the pool in place; no new series are appended.
pub struct Scale {
    base: CommandBase,
}

impl Scale {
    pub fn new(params: ParamMap) -> Self {
        Self {
            base: CommandBase::new("Scale", params),
        }
    }

    pub fn boxed(params: ParamMap) -> Box<dyn Command> {
        Box::new(Self::new(params))
    }
}

impl Command for Scale {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn validate(&mut self, _properties: &PropertyStore) {
        self.base.check_allowed_params(ALLOWED);
        self.base.require_param("ScaleValue");
        check_literal_f64(&mut self.base, "ScaleValue");
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
        let phase = ctx.phase();
        if phase == Phase::Discovery {
            // Mutates existing series only; nothing new to advertise.
            self.base.set_discovery(Vec::new());
            return Ok(());
        }

        let raw = self.base.param("ScaleValue").unwrap_or_default().to_string();
        let resolved = ctx.resolve(&raw).map_err(|e| {
            self.base.status.failure(
                phase,
                format!("Cannot resolve ScaleValue: {}", e),
                "Define the referenced property before this command",
            );
            CommandError::Fatal { what: e.to_string() }
        })?;
        let factor: f64 = resolved.parse().map_err(|_| {
            let what = format!("ScaleValue is not a number: {}", resolved);
            self.base.status.failure(
                phase,
                what.clone(),
                "Specify a numeric ScaleValue",
            );
            CommandError::Fatal { what }
        })?;

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
                if let Err(e) =
                    transforms::scale_in_place(&mut series.values, factor, missing)
                {
                    self.base.status.failure(
                        phase,
                        format!("Scaling failed for {}: {}", series.ident, e),
                        "Specify a finite ScaleValue",
                    );
                    failures += 1;
                    continue;
                }
            }
            if let Err(e) = ctx.request(Request::RecomputeLimits { index }) {
                tracing::warn!(index, error = %e, "limits not refreshed after scaling");
            }
        }
        if failures > 0 {
            return Err(CommandError::Warning {
                what: format!("{} time series could not be scaled", failures),
            });
        }
        Ok(())
    }
}
