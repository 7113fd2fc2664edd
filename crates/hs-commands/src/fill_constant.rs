//! FillConstant command: replace missing values with a constant.

use crate::common::{check_literal_f64, resolve_selection};
use crate::transforms;
use hs_engine::{
    Command, CommandBase, CommandContext, CommandError, ParamMap, Phase, PropertyStore, Request,
};

const ALLOWED: &[&str] = &["TSList", "TSID", "EnsembleID", "ConstantValue"];

/// Fill every missing value of each selected series with `ConstantValue`,
/// logging the per-series fill count.
pub struct FillConstant {
    base: CommandBase,
}

impl FillConstant {
    pub fn new(params: ParamMap) -> Self {
        Self {
            base: CommandBase::new("FillConstant", params),
        }
    }

    pub fn boxed(params: ParamMap) -> Box<dyn Command> {
        Box::new(Self::new(params))
    }
}

impl Command for FillConstant {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn validate(&mut self, _properties: &PropertyStore) {
        self.base.check_allowed_params(ALLOWED);
        self.base.require_param("ConstantValue");
        check_literal_f64(&mut self.base, "ConstantValue");
    }

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
        let phase = ctx.phase();
        if phase == Phase::Discovery {
            self.base.set_discovery(Vec::new());
            return Ok(());
        }

        let raw = self
            .base
            .param("ConstantValue")
            .unwrap_or_default()
            .to_string();
        let resolved = ctx.resolve(&raw).map_err(|e| {
            self.base.status.failure(
                phase,
                format!("Cannot resolve ConstantValue: {}", e),
                "Define the referenced property before this command",
            );
            CommandError::Fatal { what: e.to_string() }
        })?;
        let fill: f64 = resolved.parse().map_err(|_| {
            let what = format!("ConstantValue is not a number: {}", resolved);
            self.base.status.failure(
                phase,
                what.clone(),
                "Specify a numeric ConstantValue",
            );
            CommandError::Fatal { what }
        })?;

        let indices = resolve_selection(&mut self.base, ctx)?;
        let mut untouched = 0usize;
        for index in indices {
            let filled = {
                let series = match ctx.series_mut(index) {
                    Ok(series) => series,
                    Err(e) => {
                        self.base.status.failure(
                            phase,
                            format!("Cannot access time series at position {}: {}", index, e),
                            "Verify that the series is produced by an earlier command",
                        );
                        continue;
                    }
                };
                let missing = series.missing_value;
                let filled = transforms::fill_constant(&mut series.values, fill, missing);
                if filled == 0 {
                    self.base.status.warning(
                        phase,
                        format!("No missing values to fill in {}", series.ident),
                        "Verify that the series actually has gaps",
                    );
                    untouched += 1;
                } else {
                    self.base.status.add(
                        phase,
                        hs_engine::Severity::Success,
                        format!("Filled {} values in {}", filled, series.ident),
                        "",
                    );
                }
                filled
            };
            if filled > 0 {
                if let Err(e) = ctx.request(Request::RecomputeLimits { index }) {
                    tracing::warn!(index, error = %e, "limits not refreshed after filling");
                }
            }
        }
        if untouched > 0 {
            return Err(CommandError::Warning {
                what: format!("{} time series had no missing values", untouched),
            });
        }
        Ok(())
    }
}
