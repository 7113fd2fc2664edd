//! AnalyzePattern command: percentile-bin counts into a pattern table.

use crate::common::{check_literal_bool, resolve_selection};
use crate::transforms;
use hs_core::Table;
use hs_engine::{
    Command, CommandBase, CommandContext, CommandError, ParamMap, Phase, PropertyStore, Request,
};

const ALLOWED: &[&str] = &["TSList", "TSID", "Percentiles", "PatternID", "Legacy"];

/// Classify each selected series' non-missing values into percentile bins
/// and register the counts as a table.
///
/// `Percentiles` is a comma-separated list of ascending levels in (0,1);
/// `N` levels yield `N + 1` bins per series. The table has one row per
/// series: identifier, then one count column per bin.
///
/// `Legacy=True` keeps the historical inclusive-upper bin boundary
/// (`value <= threshold`) instead of the exclusive one.
pub struct AnalyzePattern {
    base: CommandBase,
}

impl AnalyzePattern {
    pub fn new(params: ParamMap) -> Self {
        Self {
            base: CommandBase::new("AnalyzePattern", params),
        }
    }

    pub fn boxed(params: ParamMap) -> Box<dyn Command> {
        Box::new(Self::new(params))
    }
}

fn parse_percentiles(raw: &str) -> Result<Vec<f64>, String> {
    let levels: Result<Vec<f64>, _> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::parse::<f64>)
        .collect();
    levels.map_err(|_| format!("Percentiles is not a list of numbers: {}", raw))
}

impl Command for AnalyzePattern {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn validate(&mut self, _properties: &PropertyStore) {
        self.base.check_allowed_params(ALLOWED);
        self.base.require_param("PatternID");
        check_literal_bool(&mut self.base, "Legacy");
        if let Some(raw) = self.base.require_param("Percentiles") {
            if !raw.contains("${") {
                match parse_percentiles(&raw) {
                    Ok(levels) => {
                        let ascending = levels.windows(2).all(|p| p[0] < p[1]);
                        let in_range = levels.iter().all(|p| *p > 0.0 && *p < 1.0);
                        if levels.is_empty() || !ascending || !in_range {
                            self.base.status.failure(
                                Phase::Initialization,
                                format!("Percentiles must be ascending levels in (0,1): {}", raw),
                                "Example: Percentiles=\"0.25,0.5,0.75\"",
                            );
                        }
                    }
                    Err(what) => {
                        self.base.status.failure(
                            Phase::Initialization,
                            what,
                            "Example: Percentiles=\"0.25,0.5,0.75\"",
                        );
                    }
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

        let raw = self.base.param("Percentiles").unwrap_or_default().to_string();
        let resolved = ctx.resolve(&raw).map_err(|e| {
            self.base.status.failure(
                phase,
                format!("Cannot resolve Percentiles: {}", e),
                "Define the referenced property before this command",
            );
            CommandError::Fatal { what: e.to_string() }
        })?;
        let percentiles = parse_percentiles(&resolved).map_err(|what| {
            self.base.status.failure(
                phase,
                what.clone(),
                "Example: Percentiles=\"0.25,0.5,0.75\"",
            );
            CommandError::Fatal { what }
        })?;
        let legacy = self
            .base
            .params
            .get_or("Legacy", "False")
            .eq_ignore_ascii_case("true");
        let raw_id = self.base.param("PatternID").unwrap_or_default().to_string();
        let pattern_id = ctx.resolve(&raw_id).map_err(|e| {
            self.base.status.failure(
                phase,
                format!("Cannot resolve PatternID: {}", e),
                "Define the referenced property before this command",
            );
            CommandError::Fatal { what: e.to_string() }
        })?;

        let indices = resolve_selection(&mut self.base, ctx)?;

        let mut columns = vec!["TSID".to_string()];
        for bin in 0..=percentiles.len() {
            columns.push(format!("Bin{}", bin + 1));
        }
        let mut table = Table::new(pattern_id, columns);

        let mut failures = 0usize;
        for index in indices {
            let (ident, counts) = {
                let view = ctx.view();
                let series = match view.series(index) {
                    Some(series) => series,
                    None => {
                        self.base.status.failure(
                            phase,
                            format!("Cannot access time series at position {}", index),
                            "Verify that the series is produced by an earlier command",
                        );
                        failures += 1;
                        continue;
                    }
                };
                match transforms::percentile_bin_counts(
                    &series.values,
                    &percentiles,
                    legacy,
                    series.missing_value,
                ) {
                    Ok(counts) => (series.ident.to_string(), counts),
                    Err(e) => {
                        self.base.status.failure(
                            phase,
                            format!("Pattern analysis failed for {}: {}", series.ident, e),
                            "Specify ascending percentile levels in (0,1)",
                        );
                        failures += 1;
                        continue;
                    }
                }
            };
            let mut row = vec![ident];
            row.extend(counts.iter().map(usize::to_string));
            table.rows.push(row);
        }

        ctx.request(Request::RegisterTable { table })
            .map_err(|e| CommandError::Fatal { what: e.to_string() })?;
        if failures > 0 {
            return Err(CommandError::Warning {
                what: format!("{} time series could not be analyzed", failures),
            });
        }
        Ok(())
    }
}
