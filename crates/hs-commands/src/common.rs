//! Shared helpers for command implementations.

use hs_engine::{
    CommandBase, CommandContext, CommandError, ListMode, ParamMap, Request, TsSelector,
};

/// Build a selector from the conventional TSList/TSID/EnsembleID parameters,
/// resolving properties through the context. Returns a message on failure
/// for the caller to log.
///
/// When TSList is not given, a non-empty TSID implies AllMatchingTSID;
/// otherwise the selection defaults to AllTS.
pub(crate) fn build_selector(
    params: &ParamMap,
    ctx: &CommandContext<'_>,
) -> Result<TsSelector, String> {
    let default_mode = if params.get("TSID").is_some_and(|v| !v.is_empty()) {
        "AllMatchingTSID"
    } else {
        "AllTS"
    };
    let mode: ListMode = params
        .get_or("TSList", default_mode)
        .parse()
        .map_err(|e: hs_engine::SelectorError| e.to_string())?;
    match mode {
        ListMode::All => Ok(TsSelector::all()),
        ListMode::EnsembleId => {
            let id = params
                .get("EnsembleID")
                .filter(|v| !v.is_empty())
                .ok_or_else(|| "TSList=EnsembleID requires EnsembleID".to_string())?;
            let id = ctx.resolve(id).map_err(|e| e.to_string())?;
            Ok(TsSelector::ensemble(id))
        }
        mode => {
            let pattern = params
                .get("TSID")
                .filter(|v| !v.is_empty())
                .ok_or_else(|| format!("TSList={} requires TSID", mode))?;
            let pattern = ctx.resolve(pattern).map_err(|e| e.to_string())?;
            Ok(TsSelector::matching(mode, pattern))
        }
    }
}

/// Resolve the command's input selection, logging a FAILURE entry and
/// returning a fatal error when the selection itself cannot be resolved.
/// A zero-match result is not an error here; callers apply their own
/// strictness.
pub(crate) fn resolve_selection(
    base: &mut CommandBase,
    ctx: &mut CommandContext<'_>,
) -> Result<Vec<usize>, CommandError> {
    let phase = ctx.phase();
    let selector = match build_selector(&base.params, ctx) {
        Ok(selector) => selector,
        Err(what) => {
            base.status.failure(
                phase,
                format!("Cannot determine input time series: {}", what),
                "Correct the TSList/TSID/EnsembleID parameters",
            );
            return Err(CommandError::Fatal { what });
        }
    };
    let response = ctx
        .request(Request::ResolveSelection { selector })
        .map_err(|e| {
            base.status.failure(
                phase,
                format!("Selection could not be resolved: {}", e),
                "Verify that upstream commands produce the expected time series",
            );
            CommandError::Fatal { what: e.to_string() }
        })?;
    response
        .into_selection()
        .map_err(|e| CommandError::Fatal { what: e.to_string() })
}

/// Validation-time syntax check for a numeric parameter. Templated values
/// (containing `${`) are deferred to the run phase.
pub(crate) fn check_literal_f64(base: &mut CommandBase, name: &str) {
    if let Some(value) = base.params.get(name) {
        if value.is_empty() || value.contains("${") {
            return;
        }
        if value.parse::<f64>().is_err() {
            base.status.failure(
                hs_engine::Phase::Initialization,
                format!("Parameter '{}' is not a number: {}", name, value),
                format!("Specify a numeric value for {}", name),
            );
        }
    }
}

/// Validation-time syntax check for a boolean parameter.
pub(crate) fn check_literal_bool(base: &mut CommandBase, name: &str) {
    if let Some(value) = base.params.get(name) {
        if value.is_empty() || value.contains("${") {
            return;
        }
        if !value.eq_ignore_ascii_case("true") && !value.eq_ignore_ascii_case("false") {
            base.status.failure(
                hs_engine::Phase::Initialization,
                format!("Parameter '{}' must be True or False: {}", name, value),
                format!("Specify True or False for {}", name),
            );
        }
    }
}
