//! Alias/identifier templating for command outputs.
//!
//! Expansion happens in two distinct passes: property substitution via the
//! scope chain, then percent-format substitution from the output series'
//! own identifier fields. `${Property}%L` is therefore valid.

use crate::properties::{PropertyError, PropertyStore, ScopeChain};
use hs_core::{TimeSeries, TsIdent};

/// Expand an alias template for an output series identifier.
///
/// Percent specifiers: `%L` location, `%T` data type, `%I` interval,
/// `%S` scenario (empty when unset), `%%` literal percent. Unknown
/// specifiers pass through unchanged.
pub fn expand_alias(
    template: &str,
    chain: &ScopeChain<'_>,
    ident: &TsIdent,
) -> Result<String, PropertyError> {
    let resolved = chain.resolve(template)?;
    Ok(expand_percent(&resolved, ident))
}

/// The percent-format pass alone, used where the property pass does not
/// apply (discovery).
pub fn expand_percent(text: &str, ident: &TsIdent) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('L') => out.push_str(&ident.location),
            Some('T') => out.push_str(&ident.data_type),
            Some('I') => out.push_str(&ident.interval.to_string()),
            Some('S') => out.push_str(ident.scenario.as_deref().unwrap_or("")),
            Some('%') => out.push('%'),
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    out
}

/// Per-series property scope used by `${ts:Name}` tokens.
pub fn ts_scope(series: &TimeSeries) -> PropertyStore {
    let mut scope = PropertyStore::new();
    scope.set("tsid", series.ident.to_string());
    scope.set("alias", series.alias.clone().unwrap_or_default());
    scope.set("units", series.units.clone());
    scope.set("description", series.description.clone());
    scope
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_core::Interval;

    fn ident() -> TsIdent {
        TsIdent::new("B", "Flow", Interval::Day).with_scenario("Hist")
    }

    #[test]
    fn percent_specifiers() {
        let props = PropertyStore::new();
        let chain = ScopeChain::new(&props);
        assert_eq!(expand_alias("copy_%L", &chain, &ident()).unwrap(), "copy_B");
        assert_eq!(
            expand_alias("%L.%T.%I.%S", &chain, &ident()).unwrap(),
            "B.Flow.Day.Hist"
        );
        assert_eq!(expand_alias("100%%", &chain, &ident()).unwrap(), "100%");
    }

    #[test]
    fn property_pass_runs_before_percent_pass() {
        let mut props = PropertyStore::new();
        props.set("Prefix", "filled");
        let chain = ScopeChain::new(&props);
        assert_eq!(
            expand_alias("${Prefix}_%L", &chain, &ident()).unwrap(),
            "filled_B"
        );
    }

    #[test]
    fn unknown_specifier_passes_through() {
        let props = PropertyStore::new();
        let chain = ScopeChain::new(&props);
        assert_eq!(expand_alias("%Q%", &chain, &ident()).unwrap(), "%Q%");
    }

    #[test]
    fn missing_scenario_is_empty() {
        let props = PropertyStore::new();
        let chain = ScopeChain::new(&props);
        let id = TsIdent::new("A", "Stage", Interval::Month);
        assert_eq!(expand_alias("x%Sy", &chain, &id).unwrap(), "xy");
    }
}
