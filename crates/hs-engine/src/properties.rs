//! Scoped key/value property store with `${Name}` substitution.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PropertyError {
    #[error("Property token has no binding in any active scope: ${{{token}}}")]
    Unresolved { token: String },

    #[error("Unterminated property token in: {raw}")]
    Unterminated { raw: String },
}

/// Flat string map holding one property scope.
#[derive(Clone, Debug, Default)]
pub struct PropertyStore {
    values: HashMap<String, String>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (k, v) in iter {
            store.set(k, v);
        }
        store
    }
}

/// Lookup chain over property scopes.
///
/// `${Name}` resolves command-local then processor (command shadows
/// processor); `${ts:Name}` resolves only against the per-series scope.
#[derive(Clone, Copy, Debug)]
pub struct ScopeChain<'a> {
    processor: &'a PropertyStore,
    command: Option<&'a PropertyStore>,
    ts: Option<&'a PropertyStore>,
}

impl<'a> ScopeChain<'a> {
    pub fn new(processor: &'a PropertyStore) -> Self {
        Self {
            processor,
            command: None,
            ts: None,
        }
    }

    pub fn with_command(mut self, command: &'a PropertyStore) -> Self {
        self.command = Some(command);
        self
    }

    pub fn with_ts(mut self, ts: &'a PropertyStore) -> Self {
        self.ts = Some(ts);
        self
    }

    fn lookup(&self, name: &str) -> Option<&'a str> {
        if let Some(command) = self.command {
            if let Some(v) = command.get(name) {
                return Some(v);
            }
        }
        self.processor.get(name)
    }

    fn lookup_ts(&self, name: &str) -> Option<&'a str> {
        self.ts.and_then(|scope| scope.get(name))
    }

    /// Substitute every `${token}` in `raw` in a single left-to-right pass.
    ///
    /// Substituted values are not re-scanned. An unbound token or an
    /// unterminated `${` is an error, never an empty-string substitution.
    pub fn resolve(&self, raw: &str) -> Result<String, PropertyError> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or_else(|| PropertyError::Unterminated {
                raw: raw.to_string(),
            })?;
            let token = &after[..end];
            let value = if let Some(name) = token.strip_prefix("ts:") {
                self.lookup_ts(name)
            } else {
                self.lookup(token)
            };
            match value {
                Some(v) => out.push_str(v),
                None => {
                    return Err(PropertyError::Unresolved {
                        token: token.to_string(),
                    })
                }
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// True if the text still contains an unsubstituted `${...}` token.
pub fn contains_token(text: &str) -> bool {
    text.contains("${")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> PropertyStore {
        let mut store = PropertyStore::new();
        store.set("OutputStart", "2020-01-01");
        store.set("WorkingDir", "/data");
        store
    }

    #[test]
    fn resolves_processor_property() {
        let props = processor();
        let chain = ScopeChain::new(&props);
        assert_eq!(chain.resolve("${OutputStart}").unwrap(), "2020-01-01");
        assert_eq!(
            chain.resolve("start=${OutputStart},dir=${WorkingDir}").unwrap(),
            "start=2020-01-01,dir=/data"
        );
    }

    #[test]
    fn command_scope_shadows_processor() {
        let props = processor();
        let mut cmd = PropertyStore::new();
        cmd.set("OutputStart", "1999-12-31");
        let chain = ScopeChain::new(&props).with_command(&cmd);
        assert_eq!(chain.resolve("${OutputStart}").unwrap(), "1999-12-31");
        // Non-shadowed names fall through to the processor scope.
        assert_eq!(chain.resolve("${WorkingDir}").unwrap(), "/data");
    }

    #[test]
    fn ts_prefix_resolves_only_ts_scope() {
        let props = processor();
        let mut ts = PropertyStore::new();
        ts.set("alias", "routed");
        let chain = ScopeChain::new(&props).with_ts(&ts);
        assert_eq!(chain.resolve("${ts:alias}").unwrap(), "routed");
        assert_eq!(
            chain.resolve("${ts:OutputStart}"),
            Err(PropertyError::Unresolved {
                token: "ts:OutputStart".to_string()
            })
        );
    }

    #[test]
    fn unbound_token_is_an_error_not_empty() {
        let props = processor();
        let chain = ScopeChain::new(&props);
        assert_eq!(
            chain.resolve("${Missing}"),
            Err(PropertyError::Unresolved {
                token: "Missing".to_string()
            })
        );
    }

    #[test]
    fn unterminated_token_is_an_error() {
        let props = processor();
        let chain = ScopeChain::new(&props);
        assert!(matches!(
            chain.resolve("${OutputStart"),
            Err(PropertyError::Unterminated { .. })
        ));
    }

    #[test]
    fn substitution_is_single_pass() {
        let mut props = processor();
        props.set("A", "${B}");
        props.set("B", "never");
        let chain = ScopeChain::new(&props);
        // The substituted value is emitted verbatim, not re-scanned.
        assert_eq!(chain.resolve("${A}").unwrap(), "${B}");
    }

    #[test]
    fn text_without_tokens_passes_through() {
        let props = processor();
        let chain = ScopeChain::new(&props);
        assert_eq!(chain.resolve("plain text").unwrap(), "plain text");
    }

    proptest::proptest! {
        #[test]
        fn token_free_text_is_identity(text in "[A-Za-z0-9 ,.%(){}=_-]*") {
            proptest::prop_assume!(!text.contains("${"));
            let props = processor();
            let chain = ScopeChain::new(&props);
            proptest::prop_assert_eq!(chain.resolve(&text).unwrap(), text);
        }
    }
}
