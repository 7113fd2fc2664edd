//! hs-script: the command script text form.
//!
//! A script is one command per line, `Name(Param1=Value1,Param2="Value 2")`,
//! with `#` comments. A legacy positional syntax for a subset of commands is
//! translated into the canonical named-parameter form once at load time and
//! never re-emitted.

pub mod format;
pub mod parse;

pub use format::format_command;
pub use parse::{parse_command, parse_script};

use thiserror::Error;

pub type ScriptResult<T> = Result<T, ScriptError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Line {line}: expected Name(Param=Value,...), found: {text}")]
    Malformed { line: usize, text: String },

    #[error("Line {line}: unterminated quoted value")]
    UnterminatedQuote { line: usize },

    #[error("Line {line}: unterminated parameter list")]
    UnterminatedParen { line: usize },

    #[error("Line {line}: command '{name}' has no legacy positional form")]
    UnknownLegacyForm { line: usize, name: String },

    #[error("Line {line}: too many positional values for '{name}' (max {max})")]
    TooManyPositional { line: usize, name: String, max: usize },
}

/// One parsed command: a name and ordered named parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptCommand {
    pub name: String,
    pub params: Vec<(String, String)>,
}

impl ScriptCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Positional parameter names for commands that kept a legacy script form.
/// Lookup is by lowercased legacy name; returns the canonical command name
/// and the positional parameter order.
pub(crate) fn legacy_positional(name: &str) -> Option<(&'static str, &'static [&'static str])> {
    match name.to_ascii_lowercase().as_str() {
        "scale" => Some(("Scale", &["TSID", "ScaleValue"])),
        "fillconstant" => Some(("FillConstant", &["TSID", "ConstantValue"])),
        "lagk" => Some(("LagK", &["TSID", "Lag", "K"])),
        _ => None,
    }
}
