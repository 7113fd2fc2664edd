//! Command factory: name-to-constructor dispatch for parsed scripts.

use crate::{
    AnalyzePattern, Copy, CreateEnsemble, FillConstant, LagK, NewTable, NewTimeSeries, Scale,
};
use hs_engine::{Command, ParamMap};
use thiserror::Error;

pub type FactoryResult<T> = Result<T, FactoryError>;

#[derive(Error, Debug, PartialEq)]
pub enum FactoryError {
    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },
}

/// Every command name the factory recognizes, in canonical spelling.
pub const COMMAND_NAMES: &[&str] = &[
    "NewTimeSeries",
    "Copy",
    "Scale",
    "FillConstant",
    "LagK",
    "NewTable",
    "CreateEnsemble",
    "AnalyzePattern",
];

/// Build a command from its script name, case-insensitively.
pub fn instantiate(name: &str, params: ParamMap) -> FactoryResult<Box<dyn Command>> {
    let command = match name.to_ascii_lowercase().as_str() {
        "newtimeseries" => NewTimeSeries::boxed(params),
        "copy" => Copy::boxed(params),
        "scale" => Scale::boxed(params),
        "fillconstant" => FillConstant::boxed(params),
        "lagk" => LagK::boxed(params),
        "newtable" => NewTable::boxed(params),
        "createensemble" => CreateEnsemble::boxed(params),
        "analyzepattern" => AnalyzePattern::boxed(params),
        _ => {
            return Err(FactoryError::UnknownCommand {
                name: name.to_string(),
            })
        }
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        for name in COMMAND_NAMES {
            let lower = instantiate(&name.to_ascii_lowercase(), ParamMap::new()).unwrap();
            assert_eq!(lower.name(), *name);
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        let err = instantiate("ReadStateMod", ParamMap::new()).unwrap_err();
        assert_eq!(
            err,
            FactoryError::UnknownCommand {
                name: "ReadStateMod".to_string()
            }
        );
    }
}
