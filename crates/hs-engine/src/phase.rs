//! Execution phases and diagnostic severities.

use core::fmt;
use serde::Serialize;

/// Phase of command processing.
///
/// `Initialization` holds validation diagnostics; `Discovery` and `Run` are
/// the two execution passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Initialization,
    Discovery,
    Run,
}

impl Phase {
    pub(crate) const COUNT: usize = 3;

    pub(crate) fn index(self) -> usize {
        match self {
            Phase::Initialization => 0,
            Phase::Discovery => 1,
            Phase::Run => 2,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Initialization => write!(f, "INITIALIZATION"),
            Phase::Discovery => write!(f, "DISCOVERY"),
            Phase::Run => write!(f, "RUN"),
        }
    }
}

/// Diagnostic severity, totally ordered.
///
/// `Unknown` is the state of a phase that has never executed; a phase with
/// no entries reports `Success` only after an explicit severity refresh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    #[default]
    Unknown,
    Success,
    Warning,
    Failure,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Unknown => write!(f, "UNKNOWN"),
            Severity::Success => write!(f, "SUCCESS"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Failure => write!(f, "FAILURE"),
        }
    }
}
