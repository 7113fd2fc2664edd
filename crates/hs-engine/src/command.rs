//! The command protocol: the unit every pipeline step implements.

use crate::context::CommandContext;
use crate::params::ParamMap;
use crate::phase::{Phase, Severity};
use crate::properties::PropertyStore;
use crate::status::StatusLog;
use hs_core::TimeSeries;
use thiserror::Error;

/// Outcome channel for `execute`.
///
/// `Warning` means some output may still have been produced and the
/// pipeline continues; `Fatal` means this command produced no output but
/// the pipeline still continues to the next command unless stop-on-first-
/// fatal is set.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command completed with warnings: {what}")]
    Warning { what: String },

    #[error("Command failed: {what}")]
    Fatal { what: String },
}

/// Shared state and boilerplate embedded by every command implementation:
/// name, ordered parameters, the status log, and discovery outputs.
#[derive(Debug, Default)]
pub struct CommandBase {
    pub name: String,
    pub params: ParamMap,
    pub status: StatusLog,
    discovery: Vec<TimeSeries>,
}

impl CommandBase {
    pub fn new(name: impl Into<String>, params: ParamMap) -> Self {
        Self {
            name: name.into(),
            params,
            status: StatusLog::new(),
            discovery: Vec::new(),
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Warn about parameter names outside the allow list.
    pub fn check_allowed_params(&mut self, allowed: &[&str]) {
        let unknown: Vec<String> = self
            .params
            .names()
            .filter(|n| !allowed.contains(n))
            .map(str::to_string)
            .collect();
        for name in unknown {
            self.status.warning(
                Phase::Initialization,
                format!("Parameter '{}' is not recognized by {}", name, self.name),
                format!("Use one of: {}", allowed.join(", ")),
            );
        }
    }

    /// Value of a required parameter, logging a FAILURE when absent or empty.
    pub fn require_param(&mut self, name: &str) -> Option<String> {
        match self.params.get(name) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                self.status.failure(
                    Phase::Initialization,
                    format!("Required parameter '{}' is missing", name),
                    format!("Specify {} for the {} command", name, self.name),
                );
                None
            }
        }
    }

    /// Replace stored discovery outputs (headers only).
    pub fn set_discovery(&mut self, headers: Vec<TimeSeries>) {
        self.discovery = headers;
    }

    pub fn discovery(&self) -> &[TimeSeries] {
        &self.discovery
    }
}

/// One pipeline step: parameter validation plus two-phase execution.
///
/// Lifecycle: constructed, `validate` any number of times (idempotent, no
/// shared-state mutation), `execute` in discovery zero or more times
/// (cheap, replaces discovery outputs), `execute` in run at most once per
/// pipeline run.
pub trait Command {
    fn base(&self) -> &CommandBase;

    fn base_mut(&mut self) -> &mut CommandBase;

    /// Validate parameters, logging into the Initialization phase.
    ///
    /// Must not resolve `${...}` tokens; literal values are syntax-checked,
    /// templated values are deferred to the run phase.
    fn validate(&mut self, properties: &PropertyStore);

    /// Execute one phase. Per-item failures are status entries plus a
    /// `continue`; the error channel is reserved for command-level outcomes.
    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandError>;

    fn name(&self) -> &str {
        &self.base().name
    }

    fn parameters(&self) -> &ParamMap {
        &self.base().params
    }

    fn status(&self) -> &StatusLog {
        &self.base().status
    }

    fn status_mut(&mut self) -> &mut StatusLog {
        &mut self.base_mut().status
    }

    fn discovery_outputs(&self) -> &[TimeSeries] {
        self.base().discovery()
    }

    /// Validation wrapper: clears stale Initialization diagnostics first so
    /// repeated validation does not accumulate.
    fn run_validation(&mut self, properties: &PropertyStore) {
        self.status_mut().clear(Phase::Initialization);
        self.validate(properties);
    }

    /// Phase execution wrapper: clears the phase log (unless the hosting
    /// environment set `CommandsShouldClearRunStatus=False`), runs the
    /// command, and asserts the final phase severity on success.
    fn run_phase(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
        let phase = ctx.phase();
        let clear = ctx
            .processor_property("CommandsShouldClearRunStatus")
            .map_or(true, |v| !v.eq_ignore_ascii_case("false"));
        if clear {
            self.status_mut().clear(phase);
        }
        let result = self.execute(ctx);
        if result.is_ok() {
            self.status_mut().refresh_phase_severity(phase);
        }
        result
    }
}

impl std::fmt::Debug for dyn Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// True if a validation pass left FAILURE diagnostics, which prevents
/// execution of this command (but not of the rest of the script).
pub fn validation_failed(command: &dyn Command) -> bool {
    command.status().phase_severity(Phase::Initialization) >= Severity::Failure
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        base: CommandBase,
    }

    impl Command for Probe {
        fn base(&self) -> &CommandBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut CommandBase {
            &mut self.base
        }

        fn validate(&mut self, _properties: &PropertyStore) {
            self.base.check_allowed_params(&["TSID"]);
            self.base.require_param("TSID");
        }

        fn execute(&mut self, _ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
            Ok(())
        }
    }

    #[test]
    fn missing_required_param_fails_validation() {
        let mut cmd = Probe {
            base: CommandBase::new("Probe", ParamMap::new()),
        };
        cmd.run_validation(&PropertyStore::new());
        assert!(validation_failed(&cmd));
    }

    #[test]
    fn unknown_param_is_a_warning_only() {
        let params: ParamMap = [("TSID", "A.Flow.Day"), ("Bogus", "1")].into_iter().collect();
        let mut cmd = Probe {
            base: CommandBase::new("Probe", params),
        };
        cmd.run_validation(&PropertyStore::new());
        assert!(!validation_failed(&cmd));
        assert_eq!(
            cmd.status().phase_severity(Phase::Initialization),
            Severity::Warning
        );
    }

    #[test]
    fn repeated_validation_does_not_accumulate() {
        let mut cmd = Probe {
            base: CommandBase::new("Probe", ParamMap::new()),
        };
        cmd.run_validation(&PropertyStore::new());
        cmd.run_validation(&PropertyStore::new());
        assert_eq!(cmd.status().entries().len(), 1);
    }
}
