//! Sequential pipeline orchestration.

use crate::command::{validation_failed, Command, CommandError};
use crate::context::{CommandContext, EngineContext};
use crate::error::{EngineError, EngineResult};
use crate::phase::{Phase, Severity};
use crate::pool::ResultsPool;
use crate::properties::PropertyStore;
use crate::status::StatusEntry;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Options for a pipeline run.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Stop iterating after the first command-fatal failure.
    pub stop_on_first_fatal: bool,
    /// Cooperative cancellation flag checked before each command. Output
    /// already appended stays valid; iteration simply stops.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Per-command progress event, emitted once per command.
#[derive(Clone, Debug)]
pub struct ProgressEvent {
    pub command_index: usize,
    pub total: usize,
    pub fraction_complete: f64,
    pub message: String,
}

/// Report entry for one command in one run.
#[derive(Clone, Debug, Serialize)]
pub struct CommandReport {
    pub index: usize,
    pub name: String,
    pub validation_severity: Severity,
    pub phase_severity: Severity,
    pub entries: Vec<StatusEntry>,
}

/// Aggregate report for a whole pipeline run. Every FAILURE logged by any
/// command surfaces here.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub phase: Phase,
    pub commands: Vec<CommandReport>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn max_severity(&self) -> Severity {
        self.commands
            .iter()
            .map(|c| c.validation_severity.max(c.phase_severity))
            .max()
            .unwrap_or(Severity::Success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StatusEntry> {
        self.commands
            .iter()
            .flat_map(|c| c.entries.iter())
            .filter(|e| e.severity == Severity::Failure)
    }
}

/// Ordered list of commands plus the shared engine state they run against.
#[derive(Default)]
pub struct Pipeline {
    commands: Vec<Box<dyn Command>>,
    engine: EngineContext,
}

impl Pipeline {
    pub fn new(properties: PropertyStore) -> Self {
        Self {
            commands: Vec::new(),
            engine: EngineContext::new(properties),
        }
    }

    pub fn push(&mut self, command: Box<dyn Command>) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Box<dyn Command>] {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut [Box<dyn Command>] {
        &mut self.commands
    }

    /// Run-visible results pool.
    pub fn pool(&self) -> &ResultsPool {
        &self.engine.pool
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.engine.properties
    }

    pub fn run(&mut self, phase: Phase, options: &RunOptions) -> EngineResult<RunReport> {
        self.run_with_progress(phase, options, None)
    }

    /// Run every command in declaration order, streaming progress events.
    ///
    /// A discovery pass executes against a scratch pool assembled from the
    /// commands' stored discovery outputs, so repeated discovery never
    /// mutates run-visible state. A run pass appends to the shared pool.
    pub fn run_with_progress(
        &mut self,
        phase: Phase,
        options: &RunOptions,
        mut progress_cb: Option<&mut dyn FnMut(ProgressEvent)>,
    ) -> EngineResult<RunReport> {
        let Self { commands, engine } = self;

        let mut scratch;
        let engine: &mut EngineContext = match phase {
            Phase::Run => engine,
            Phase::Discovery => {
                scratch = EngineContext::new(engine.properties.clone());
                &mut scratch
            }
            Phase::Initialization => {
                return Err(EngineError::Invariant {
                    what: "pipeline phase must be Discovery or Run",
                })
            }
        };

        let total = commands.len();
        let mut reports = Vec::with_capacity(total);
        let mut cancelled = false;

        for (i, command) in commands.iter_mut().enumerate() {
            if let Some(cancel) = &options.cancel {
                if cancel.load(Ordering::Relaxed) {
                    debug!(command = i, "pipeline cancelled");
                    cancelled = true;
                    break;
                }
            }
            emit(
                &mut progress_cb,
                i,
                total,
                i as f64 / total.max(1) as f64,
                format!("Running {}", command.name()),
            );

            command.run_validation(&engine.properties);
            if validation_failed(command.as_ref()) {
                warn!(command = command.name(), "validation failed, skipping execute");
                reports.push(report_for(i, command.as_ref(), phase));
                continue;
            }

            let command_scope: PropertyStore = command.parameters().iter().collect();
            let mut ctx = CommandContext::new(engine, i, phase, command_scope);
            let mut fatal = false;
            match command.run_phase(&mut ctx) {
                Ok(()) => {}
                Err(CommandError::Warning { what }) => {
                    warn!(command = command.name(), %what, "command completed with warnings");
                }
                Err(CommandError::Fatal { what }) => {
                    warn!(command = command.name(), %what, "command produced no output");
                    fatal = true;
                }
            }

            if phase == Phase::Discovery {
                for header in command.discovery_outputs().to_vec() {
                    engine.pool.append_series(i, header);
                }
            }

            reports.push(report_for(i, command.as_ref(), phase));
            if fatal && options.stop_on_first_fatal {
                break;
            }
        }

        emit(&mut progress_cb, total, total, 1.0, "Done".to_string());

        Ok(RunReport {
            phase,
            commands: reports,
            cancelled,
        })
    }
}

fn emit(
    progress_cb: &mut Option<&mut dyn FnMut(ProgressEvent)>,
    command_index: usize,
    total: usize,
    fraction_complete: f64,
    message: String,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(ProgressEvent {
            command_index,
            total,
            fraction_complete,
            message,
        });
    }
}

fn report_for(index: usize, command: &dyn Command, phase: Phase) -> CommandReport {
    CommandReport {
        index,
        name: command.name().to_string(),
        validation_severity: command.status().phase_severity(Phase::Initialization),
        phase_severity: command.status().phase_severity(phase),
        entries: command.status().entries().to_vec(),
    }
}
