//! Integration tests for the pipeline engine, using small probe commands.

use hs_core::{TimeSeries, TsIdent};
use hs_engine::{
    Command, CommandBase, CommandContext, CommandError, ListMode, ParamMap, Phase, Pipeline,
    PropertyStore, Request, RunOptions, Severity, TsSelector,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Produces one series with a fixed identifier and values.
struct Produce {
    base: CommandBase,
    tsid: &'static str,
    values: Vec<f64>,
}

impl Produce {
    fn boxed(tsid: &'static str, values: Vec<f64>) -> Box<dyn Command> {
        Box::new(Self {
            base: CommandBase::new("Produce", ParamMap::new()),
            tsid,
            values,
        })
    }
}

impl Command for Produce {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn validate(&mut self, _properties: &PropertyStore) {}

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
        let ident = TsIdent::parse(self.tsid).expect("test tsid");
        if ctx.phase() == Phase::Discovery {
            self.base.set_discovery(vec![TimeSeries::header(ident)]);
            return Ok(());
        }
        let mut ts = TimeSeries::header(ident);
        ts.values = self.values.clone();
        ctx.append_series(ts);
        Ok(())
    }
}

/// Records which pool positions were visible when this command ran.
struct Observe {
    base: CommandBase,
    seen: Vec<usize>,
}

impl Observe {
    fn new() -> Self {
        Self {
            base: CommandBase::new("Observe", ParamMap::new()),
            seen: Vec::new(),
        }
    }
}

impl Command for Observe {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn validate(&mut self, _properties: &PropertyStore) {}

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
        let indices = ctx
            .request(Request::ResolveSelection {
                selector: TsSelector::all(),
            })
            .map_err(|e| CommandError::Fatal { what: e.to_string() })?
            .into_selection()
            .map_err(|e| CommandError::Fatal { what: e.to_string() })?;
        self.seen = indices;
        Ok(())
    }
}

/// Doubles every value of the series at a fixed pool position.
struct DoubleAt {
    base: CommandBase,
    index: usize,
}

impl Command for DoubleAt {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn validate(&mut self, _properties: &PropertyStore) {}

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
        if ctx.phase() == Phase::Discovery {
            return Ok(());
        }
        let series = ctx
            .series_mut(self.index)
            .map_err(|e| CommandError::Fatal { what: e.to_string() })?;
        for v in &mut series.values {
            *v *= 2.0;
        }
        Ok(())
    }
}

/// Always fails fatally.
struct AlwaysFatal {
    base: CommandBase,
}

impl Command for AlwaysFatal {
    fn base(&self) -> &CommandBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut CommandBase {
        &mut self.base
    }

    fn validate(&mut self, _properties: &PropertyStore) {}

    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
        self.base.status.failure(
            ctx.phase(),
            "required input could not be obtained",
            "Check upstream commands",
        );
        Err(CommandError::Fatal {
            what: "no input".to_string(),
        })
    }
}

#[test]
fn forward_only_visibility() {
    let mut pipeline = Pipeline::new(PropertyStore::new());
    pipeline.push(Produce::boxed("A.Flow.Day", vec![1.0]));
    pipeline.push(Box::new(Observe::new()));
    pipeline.push(Produce::boxed("B.Flow.Day", vec![2.0]));

    pipeline.run(Phase::Run, &RunOptions::default()).unwrap();

    // The observer at position 1 must only have seen the series produced at
    // position 0, never the one produced at position 2.
    assert_eq!(pipeline.pool().series_count(), 2);
    let view = pipeline.pool().view(2);
    let selector = TsSelector::all();
    let sel = selector.resolve(&view).unwrap();
    assert_eq!(sel.indices, vec![0]);
}

#[test]
fn discovery_is_idempotent_and_does_not_touch_run_pool() {
    let mut pipeline = Pipeline::new(PropertyStore::new());
    pipeline.push(Produce::boxed("A.Flow.Day", vec![1.0]));
    pipeline.push(Produce::boxed("B.Flow.Day", vec![2.0]));

    let first = pipeline.run(Phase::Discovery, &RunOptions::default()).unwrap();
    let second = pipeline.run(Phase::Discovery, &RunOptions::default()).unwrap();

    // Discovery never populates the run-visible pool.
    assert_eq!(pipeline.pool().series_count(), 0);

    // Repeated discovery yields identical outputs and log content.
    assert_eq!(first.commands.len(), second.commands.len());
    for (a, b) in first.commands.iter().zip(second.commands.iter()) {
        assert_eq!(a.entries.len(), b.entries.len());
        assert_eq!(a.phase_severity, b.phase_severity);
    }
    for command in pipeline.commands() {
        assert_eq!(command.discovery_outputs().len(), 1);
        assert!(command.discovery_outputs()[0].is_header_only());
    }
}

#[test]
fn discovery_outputs_are_visible_to_later_commands() {
    let mut pipeline = Pipeline::new(PropertyStore::new());
    pipeline.push(Produce::boxed("A.Flow.Day", vec![1.0]));
    pipeline.push(Box::new(Observe::new()));

    pipeline.run(Phase::Discovery, &RunOptions::default()).unwrap();

    // The observer's selection in discovery resolved against the scratch
    // pool holding the first command's discovery header.
    let report = pipeline.run(Phase::Discovery, &RunOptions::default()).unwrap();
    assert_eq!(report.commands[1].phase_severity, Severity::Success);
}

#[test]
fn in_place_mutation_by_index() {
    let mut pipeline = Pipeline::new(PropertyStore::new());
    pipeline.push(Produce::boxed("A.Flow.Day", vec![1.0, 2.0]));
    pipeline.push(Produce::boxed("B.Flow.Day", vec![10.0]));
    pipeline.push(Box::new(DoubleAt {
        base: CommandBase::new("DoubleAt", ParamMap::new()),
        index: 0,
    }));

    pipeline.run(Phase::Run, &RunOptions::default()).unwrap();

    // The mutated index shows the mutation; the other index does not.
    assert_eq!(pipeline.pool().series(0).unwrap().values, vec![2.0, 4.0]);
    assert_eq!(pipeline.pool().series(1).unwrap().values, vec![10.0]);
}

#[test]
fn mutating_an_invisible_index_is_refused() {
    let mut pipeline = Pipeline::new(PropertyStore::new());
    // DoubleAt at position 0 targets index 0, which is produced later.
    pipeline.push(Box::new(DoubleAt {
        base: CommandBase::new("DoubleAt", ParamMap::new()),
        index: 0,
    }));
    pipeline.push(Produce::boxed("A.Flow.Day", vec![1.0]));

    let report = pipeline.run(Phase::Run, &RunOptions::default()).unwrap();
    assert_eq!(report.commands[0].phase_severity, Severity::Unknown);
    assert_eq!(pipeline.pool().series(0).unwrap().values, vec![1.0]);
}

#[test]
fn fatal_command_does_not_stop_the_pipeline_by_default() {
    let mut pipeline = Pipeline::new(PropertyStore::new());
    pipeline.push(Box::new(AlwaysFatal {
        base: CommandBase::new("AlwaysFatal", ParamMap::new()),
    }));
    pipeline.push(Produce::boxed("A.Flow.Day", vec![1.0]));

    let report = pipeline.run(Phase::Run, &RunOptions::default()).unwrap();

    assert_eq!(report.commands.len(), 2);
    assert_eq!(report.commands[0].phase_severity, Severity::Failure);
    assert_eq!(report.max_severity(), Severity::Failure);
    assert_eq!(report.failures().count(), 1);
    // The second command still ran.
    assert_eq!(pipeline.pool().series_count(), 1);
}

#[test]
fn stop_on_first_fatal() {
    let mut pipeline = Pipeline::new(PropertyStore::new());
    pipeline.push(Box::new(AlwaysFatal {
        base: CommandBase::new("AlwaysFatal", ParamMap::new()),
    }));
    pipeline.push(Produce::boxed("A.Flow.Day", vec![1.0]));

    let options = RunOptions {
        stop_on_first_fatal: true,
        ..RunOptions::default()
    };
    let report = pipeline.run(Phase::Run, &options).unwrap();

    assert_eq!(report.commands.len(), 1);
    assert_eq!(pipeline.pool().series_count(), 0);
}

#[test]
fn cancellation_stops_iteration_but_keeps_appended_output() {
    let cancel = Arc::new(AtomicBool::new(false));
    let mut pipeline = Pipeline::new(PropertyStore::new());
    pipeline.push(Produce::boxed("A.Flow.Day", vec![1.0]));
    pipeline.push(Produce::boxed("B.Flow.Day", vec![2.0]));

    let options = RunOptions {
        cancel: Some(Arc::clone(&cancel)),
        ..RunOptions::default()
    };
    let flag = Arc::clone(&cancel);
    let mut progress = move |event: hs_engine::ProgressEvent| {
        if event.command_index == 1 {
            flag.store(true, Ordering::Relaxed);
        }
    };
    let report = pipeline
        .run_with_progress(Phase::Run, &options, Some(&mut progress))
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.commands.len(), 1);
    assert_eq!(pipeline.pool().series_count(), 1);
    assert_eq!(pipeline.pool().series(0).unwrap().values, vec![1.0]);
}

#[test]
fn progress_events_cover_every_command() {
    let mut pipeline = Pipeline::new(PropertyStore::new());
    pipeline.push(Produce::boxed("A.Flow.Day", vec![1.0]));
    pipeline.push(Produce::boxed("B.Flow.Day", vec![2.0]));

    let mut events = Vec::new();
    let mut progress = |event: hs_engine::ProgressEvent| events.push(event);
    pipeline
        .run_with_progress(Phase::Run, &RunOptions::default(), Some(&mut progress))
        .unwrap();

    assert_eq!(events.len(), 3); // one per command plus the final event
    assert_eq!(events[0].command_index, 0);
    assert_eq!(events[2].fraction_complete, 1.0);
    assert_eq!(events[2].message, "Done");
}

#[test]
fn selector_narrowing_against_run_pool() {
    let mut pipeline = Pipeline::new(PropertyStore::new());
    pipeline.push(Produce::boxed("A.Flow.Day", vec![1.0]));
    pipeline.push(Produce::boxed("A.Stage.Day", vec![2.0]));
    pipeline.push(Produce::boxed("B.Flow.Day", vec![3.0]));
    pipeline.run(Phase::Run, &RunOptions::default()).unwrap();

    let view = pipeline.pool().view(3);
    let last = TsSelector::matching(ListMode::LastMatching, "A.*")
        .resolve(&view)
        .unwrap();
    assert_eq!(last.indices, vec![1]);
    assert_eq!(last.series[0].ident.to_string(), "A.Stage.Day");
}
