use clap::{Parser, Subcommand};
use hs_commands::instantiate;
use hs_engine::{
    validation_failed, ParamMap, Phase, Pipeline, ProgressEvent, PropertyStore, RunOptions,
    RunReport, Severity,
};
use hs_script::parse_script;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Script error: {0}")]
    Script(#[from] hs_script::ScriptError),

    #[error("Unknown command: {0}")]
    Factory(#[from] hs_commands::FactoryError),

    #[error("Engine error: {0}")]
    Engine(#[from] hs_engine::EngineError),

    #[error("Properties file error: {0}")]
    Properties(#[from] serde_yaml::Error),

    #[error("Report serialization error: {0}")]
    Report(#[from] serde_json::Error),
}

#[derive(Parser)]
#[command(name = "hs-cli")]
#[command(about = "Hydroscript CLI - Time series command pipeline runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a command script without running it
    Validate {
        /// Path to the command script
        script_path: PathBuf,
    },
    /// Run the discovery pass and list discovered time series
    Discover {
        /// Path to the command script
        script_path: PathBuf,
    },
    /// Run a command script
    Run {
        /// Path to the command script
        script_path: PathBuf,
        /// YAML file of processor properties (a flat string map)
        #[arg(long)]
        properties: Option<PathBuf>,
        /// Stop at the first command that produces no output
        #[arg(long)]
        stop_on_fatal: bool,
        /// Write the full run report as JSON
        #[arg(long)]
        report_json: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Validate { script_path } => cmd_validate(&script_path),
        Commands::Discover { script_path } => cmd_discover(&script_path),
        Commands::Run {
            script_path,
            properties,
            stop_on_fatal,
            report_json,
        } => cmd_run(
            &script_path,
            properties.as_deref(),
            stop_on_fatal,
            report_json.as_deref(),
        ),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_pipeline(script_path: &Path, properties: PropertyStore) -> AppResult<Pipeline> {
    let text = std::fs::read_to_string(script_path)?;
    let mut pipeline = Pipeline::new(properties);
    for cmd in parse_script(&text)? {
        let params: ParamMap = cmd.params.iter().cloned().collect();
        pipeline.push(instantiate(&cmd.name, params)?);
    }
    Ok(pipeline)
}

fn load_properties(path: Option<&Path>) -> AppResult<PropertyStore> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let map: HashMap<String, String> = serde_yaml::from_str(&text)?;
            Ok(map.into_iter().collect())
        }
        None => Ok(PropertyStore::new()),
    }
}

fn cmd_validate(script_path: &Path) -> AppResult<ExitCode> {
    let mut pipeline = load_pipeline(script_path, PropertyStore::new())?;
    println!("Validating {} commands", pipeline.len());

    let properties = PropertyStore::new();
    let mut failed = 0usize;
    for command in pipeline.commands_mut() {
        command.run_validation(&properties);
        for entry in command.status().entries_for(Phase::Initialization) {
            println!(
                "  [{:?}] {}: {} ({})",
                entry.severity,
                command.name(),
                entry.message,
                entry.action
            );
        }
        if validation_failed(command.as_ref()) {
            failed += 1;
        }
    }

    if failed == 0 {
        println!("✓ Script is valid");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("✗ {} commands failed validation", failed);
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_discover(script_path: &Path) -> AppResult<ExitCode> {
    let mut pipeline = load_pipeline(script_path, PropertyStore::new())?;
    let report = pipeline.run(Phase::Discovery, &RunOptions::default())?;

    let mut any = false;
    for command in pipeline.commands() {
        for header in command.discovery_outputs() {
            any = true;
            match &header.alias {
                Some(alias) => println!("  {}  (alias {})", header.ident, alias),
                None => println!("  {}", header.ident),
            }
        }
    }
    if !any {
        println!("No time series discovered");
    }

    print_summary(&report);
    Ok(exit_for(&report))
}

fn cmd_run(
    script_path: &Path,
    properties: Option<&Path>,
    stop_on_fatal: bool,
    report_json: Option<&Path>,
) -> AppResult<ExitCode> {
    let properties = load_properties(properties)?;
    let mut pipeline = load_pipeline(script_path, properties)?;
    let options = RunOptions {
        stop_on_first_fatal: stop_on_fatal,
        cancel: None,
    };

    // Discovery first, so run-phase selections have headers to validate
    // against; then the real run.
    pipeline.run(Phase::Discovery, &options)?;
    let report = pipeline.run_with_progress(
        Phase::Run,
        &options,
        Some(&mut |event: ProgressEvent| {
            tracing::info!(
                command = event.command_index,
                total = event.total,
                "{}",
                event.message
            );
        }),
    )?;

    println!(
        "Processed {} commands, {} time series in the pool",
        report.commands.len(),
        pipeline.pool().series_count()
    );
    for entry in report.failures() {
        println!("  FAILURE: {} ({})", entry.message, entry.action);
    }
    print_summary(&report);

    if let Some(path) = report_json {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        println!("Report written to {}", path.display());
    }
    Ok(exit_for(&report))
}

fn print_summary(report: &RunReport) {
    let severity = report.max_severity();
    if report.cancelled {
        println!("Run cancelled");
    }
    match severity {
        Severity::Failure => println!("✗ Completed with failures"),
        Severity::Warning => println!("✓ Completed with warnings"),
        _ => println!("✓ Completed"),
    }
}

fn exit_for(report: &RunReport) -> ExitCode {
    if report.max_severity() >= Severity::Failure {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
