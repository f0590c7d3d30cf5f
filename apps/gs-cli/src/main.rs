use clap::{Parser, Subcommand};
use gs_app::{
    AppError, AppResult, RunOptions, RunProgressEvent, RunStage, run_parallel, run_scenario,
    validate_scenario,
};
use gs_models::ModelFactory;
use gs_results::RunRecord;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gs-cli")]
#[command(about = "gridsim CLI - co-simulation of power system components", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print run records as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scenario file without running it
    Validate {
        /// Path to the scenario YAML file
        config: PathBuf,
    },
    /// Run a single scenario
    Run {
        /// Path to the scenario YAML file
        config: PathBuf,
        /// Output CSV file (defaults to <config stem>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Expand list parameters into variants and run them in parallel
    RunParallel {
        /// Path to the scenario YAML file
        config: PathBuf,
        /// Output CSV base path; variant N writes <stem>_N.<ext>
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Worker threads (defaults to the scenario's batch.workers, then CPU count)
        #[arg(long)]
        workers: Option<usize>,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let factory = ModelFactory::with_builtins();

    match cli.command {
        Commands::Validate { config } => cmd_validate(&config, &factory),
        Commands::Run { config, output } => cmd_run(&config, output, &factory, cli.json),
        Commands::RunParallel {
            config,
            output,
            workers,
        } => cmd_run_parallel(&config, output, workers, &factory, cli.json),
    }
}

fn default_output(config: &Path) -> PathBuf {
    let stem = config
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results".to_string());
    PathBuf::from(format!("{stem}.csv"))
}

fn cmd_validate(config: &Path, factory: &ModelFactory) -> AppResult<()> {
    println!("Validating scenario: {}", config.display());
    let summary = validate_scenario(config, factory)?;
    println!(
        "  {} - {} models, {} connections, {} async requests, {} monitored, {} ticks",
        summary.name,
        summary.models,
        summary.edges,
        summary.async_requests,
        summary.monitored,
        summary.ticks
    );
    if summary.variants > 1 {
        println!("  expands to {} variants", summary.variants);
    }
    println!("✓ Scenario is valid");
    Ok(())
}

fn cmd_run(
    config: &Path,
    output: Option<PathBuf>,
    factory: &ModelFactory,
    json: bool,
) -> AppResult<()> {
    let options = RunOptions {
        output: Some(output.unwrap_or_else(|| default_output(config))),
        workers: None,
    };
    if !json {
        println!("Running scenario: {}", config.display());
    }
    let mut render = render_cli_progress;
    let progress: Option<&mut dyn FnMut(RunProgressEvent)> =
        if json { None } else { Some(&mut render) };
    let record = run_scenario(config, factory, &options, progress)?;
    if !json {
        clear_progress_line();
    }

    print_record(&record, json)?;
    if !json {
        println!("✓ Simulation completed");
    }
    Ok(())
}

fn cmd_run_parallel(
    config: &Path,
    output: Option<PathBuf>,
    workers: Option<usize>,
    factory: &ModelFactory,
    json: bool,
) -> AppResult<()> {
    let options = RunOptions {
        output: Some(output.unwrap_or_else(|| default_output(config))),
        workers,
    };
    if !json {
        println!("Running scenario variants: {}", config.display());
    }
    let mut render = render_cli_progress;
    let progress: Option<&mut dyn FnMut(RunProgressEvent)> =
        if json { None } else { Some(&mut render) };
    let result = run_parallel(config, factory, &options, progress);
    if !json {
        clear_progress_line();
    }

    let records = result?;
    for record in &records {
        print_record(record, json)?;
    }
    if !json {
        println!("✓ {} variants completed", records.len());
    }
    Ok(())
}

fn print_record(record: &RunRecord, json: bool) -> AppResult<()> {
    if json {
        let line = record
            .to_json()
            .map_err(|e| AppError::Results(e.to_string()))?;
        println!("{line}");
        return Ok(());
    }

    let label = match record.variant {
        Some(id) => format!("variant {id}"),
        None => record.scenario.clone(),
    };
    print!("  {label}: {} ticks, {} steps", record.ticks, record.steps);
    if let Some(path) = &record.output {
        print!(" -> {}", path.display());
    }
    println!();
    for (field, value) in &record.assignments {
        println!("      {field} = {value}");
    }
    Ok(())
}

fn render_cli_progress(event: RunProgressEvent) {
    let stage = match event.stage {
        RunStage::LoadingScenario => "Loading scenario",
        RunStage::Simulating => "Simulating",
        RunStage::ExpandingVariants => "Expanding variants",
        RunStage::RunningBatch => "Running batch",
        RunStage::Completed => "Completed",
    };
    let mut line = format!("[{:>6.2}s] {stage}", event.elapsed_wall_s);
    if let Some(message) = &event.message {
        line.push_str(&format!(" ({message})"));
    }
    print!("\r{line:<72}");
    let _ = io::stdout().flush();
}

fn clear_progress_line() {
    print!("\r{:<72}\r", "");
    let _ = io::stdout().flush();
}
