use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{error, info, warn};
use std::fs;
use std::path::PathBuf;
use tokio::task::JoinHandle;

use redline::error::RedlineError;
use redline::prompt::PromptLoader;
use redline::runner::{CancelFlag, PipelineRunner, RunEvent, RunState};
use redline::stage::{CommandStage, PlaceholderStage, TransformationStage};
use redline::store::{DocumentStore, RunLog, snapshot_file_name};

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::{Backend, Config, ResolvedPaths, StageConfig};

/// Exit code used when the user interrupts twice
const INTERRUPT_EXIT_CODE: i32 = 130;

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("redline")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("redline.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("info"));
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn apply_overrides(cli: &Cli, config: &mut Config) {
    if let Some(base_dir) = &cli.base_dir {
        config.paths.base_dir = base_dir.clone();
    }
    if let Some(Commands::Run { input, output, backend }) = &cli.command {
        if let Some(input) = input {
            config.paths.input = input.clone();
        }
        if let Some(output) = output {
            config.paths.output = output.clone();
        }
        if let Some(backend) = backend {
            config.stage.backend = *backend;
        }
    }
}

fn build_stage(stage: &StageConfig) -> Result<Box<dyn TransformationStage>> {
    match stage.backend {
        Backend::Placeholder => Ok(Box::new(PlaceholderStage::new(stage.annotation.clone()))),
        Backend::Command => {
            let command = CommandStage::new(stage.command.clone()).context("Invalid stage command in config")?;
            Ok(Box::new(command))
        }
    }
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None | Some(Commands::Run { .. }) => handle_run_command(config, cli.is_verbose()).await,
        Some(Commands::Check) => handle_check_command(config),
        Some(Commands::Passes) => handle_passes_command(config),
    }
}

async fn handle_run_command(config: &Config, verbose: bool) -> Result<()> {
    let registry = config.registry()?;
    let paths = config.paths.resolve();
    let stage = build_stage(&config.stage)?;

    let mut store = DocumentStore::new(paths.store.clone());
    if config.snapshot_history {
        store = store.with_snapshot_history();
    }

    println!("{}", "redline - Text Processing Pipeline".bold());
    println!("Base directory: {}", config.paths.base_dir.display());
    println!("Input file:     {}", paths.store.input.display());
    println!("Output file:    {}", paths.store.output.display());
    println!("Backend:        {}", stage.name());

    let cancel = CancelFlag::new();
    let mut runner = PipelineRunner::new(registry, PromptLoader::new(&paths.agents_dir), store, stage)
        .with_cancel(cancel.clone())
        .on_event(move |event| print_event(event, verbose));

    let handle = tokio::task::spawn_blocking(move || {
        let result = runner.run();
        (result, runner.state())
    });

    let joined = match supervise(handle, &cancel, || async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
    {
        Supervised::Finished(joined) => joined,
        Supervised::Abandoned => {
            eprintln!("{}", "Interrupted again, exiting".red());
            std::process::exit(INTERRUPT_EXIT_CODE);
        }
    };
    let (result, state) = joined.context("Pipeline worker panicked")?;

    match result {
        Ok(log) => {
            print_summary(&log, &paths);
            Ok(())
        }
        Err(e) => {
            report_failure(&e, &paths);
            if let RunState::Aborted(reason) = state {
                error!("Run aborted: {}", reason);
            }
            Err(e).context("Processing failed")
        }
    }
}

/// How a supervised pipeline worker ended
enum Supervised<T> {
    Finished(std::result::Result<T, tokio::task::JoinError>),
    Abandoned,
}

/// Wait for the worker. The first interrupt asks it to stop before the next
/// pass; a second one gives up on it.
async fn supervise<T, F, Fut>(mut handle: JoinHandle<T>, cancel: &CancelFlag, mut interrupt: F) -> Supervised<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    tokio::select! {
        joined = &mut handle => return Supervised::Finished(joined),
        () = interrupt() => {
            println!("\n{}", "Interrupted, stopping before the next pass (Ctrl-C again to quit now)...".yellow());
            cancel.cancel();
        }
    }

    tokio::select! {
        joined = &mut handle => Supervised::Finished(joined),
        () = interrupt() => {
            warn!("Second interrupt, abandoning the running stage");
            Supervised::Abandoned
        }
    }
}

fn print_event(event: &RunEvent, verbose: bool) {
    match event {
        RunEvent::InputLoaded { chars } => {
            println!("{} Loaded input text ({} characters)", "✓".green(), chars);
        }
        RunEvent::StepStarted { step, total, pass } => {
            println!("\n{} Step {}/{}: {}", "→".cyan(), step, total, pass.bold());
        }
        RunEvent::PromptLoaded { chars, .. } => {
            if verbose {
                println!("   {} Loaded prompt ({} characters)", "✓".green(), chars);
            }
        }
        RunEvent::StepCompleted(record) => {
            println!(
                "   {} Saved {} ({} characters)",
                "✓".green(),
                record.intermediate_file.display(),
                record.text_length
            );
        }
    }
}

fn print_summary(log: &RunLog, paths: &ResolvedPaths) {
    println!("\n{} Final output saved: {}", "✓".green(), log.output_file.display());
    println!("{} Run log saved: {}", "✓".green(), paths.store.run_log.display());
    println!(
        "\n{} Processed through {} passes.",
        "Done.".green().bold(),
        log.total_steps
    );
    if let Some(last) = log.processing_steps.last() {
        println!("Final text length: {} characters", last.text_length);
    }
    println!("Intermediate files: {}", paths.store.intermediate_dir.display());
}

fn report_failure(e: &RedlineError, paths: &ResolvedPaths) {
    match e {
        RedlineError::PrerequisiteMissing(ids) => {
            eprintln!("{} Missing prompt files:", "✗".red());
            for id in ids {
                eprintln!("   - {}", paths.agents_dir.join(format!("{}.md", id)).display());
            }
        }
        RedlineError::InputMissing(path) => {
            eprintln!("{} Input file not found: {}", "✗".red(), path.display());
            eprintln!("   Create it with the text to process and run again.");
        }
        other => {
            eprintln!("{} {}", "✗".red(), other);
            eprintln!("   Snapshots from completed passes were kept for review.");
        }
    }
}

fn handle_check_command(config: &Config) -> Result<()> {
    let registry = config.registry()?;
    let paths = config.paths.resolve();
    let prompts = PromptLoader::new(&paths.agents_dir);

    println!("Prompts in {}:", paths.agents_dir.display());
    for pass in registry.iter() {
        let mark = if prompts.exists(&pass.id) { "✓".green() } else { "✗".red() };
        println!("  {} {}", mark, prompts.prompt_path(&pass.id).display());
    }

    let input_ok = paths.store.input.is_file();
    let mark = if input_ok { "✓".green() } else { "✗".red() };
    println!("Input:\n  {} {}", mark, paths.store.input.display());

    let missing = registry.missing(|id| prompts.exists(id));
    if !missing.is_empty() {
        return Err(RedlineError::PrerequisiteMissing(missing).into());
    }
    if !input_ok {
        return Err(RedlineError::InputMissing(paths.store.input).into());
    }

    println!("{}", "Ready to run.".green());
    Ok(())
}

fn handle_passes_command(config: &Config) -> Result<()> {
    let registry = config.registry()?;
    let paths = config.paths.resolve();
    let prompts = PromptLoader::new(&paths.agents_dir);

    for (index, pass) in registry.iter().enumerate() {
        let step = index + 1;
        let mark = if prompts.exists(&pass.id) { "✓".green() } else { "✗".red() };
        println!(
            "{:>2}. {} {:<26} {:<26} -> {}",
            step,
            mark,
            pass.name,
            pass.id,
            snapshot_file_name(step, &pass.name)
        );
    }

    match prompts.list_available() {
        Ok(available) => {
            let unused: Vec<_> = available.iter().filter(|id| registry.get(id).is_none()).collect();
            if !unused.is_empty() {
                println!("\nPrompt files not used by any pass:");
                for id in unused {
                    println!("  - {}", id);
                }
            }
        }
        Err(e) => warn!("Could not list prompt files: {}", e),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging once the configured level is known
    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);
    apply_overrides(&cli, &mut config);

    // Run the main application logic
    if let Err(e) = run_application(&cli, &config).await {
        error!("Application failed: {:#}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
