// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stream Companion overlay runner.
//!
//! A headless front end for the behavior sequencer:
//! - `run` replays newline-delimited overlay messages and prints final status
//! - `lint` checks a behavior array the way the admin write path does
//! - `grid` computes card grid positions
//! - `init` writes a default settings file
//!
//! ## Architecture
//!
//! Logs go to stderr through a `fmt` layer; a [`TracingBridge`] layer collects
//! warnings and errors for the summary printed after a run. Machine-readable
//! output goes to stdout as JSON.

mod bridge;
mod host;
mod runner;
mod settings;

use bridge::{DiagnosticSummary, TracingBridge};
use clap::{Parser, Subcommand};
use host::LoggingHost;
use runner::{RunError, Runner};
use serde_json::Value;
use settings::{check_frame_rate, OverlaySettings, SettingsError, SETTINGS_FILE_NAME};
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;
use stream_companion_sequencer::{
    centered_grid_positions, grid_positions, validate_behavior, Catalogs, GridSpec, LayoutError,
};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stream-companion-overlay", version)]
struct Cli {
    /// Settings file (RON).
    #[arg(long, env = "STREAM_COMPANION_SETTINGS", default_value = SETTINGS_FILE_NAME)]
    settings: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay overlay messages and print final sequencer status.
    Run(RunArgs),
    /// Check a behavior for problems.
    Lint(LintArgs),
    /// Compute grid positions for a group of cards.
    Grid(GridArgs),
    /// Write a settings file with default values.
    Init,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Input file with one JSON message per line; stdin when omitted.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Override the configured frame rate.
    #[arg(long)]
    frame_rate: Option<f64>,
}

#[derive(Parser, Debug)]
struct LintArgs {
    /// JSON file holding a behavior array or an element with a `behavior`.
    path: PathBuf,
}

#[derive(Parser, Debug)]
struct GridArgs {
    /// Number of cards.
    #[arg(long)]
    count: usize,

    /// Cards per row.
    #[arg(long, default_value_t = 2)]
    columns: usize,

    /// Area width (or card width with `--card-size`).
    #[arg(long, default_value_t = 1.0)]
    width: f64,

    /// Area height (or card height with `--card-size`).
    #[arg(long, default_value_t = 1.0)]
    height: f64,

    /// Gap between columns.
    #[arg(long, default_value_t = 0.02)]
    horizontal_spacing: f64,

    /// Gap between rows.
    #[arg(long, default_value_t = 0.02)]
    vertical_spacing: f64,

    /// Treat width/height as the size of one card.
    #[arg(long, default_value_t = false)]
    card_size: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Run(#[from] RunError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("{}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} problem(s) found")]
    LintFailed(usize),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match OverlaySettings::load_or_default(&cli.settings) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Create the diagnostic bridge (channel pair)
    let (bridge_layer, diagnostics) = TracingBridge::new();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(bridge_layer)
        .init();

    tracing::debug!(
        "Starting Stream Companion overlay v{}",
        env!("CARGO_PKG_VERSION")
    );

    let summary_settings = settings.summary.clone();
    let result = match cli.cmd {
        Command::Run(args) => cmd_run(args, settings),
        Command::Lint(args) => cmd_lint(args),
        Command::Grid(args) => cmd_grid(args),
        Command::Init => cmd_init(&cli.settings),
    };

    let summary = DiagnosticSummary::collect(&diagnostics);
    if summary_settings.enabled && !summary.is_empty() {
        eprint!("{}", summary.render(summary_settings.max_entries));
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_run(args: RunArgs, mut settings: OverlaySettings) -> Result<(), CliError> {
    if let Some(frame_rate) = args.frame_rate {
        settings.frame_rate = check_frame_rate(frame_rate)?;
    }

    let mut runner = Runner::new(&settings, LoggingHost::new());
    let report = match &args.in_path {
        Some(path) => {
            let file = std::fs::File::open(path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            runner.run(BufReader::new(file))?
        }
        None => runner.run(std::io::stdin().lock())?,
    };

    tracing::info!(
        host_calls = runner.host().calls(),
        visible = runner.host().visible().len(),
        "host summary"
    );
    println!("{}", serde_json::to_string_pretty(&report.statuses)?);
    Ok(())
}

fn cmd_lint(args: LintArgs) -> Result<(), CliError> {
    let content = std::fs::read_to_string(&args.path).map_err(|source| CliError::Read {
        path: args.path.clone(),
        source,
    })?;
    let document: Value = serde_json::from_str(&content)?;
    let behavior = match document.get("behavior") {
        Some(behavior) => behavior,
        None => &document,
    };

    let issues = validate_behavior(behavior, &Catalogs::builtin());
    for issue in &issues {
        println!("{issue}");
    }
    if issues.is_empty() {
        println!("ok");
        Ok(())
    } else {
        Err(CliError::LintFailed(issues.len()))
    }
}

fn cmd_grid(args: GridArgs) -> Result<(), CliError> {
    let grid = GridSpec {
        columns: args.columns,
        vertical_spacing: args.vertical_spacing,
        horizontal_spacing: args.horizontal_spacing,
    };
    let positions = if args.card_size {
        centered_grid_positions(args.count, args.width, args.height, grid)?
    } else {
        grid_positions(args.count, args.width, args.height, grid)?
    };
    println!("{}", serde_json::to_string_pretty(&positions)?);
    Ok(())
}

fn cmd_init(path: &std::path::Path) -> Result<(), CliError> {
    OverlaySettings::default().save(path)?;
    tracing::info!(path = %path.display(), "wrote default settings");
    Ok(())
}
