use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::{error, info};
use std::path::PathBuf;

use netpush::commands::SwitchKind;
use netpush::config_loader;
use netpush::orchestrator::{self, OutputMode, DEFAULT_ROUTER_OUTPUT, DEFAULT_SWITCH_OUTPUT};
use netpush::sink::RunReport;

/// Push CSV-driven configuration to Cisco switches, routers and Shelly plugs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the job configuration YAML file
    #[arg(short, long, global = true, default_value = "netpush.yaml", env = "NETPUSH_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Configure VLANs and ports on a switch
    Switch {
        /// Write a local file or configure the device over SSH
        #[arg(short, long, value_enum, default_value_t = OutputMode::Remote)]
        mode: OutputMode,

        /// Override the switch kind from the job file
        #[arg(long, value_enum)]
        kind: Option<SwitchKind>,

        /// Output file for local mode
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the commands instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Configure interfaces and routes on a broadband router
    Router {
        /// Write a local file or configure the device over SSH (asked when omitted)
        #[arg(short, long, value_enum)]
        mode: Option<OutputMode>,

        /// Output file for local mode
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the commands instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Configure a Shelly smart plug over its HTTP API
    Plug {
        /// Device name (overrides the job file)
        #[arg(long)]
        name: Option<String>,

        /// Keep the cloud connection enabled
        #[arg(long)]
        cloud: bool,

        /// Print the requests instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Configuration file: {:?}", args.config);
    let config = config_loader::load_config(&args.config)?;

    match args.command {
        Command::Switch { mode, kind, output, dry_run } => {
            let plan = orchestrator::plan_switch(&config, kind)?;
            let output = orchestrator::output_path(&config, output.as_deref(), DEFAULT_SWITCH_OUTPUT);
            let report = orchestrator::deliver(&plan, &config, mode, &output, dry_run)?;
            finish(&report)
        }
        Command::Router { mode, output, dry_run } => {
            let plan = orchestrator::plan_router(&config)?;
            let mode = match mode {
                Some(mode) => mode,
                None if dry_run => OutputMode::Local,
                None => ask_mode()?,
            };
            let output = orchestrator::output_path(&config, output.as_deref(), DEFAULT_ROUTER_OUTPUT);
            let report = orchestrator::deliver(&plan, &config, mode, &output, dry_run)?;
            finish(&report)
        }
        Command::Plug { name, cloud, dry_run } => {
            let report = orchestrator::run_plug(&config, name.as_deref(), cloud, dry_run)?;
            if !report.is_clean() {
                bail!("{} of {} plug requests failed", report.failed.len(), report.failed.len() + report.succeeded.len());
            }
            info!("Plug configuration completed successfully");
            Ok(())
        }
    }
}

/// Ask whether to configure the router remotely or locally
fn ask_mode() -> Result<OutputMode> {
    let answer: String = dialoguer::Input::new()
        .with_prompt("Would you like to configure the router remotely (R) or locally (L)? (R/L)")
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            match input.trim().to_lowercase().as_str() {
                "r" | "l" => Ok(()),
                _ => Err("Invalid input. Please choose 'R' for remote or 'L' for local."),
            }
        })
        .interact_text()
        .wrap_err("Failed to read mode selection")?;

    Ok(parse_mode_answer(&answer).unwrap_or(OutputMode::Local))
}

fn parse_mode_answer(answer: &str) -> Option<OutputMode> {
    match answer.trim().to_lowercase().as_str() {
        "r" => Some(OutputMode::Remote),
        "l" => Some(OutputMode::Local),
        _ => None,
    }
}

fn finish(report: &RunReport) -> Result<()> {
    if report.is_clean() {
        info!("Configuration completed successfully");
        return Ok(());
    }
    for rejection in &report.rejections {
        error!("{}: '{}' -> {}", rejection.block, rejection.command, rejection.message);
    }
    bail!("{} command blocks were rejected by the device", report.rejections.len())
}
