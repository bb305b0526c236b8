// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use motion_camera::CaptureProfile;
use motion_camera::constants::app_info;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "motion-camera")]
#[command(about = "Start the camera when the device is moved")]
#[command(version = app_info::version())]
struct Cli {
    /// Config file (default: ~/.config/motion-camera/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at info level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Settings that override the config file
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Motion threshold on the calibrated z value
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Session length preset (quick, extended)
    #[arg(long)]
    pub profile: Option<CaptureProfile>,

    /// Session length in milliseconds, overrides the profile
    #[arg(long)]
    pub session_ms: Option<u64>,

    /// Tick period in milliseconds
    #[arg(long)]
    pub tick_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the capture loop in real time with a simulated camera
    Run {
        #[command(flatten)]
        overrides: Overrides,

        /// Sensor trace to feed (JSON lines); without one the sensor stays unavailable
        #[arg(short, long)]
        trace: Option<PathBuf>,

        /// Stop after this many seconds (default: run until Ctrl+C)
        #[arg(short, long)]
        duration: Option<u64>,

        /// Print events as JSON lines on stdout
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a sensor trace in virtual time and print every transition
    Replay {
        #[command(flatten)]
        overrides: Overrides,

        /// Sensor trace (JSON lines)
        trace: PathBuf,

        /// Print events as JSON lines instead of a transition table
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        #[command(flatten)]
        overrides: Overrides,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence, e.g. RUST_LOG=motion_camera=debug
    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run {
            overrides,
            trace,
            duration,
            json,
        } => cli::run(config_path, &overrides, trace, duration, json),
        Commands::Replay {
            overrides,
            trace,
            json,
        } => cli::replay(config_path, &overrides, &trace, json),
        Commands::Config { overrides } => cli::show_config(config_path, &overrides),
    }
}
