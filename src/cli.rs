// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Running the capture loop in real time
//! - Replaying a sensor trace in virtual time
//! - Showing the effective configuration

use crate::Overrides;
use motion_camera::config::Config;
use motion_camera::controller::{CaptureController, SessionState, Timestamp, Transition};
use motion_camera::device::{DryRunCamera, LoggingFrameSink, SimulatedCamera};
use motion_camera::errors::{AppError, AppResult};
use motion_camera::events::{EventSink, JsonLinesEventSink, TracingEventSink};
use motion_camera::scheduler::TickScheduler;
use motion_camera::sensor::trace::SensorTrace;
use motion_camera::sensor::{LatestSample, OrientationSample};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Load the config file and apply command-line overrides
fn load_config(path: Option<&Path>, overrides: &Overrides) -> AppResult<Config> {
    let mut config = Config::load(path)?;

    if let Some(threshold) = overrides.threshold {
        config.threshold = threshold;
    }
    if let Some(profile) = overrides.profile {
        config.profile = profile;
        // An explicit profile on the command line beats a file-level override
        config.session_duration_ms = None;
    }
    if let Some(session_ms) = overrides.session_ms {
        config.session_duration_ms = Some(session_ms);
    }
    if let Some(tick_ms) = overrides.tick_ms {
        config.tick_interval_ms = tick_ms;
    }

    Ok(config)
}

/// Print the effective configuration as JSON
pub fn show_config(
    path: Option<&Path>,
    overrides: &Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path, overrides)?;
    config.validate()?;

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Evaluate a trace tick by tick without sleeping
pub fn replay(
    path: Option<&Path>,
    overrides: &Overrides,
    trace_path: &Path,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path, overrides)?;
    let settings = config.validate()?;
    let trace = SensorTrace::from_file(trace_path)?;

    if trace.is_empty() {
        return Err(AppError::from("Trace has no entries").into());
    }

    let sensor = LatestSample::new();
    let summary = if json {
        let sink = JsonLinesEventSink::new(std::io::stdout());
        replay_ticks(
            CaptureController::with_sinks(
                settings,
                sensor.clone(),
                DryRunCamera::new(),
                sink,
                LoggingFrameSink::new(),
            ),
            &sensor,
            &trace,
            config.tick_interval(),
            false,
        )
    } else {
        println!("{:>10}  {:<10}  {:>7}  event", "time", "state", "z");
        replay_ticks(
            CaptureController::with_sinks(
                settings,
                sensor.clone(),
                DryRunCamera::new(),
                TracingEventSink,
                LoggingFrameSink::new(),
            ),
            &sensor,
            &trace,
            config.tick_interval(),
            true,
        )
    };

    if !json {
        println!();
        println!("Device commands: {}", summary.device_commands);
        println!("Sessions: {}", summary.sessions);
    }
    Ok(())
}

/// Totals from a replay
struct ReplaySummary {
    sessions: u32,
    device_commands: u32,
}

/// Tick through `trace`, and past its end until any open session closes
fn replay_ticks<E: EventSink>(
    mut controller: CaptureController<LatestSample, DryRunCamera, E, LoggingFrameSink>,
    sensor: &LatestSample,
    trace: &SensorTrace,
    tick: Duration,
    table: bool,
) -> ReplaySummary {
    let mut sessions = 0;
    let mut elapsed = Duration::ZERO;

    while elapsed <= trace.duration() || controller.state() == SessionState::Capturing {
        let sample = trace.sample_at(elapsed);
        sensor.publish(sample);

        let now = Timestamp::from(elapsed);
        let transition = controller.on_tick(now);
        if matches!(transition, Some(Transition::Started { .. })) {
            sessions += 1;
        }

        if table && transition.is_some() {
            print_transition(now, controller.state(), &sample, transition);
        }

        elapsed += tick;
    }

    ReplaySummary {
        sessions,
        device_commands: controller.device().commands(),
    }
}

fn print_transition(
    now: Timestamp,
    state: SessionState,
    sample: &OrientationSample,
    transition: Option<Transition>,
) {
    let z = sample
        .z
        .map(|z| format!("{:.2}", z))
        .unwrap_or_else(|| "-".to_string());
    let event = match transition {
        Some(Transition::Started { deadline, .. }) => format!("start (until {})", deadline),
        Some(Transition::Stopped { frames, .. }) => format!("stop ({} frames)", frames),
        None => String::new(),
    };
    println!("{:>10}  {:<10}  {:>7}  {}", now.to_string(), state.to_string(), z, event);
}

/// Run the capture loop in real time until Ctrl+C or `duration` seconds
pub fn run(
    path: Option<&Path>,
    overrides: &Overrides,
    trace_path: Option<PathBuf>,
    duration: Option<u64>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path, overrides)?;
    let settings = config.validate()?;
    let trace = trace_path
        .as_deref()
        .map(SensorTrace::from_file)
        .transpose()?;

    if trace.is_none() {
        warn!("No sensor trace given; the sensor will stay unavailable");
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let sensor = LatestSample::new();
        let feeder = trace.map(|trace| trace.spawn_feeder(sensor.clone()));
        let (camera, frames) = SimulatedCamera::new(config.frame_interval());
        let scheduler = TickScheduler::new(config.tick_interval());

        let frame_total = if json {
            let events = JsonLinesEventSink::new(std::io::stdout());
            let controller = CaptureController::with_sinks(
                settings,
                sensor,
                camera,
                events,
                LoggingFrameSink::new(),
            );
            let handle = scheduler.spawn(controller, frames);
            install_stop_triggers(handle.cancel_handle(), duration)?;
            handle.join().await.map_err(|e| e.to_string())?.frame_sink().total()
        } else {
            let controller = CaptureController::new(settings, sensor, camera);
            let handle = scheduler.spawn(controller, frames);
            install_stop_triggers(handle.cancel_handle(), duration)?;
            handle.join().await.map_err(|e| e.to_string())?.frame_sink().total()
        };

        if let Some(feeder) = feeder {
            feeder.abort();
        }

        info!(frames = frame_total, "Capture loop finished");
        if !json {
            println!("Frames captured: {}", frame_total);
        }
        Ok::<(), AppError>(())
    })?;

    Ok(())
}

/// Cancel on Ctrl+C, and after `duration` seconds if given
fn install_stop_triggers(
    cancel: motion_camera::CancelHandle,
    duration: Option<u64>,
) -> AppResult<()> {
    let on_signal = cancel.clone();
    ctrlc::set_handler(move || {
        on_signal.cancel();
    })
    .map_err(|e| AppError::Other(format!("Cannot install Ctrl+C handler: {}", e)))?;

    if let Some(secs) = duration {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            info!(secs, "Run duration elapsed");
            cancel.cancel();
        });
    } else {
        eprintln!("Watching for motion... (press Ctrl+C to stop)");
    }

    Ok(())
}
