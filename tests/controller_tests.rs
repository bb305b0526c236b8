// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture session controller

use motion_camera::device::{CameraFrame, CaptureDevice};
use motion_camera::errors::DeviceResult;
use motion_camera::{
    CaptureController, CaptureEvent, ControllerSettings, LatestSample, OrientationSample,
    SensorSource, SessionState, Timestamp, Transition,
};
use std::cell::Cell;
use std::collections::VecDeque;
use std::time::Duration;
use uuid::Uuid;

/// Sensor that hands out one scripted reading per tick
struct ScriptedSensor {
    readings: VecDeque<OrientationSample>,
    current: Cell<OrientationSample>,
}

impl ScriptedSensor {
    fn new(readings: impl IntoIterator<Item = OrientationSample>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            current: Cell::new(OrientationSample::UNAVAILABLE),
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.readings.pop_front() {
            self.current.set(next);
        }
    }
}

impl SensorSource for ScriptedSensor {
    fn current_sample(&self) -> OrientationSample {
        self.current.get()
    }
}

#[derive(Default)]
struct RecordingDevice {
    running: bool,
    starts: u32,
    stops: u32,
}

impl CaptureDevice for RecordingDevice {
    fn start(&mut self) -> DeviceResult<()> {
        self.starts += 1;
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> DeviceResult<()> {
        self.stops += 1;
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

type Controller<S> =
    CaptureController<S, RecordingDevice, Vec<CaptureEvent>, Vec<(Uuid, CameraFrame)>>;

fn settings(session_secs: u64) -> ControllerSettings {
    ControllerSettings::new(0.05, Duration::from_secs(session_secs)).unwrap()
}

fn controller<S: SensorSource>(sensor: S, session_secs: u64) -> Controller<S> {
    CaptureController::with_sinks(
        settings(session_secs),
        sensor,
        RecordingDevice::default(),
        Vec::new(),
        Vec::new(),
    )
}

#[test]
fn test_reference_scenario() {
    let readings = [0.0, 0.06, 0.06, 0.06].map(OrientationSample::from_z);
    let mut sensor = ScriptedSensor::new(readings);
    sensor.advance();
    let mut ctl = controller(sensor, 2);

    // t=0: 0.00, no trigger
    assert_eq!(ctl.on_tick(Timestamp::from_secs(0)), None);
    assert_eq!(ctl.state(), SessionState::Idle);
    assert_eq!(ctl.last_calibrated(), Some(0.0));

    // t=1: 0.06 starts a session until t=3
    ctl.sensor_mut().advance();
    let started = ctl.on_tick(Timestamp::from_secs(1));
    assert!(matches!(
        started,
        Some(Transition::Started { deadline, .. }) if deadline == Timestamp::from_secs(3)
    ));
    assert_eq!(ctl.state(), SessionState::Capturing);

    // t=2: motion ignored while capturing
    ctl.sensor_mut().advance();
    assert_eq!(ctl.on_tick(Timestamp::from_secs(2)), None);
    assert_eq!(ctl.state(), SessionState::Capturing);
    assert_eq!(ctl.deadline(), Some(Timestamp::from_secs(3)));

    // t=3: deadline reached
    ctl.sensor_mut().advance();
    assert!(matches!(
        ctl.on_tick(Timestamp::from_secs(3)),
        Some(Transition::Stopped { .. })
    ));
    assert_eq!(ctl.state(), SessionState::Idle);
    assert_eq!(ctl.deadline(), None);

    assert_eq!(ctl.device().starts, 1);
    assert_eq!(ctl.device().stops, 1);
    assert!(ctl.is_consistent());
}

#[test]
fn test_unavailable_sensor_never_triggers() {
    let mut ctl = controller(LatestSample::new(), 1);

    for ms in (0..60_000).step_by(100) {
        assert_eq!(ctl.on_tick(Timestamp::from_millis(ms)), None);
    }

    assert_eq!(ctl.state(), SessionState::Idle);
    assert_eq!(ctl.device().starts, 0);
    assert_eq!(ctl.device().stops, 0);
    assert_eq!(ctl.last_calibrated(), None);
    assert!(ctl.events().is_empty());
}

#[test]
fn test_unavailable_tick_does_not_clear_previous_value() {
    let sensor = LatestSample::new();
    let mut ctl = controller(sensor.clone(), 1);

    sensor.publish(OrientationSample::from_z(0.031));
    ctl.on_tick(Timestamp::ZERO);
    sensor.clear();
    ctl.on_tick(Timestamp::from_millis(100));

    assert_eq!(ctl.last_calibrated(), Some(0.03));
}

#[test]
fn test_debounce_single_start_per_session() {
    let sensor = LatestSample::new();
    sensor.publish(OrientationSample::from_z(0.9));
    let mut ctl = controller(sensor.clone(), 10);

    for ms in (0..10_000).step_by(100) {
        ctl.on_tick(Timestamp::from_millis(ms));
    }

    assert_eq!(ctl.device().starts, 1);
    assert_eq!(ctl.deadline(), Some(Timestamp::from_secs(10)));
    let motion_events = ctl
        .events()
        .iter()
        .filter(|e| matches!(e, CaptureEvent::MotionDetected { .. }))
        .count();
    assert_eq!(motion_events, 1);
}

#[test]
fn test_cooldown_ends_at_first_tick_past_deadline() {
    let sensor = LatestSample::new();
    sensor.publish(OrientationSample::from_z(0.2));
    let mut ctl = controller(sensor.clone(), 2);

    ctl.on_tick(Timestamp::from_millis(250));
    sensor.clear();

    // deadline is 2.25s; ticks at 0.35, 0.45, ...
    let mut stopped_at = None;
    for ms in (350..5_000).step_by(100) {
        if ctl.on_tick(Timestamp::from_millis(ms)).is_some() {
            stopped_at = Some(ms);
            break;
        }
        assert_eq!(ctl.state(), SessionState::Capturing, "stopped early at {}ms", ms);
    }

    assert_eq!(stopped_at, Some(2_250));
}

#[test]
fn test_cooldown_with_irregular_ticks() {
    let sensor = LatestSample::new();
    sensor.publish(OrientationSample::from_z(0.2));
    let mut ctl = controller(sensor.clone(), 2);

    ctl.on_tick(Timestamp::from_secs(10));
    assert_eq!(ctl.on_tick(Timestamp::from_millis(11_999)), None);
    assert!(ctl.on_tick(Timestamp::from_millis(12_400)).is_some());
}

#[test]
fn test_threshold_boundary_does_not_trigger() {
    let sensor = LatestSample::new();
    let mut ctl = controller(sensor.clone(), 1);

    for z in [0.05, -0.05, 0.049999, 0.0549] {
        sensor.publish(OrientationSample::from_z(z));
        assert_eq!(ctl.on_tick(Timestamp::ZERO), None, "z={} should not trigger", z);
    }
    assert_eq!(ctl.device().starts, 0);
}

#[test]
fn test_force_stop_twice_from_idle() {
    let mut ctl = controller(LatestSample::new(), 1);

    assert_eq!(ctl.force_stop(), None);
    assert_eq!(ctl.force_stop(), None);

    assert_eq!(ctl.state(), SessionState::Idle);
    assert_eq!(ctl.device().stops, 0);
}

#[test]
fn test_force_stop_ends_session_early_then_idles() {
    let sensor = LatestSample::new();
    sensor.publish(OrientationSample::from_z(0.2));
    let mut ctl = controller(sensor.clone(), 120);
    ctl.on_tick(Timestamp::ZERO);

    assert!(matches!(ctl.force_stop(), Some(Transition::Stopped { .. })));
    assert_eq!(ctl.force_stop(), None);

    assert_eq!(ctl.state(), SessionState::Idle);
    assert_eq!(ctl.device().stops, 1);
    assert!(ctl.is_consistent());
}

#[test]
fn test_each_session_gets_a_new_id() {
    let sensor = LatestSample::new();
    sensor.publish(OrientationSample::from_z(0.2));
    let mut ctl = controller(sensor.clone(), 1);

    ctl.on_tick(Timestamp::from_secs(0));
    let first = ctl.session_id().unwrap();
    ctl.on_tick(Timestamp::from_secs(1));
    ctl.on_tick(Timestamp::from_secs(2));
    let second = ctl.session_id().unwrap();

    assert_ne!(first, second);
    assert_eq!(ctl.device().starts, 2);
}
