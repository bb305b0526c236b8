// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end tests: simulated camera, tick scheduler and controller together
//!
//! The simulated camera produces frames on a real thread, so these tests run
//! on wall-clock time with short periods.

use motion_camera::device::{CameraFrame, CaptureDevice, SimulatedCamera};
use motion_camera::errors::DeviceError;
use motion_camera::{
    CaptureController, CaptureEvent, ControllerSettings, LatestSample, OrientationSample,
    SessionState, TickScheduler, Timestamp, Transition,
};
use std::time::Duration;
use uuid::Uuid;

type Controller =
    CaptureController<LatestSample, SimulatedCamera, Vec<CaptureEvent>, Vec<(Uuid, CameraFrame)>>;

fn controller(sensor: &LatestSample, camera: SimulatedCamera, session: Duration) -> Controller {
    let settings = ControllerSettings::new(0.05, session).unwrap();
    CaptureController::with_sinks(settings, sensor.clone(), camera, Vec::new(), Vec::new())
}

#[tokio::test]
async fn test_camera_frames_reach_the_session_and_cancel_stops_it() {
    let sensor = LatestSample::new();
    sensor.publish(OrientationSample::from_z(0.3));
    let (camera, frames) = SimulatedCamera::new(Duration::from_millis(5));
    let ctl = controller(&sensor, camera, Duration::from_secs(60));

    let handle = TickScheduler::new(Duration::from_millis(10)).spawn(ctl, frames);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let ctl = handle.cancel().await.unwrap();

    assert_eq!(ctl.state(), SessionState::Idle);
    assert!(!ctl.device().is_running());
    assert!(ctl.is_consistent());

    let names: Vec<_> = ctl.events().iter().map(CaptureEvent::name).collect();
    assert_eq!(names, ["motion_detected", "capture_start", "capture_stop"]);

    let Some(CaptureEvent::CaptureStart { session, .. }) = ctl.events().get(1).cloned() else {
        panic!("expected capture_start, got {:?}", ctl.events());
    };
    let Some(CaptureEvent::CaptureStop {
        session: stopped,
        frames,
        ..
    }) = ctl.events().last().cloned()
    else {
        panic!("expected capture_stop, got {:?}", ctl.events());
    };

    assert_eq!(stopped, session);
    assert!(frames > 0, "no frames reached the session");
    assert_eq!(ctl.frame_sink().len() as u64, frames);
    assert!(ctl.frame_sink().iter().all(|(id, _)| *id == session));
}

#[tokio::test]
async fn test_quiet_sensor_never_starts_the_camera() {
    let sensor = LatestSample::new();
    sensor.publish(OrientationSample::from_z(0.01));
    let (camera, frames) = SimulatedCamera::new(Duration::from_millis(5));
    let ctl = controller(&sensor, camera, Duration::from_secs(60));

    let handle = TickScheduler::new(Duration::from_millis(10)).spawn(ctl, frames);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let ctl = handle.cancel().await.unwrap();

    assert!(ctl.events().is_empty());
    assert!(ctl.frame_sink().is_empty());
    assert!(!ctl.device().is_running());
}

#[test]
fn test_controller_stops_a_camera_that_is_already_running() {
    let sensor = LatestSample::new();
    sensor.publish(OrientationSample::from_z(0.3));
    let (mut camera, _frames) = SimulatedCamera::new(Duration::from_millis(5));
    camera.start().unwrap();

    let mut ctl = controller(&sensor, camera, Duration::from_secs(10));
    assert_eq!(ctl.state(), SessionState::Idle);
    assert!(!ctl.device().is_running());
    assert!(ctl.is_consistent());

    let mut started = 0;
    for ms in (0..2_000).step_by(100) {
        if matches!(
            ctl.on_tick(Timestamp::from_millis(ms)),
            Some(Transition::Started { .. })
        ) {
            started += 1;
        }
        assert!(ctl.is_consistent());
    }

    assert_eq!(started, 1);
    assert_eq!(ctl.state(), SessionState::Capturing);
    assert!(ctl.force_stop().is_some());
}

#[test]
fn test_rejected_start_reports_motion_once_and_recovers() {
    let sensor = LatestSample::new();
    sensor.publish(OrientationSample::from_z(0.3));
    let (mut camera, _frames) = SimulatedCamera::new(Duration::from_millis(5));
    camera.fail_next_start(DeviceError::Busy);

    let mut ctl = controller(&sensor, camera, Duration::from_secs(10));

    assert_eq!(ctl.on_tick(Timestamp::ZERO), None);
    assert_eq!(ctl.state(), SessionState::Idle);
    assert!(ctl.is_consistent());

    assert!(ctl.on_tick(Timestamp::from_millis(100)).is_some());
    assert!(ctl.device().is_running());

    let names: Vec<_> = ctl.events().iter().map(CaptureEvent::name).collect();
    assert_eq!(names, ["motion_detected", "capture_start"]);

    assert!(ctl.force_stop().is_some());
    assert!(ctl.is_consistent());
}
