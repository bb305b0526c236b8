// SPDX-License-Identifier: GPL-3.0-only

//! Observability events emitted by the capture controller

use crate::controller::Timestamp;
use serde::Serialize;
use std::io::Write;
use tracing::{info, warn};
use uuid::Uuid;

/// Structured controller event
///
/// Serializes as `{"event": "motion_detected", "value": 0.07, "timestamp": 1.2}`
/// and `{"event": "capture_start", "session": "...", "timestamp": 1.2}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CaptureEvent {
    /// A triggering reading was seen while idle
    MotionDetected { value: f64, timestamp: Timestamp },
    /// The device accepted a start command
    CaptureStart {
        session: Uuid,
        timestamp: Timestamp,
        deadline: Timestamp,
    },
    /// The device accepted a stop command
    CaptureStop {
        session: Uuid,
        timestamp: Timestamp,
        frames: u64,
    },
}

impl CaptureEvent {
    /// Name used in the `event` field
    pub fn name(&self) -> &'static str {
        match self {
            CaptureEvent::MotionDetected { .. } => "motion_detected",
            CaptureEvent::CaptureStart { .. } => "capture_start",
            CaptureEvent::CaptureStop { .. } => "capture_stop",
        }
    }
}

/// Receiver of controller events
pub trait EventSink {
    fn emit(&mut self, event: &CaptureEvent);
}

/// Collects events in memory
impl EventSink for Vec<CaptureEvent> {
    fn emit(&mut self, event: &CaptureEvent) {
        self.push(event.clone());
    }
}

/// Logs events through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&mut self, event: &CaptureEvent) {
        match event {
            CaptureEvent::MotionDetected { value, timestamp } => {
                info!(value, at = %timestamp, "Motion detected");
            }
            CaptureEvent::CaptureStart {
                session,
                timestamp,
                deadline,
            } => {
                info!(%session, at = %timestamp, until = %deadline, "Capture started");
            }
            CaptureEvent::CaptureStop {
                session,
                timestamp,
                frames,
            } => {
                info!(%session, at = %timestamp, frames, "Capture stopped");
            }
        }
    }
}

/// Writes one JSON object per line
pub struct JsonLinesEventSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesEventSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonLinesEventSink<W> {
    fn emit(&mut self, event: &CaptureEvent) {
        let result = serde_json::to_writer(&mut self.writer, event)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"))
            .and_then(|()| self.writer.flush());

        if let Err(e) = result {
            warn!(event = event.name(), error = %e, "Failed to write event");
        }
    }
}

/// Sends every event to two sinks
pub struct Tee<A, B>(pub A, pub B);

impl<A: EventSink, B: EventSink> EventSink for Tee<A, B> {
    fn emit(&mut self, event: &CaptureEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}
