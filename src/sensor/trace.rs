// SPDX-License-Identifier: GPL-3.0-only

//! Recorded sensor traces
//!
//! A trace is a JSON-lines file, one reading per line:
//!
//! ```text
//! {"at_ms": 0, "z": 0.01}
//! {"at_ms": 400, "x": 0.2, "y": -0.1, "z": 0.08}
//! {"at_ms": 900}
//! ```
//!
//! A line without axes publishes "unavailable". Blank lines and lines
//! starting with `#` are ignored.

use super::{LatestSample, OrientationSample};
use crate::errors::SensorError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// One line of a trace
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Offset from the start of the trace
    pub at_ms: u64,
    #[serde(flatten)]
    pub sample: OrientationSample,
}

impl TraceEntry {
    pub fn at(&self) -> Duration {
        Duration::from_millis(self.at_ms)
    }
}

/// An ordered list of readings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorTrace {
    entries: Vec<TraceEntry>,
}

impl SensorTrace {
    /// Parse JSON-lines text
    pub fn parse(text: &str) -> Result<Self, SensorError> {
        let mut entries = Vec::new();
        let mut previous_at = 0;

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let entry: TraceEntry =
                serde_json::from_str(line).map_err(|e| SensorError::InvalidEntry {
                    line: line_no,
                    message: e.to_string(),
                })?;

            if entry.at_ms < previous_at {
                return Err(SensorError::OutOfOrder { line: line_no });
            }
            previous_at = entry.at_ms;
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    /// Read and parse a trace file
    pub fn from_file(path: &Path) -> Result<Self, SensorError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SensorError::Io(format!("{}: {}", path.display(), e)))?;
        let trace = Self::parse(&text)?;
        info!(path = %path.display(), entries = trace.len(), "Loaded sensor trace");
        Ok(trace)
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time of the last reading
    pub fn duration(&self) -> Duration {
        self.entries.last().map(TraceEntry::at).unwrap_or_default()
    }

    /// The reading a sensor would be reporting at `elapsed`
    ///
    /// Before the first entry the sensor has not reported anything.
    pub fn sample_at(&self, elapsed: Duration) -> OrientationSample {
        let idx = self.entries.partition_point(|e| e.at() <= elapsed);
        if idx == 0 {
            OrientationSample::UNAVAILABLE
        } else {
            self.entries[idx - 1].sample
        }
    }

    /// Publish each reading into `cell` at its offset from now
    ///
    /// The task ends after the last entry. The cell keeps the final reading.
    pub fn spawn_feeder(self, cell: LatestSample) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now();
            for entry in self.entries {
                tokio::time::sleep_until(start + entry.at()).await;
                debug!(at_ms = entry.at_ms, z = ?entry.sample.z, "Trace reading");
                cell.publish(entry.sample);
            }
            debug!("Sensor trace finished");
        })
    }
}
