//! Wire format for sensor samples.
//!
//! The sensor page streams one JSON object per line, carrying the browser's
//! `deviceorientation` angles in degrees plus the operator's reset counter:
//!
//! ```text
//! {"alpha": 271.5, "beta": 12.0, "gamma": -3.25, "counter": 4}\n
//! ```
//!
//! `alpha` is the heading in `[0, 360]`, `beta` the pitch in `[-180, 180]`,
//! `gamma` the roll in `[-90, 90]`. Unknown fields are ignored. A line that
//! does not parse or is out of range is rejected on its own; the stream
//! carries on with the next line.

use crate::types::SensorSample;
use serde::Deserialize;
use thiserror::Error;

/// Largest integer a float counter may carry and still be exact.
const MAX_SAFE_COUNTER: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed orientation message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("Counter {0} is not a non-negative integer")]
    InvalidCounter(serde_json::Number),
    #[error("Line of {0} bytes exceeds the message size limit")]
    LineTooLong(usize),
}

/// One `deviceorientation` reading as sent by the sensor page.
#[derive(Debug, Clone, Deserialize)]
pub struct OrientationMessage {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    /// Kept as written so large integers are not rounded through `f64`.
    pub counter: serde_json::Number,
}

impl OrientationMessage {
    /// Validate ranges and convert degrees to radians.
    pub fn into_sample(self) -> Result<SensorSample, ProtocolError> {
        let alpha = in_range("alpha", self.alpha, 0.0, 360.0)?;
        let beta = in_range("beta", self.beta, -180.0, 180.0)?;
        let gamma = in_range("gamma", self.gamma, -90.0, 90.0)?;

        let counter = parse_counter(&self.counter)
            .ok_or(ProtocolError::InvalidCounter(self.counter))?;

        Ok(SensorSample {
            pitch: beta.to_radians(),
            yaw: alpha.to_radians(),
            roll: gamma.to_radians(),
            counter,
        })
    }
}

/// Exact integers are taken as is; floats only when integral and exactly
/// representable.
fn parse_counter(number: &serde_json::Number) -> Option<u64> {
    if let Some(counter) = number.as_u64() {
        return Some(counter);
    }
    let value = number.as_f64()?;
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= MAX_SAFE_COUNTER)
        .then_some(value as u64)
}

fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, ProtocolError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ProtocolError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Parse a single message line (without its newline).
pub fn parse_line(line: &[u8]) -> Result<SensorSample, ProtocolError> {
    let message: OrientationMessage = serde_json::from_slice(line)?;
    message.into_sample()
}

/// Streaming parser for newline-delimited sensor messages.
///
/// Feed raw TCP bytes via `push_data`, then drain parsed samples via `next_sample`.
pub struct ProtocolParser {
    buffer: Vec<u8>,
    max_line_bytes: usize,
    /// Set while skipping the rest of an oversized line.
    discarding: bool,
}

impl ProtocolParser {
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(max_line_bytes.min(64 * 1024)),
            max_line_bytes,
            discarding: false,
        }
    }

    /// Append received bytes to the internal buffer.
    pub fn push_data(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to extract the next complete line and parse it.
    /// Returns `None` if no complete line is available yet.
    pub fn next_sample(&mut self) -> Option<Result<SensorSample, ProtocolError>> {
        loop {
            let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') else {
                if self.buffer.len() > self.max_line_bytes {
                    let len = self.buffer.len();
                    self.buffer.clear();
                    // Report an oversized line once, then keep dropping until its end.
                    if !std::mem::replace(&mut self.discarding, true) {
                        return Some(Err(ProtocolError::LineTooLong(len)));
                    }
                }
                return None;
            };

            let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
            if std::mem::take(&mut self.discarding) {
                continue;
            }

            let line = raw[..newline].trim_ascii();
            if line.is_empty() {
                continue;
            }
            if line.len() > self.max_line_bytes {
                return Some(Err(ProtocolError::LineTooLong(line.len())));
            }

            return Some(parse_line(line));
        }
    }
}
