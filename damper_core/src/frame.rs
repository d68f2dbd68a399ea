//! Sensor frame parsing and actuator command encoding.
//!
//! The IMU board prints one reading per line:
//!
//! ```text
//! Time: 12.345 | Raw: X = -0.120, Y = 0.003, Z = 0.998
//! ```
//!
//! Anything else on the link (boot banners, lines cut at a buffer boundary)
//! parses to `None`; that is the common case at startup, not an error.

use std::time::Duration;

use damper_traits::Prediction;

const TIME_TAG: &str = "Time: ";
const X_TAG: &str = " | Raw: X = ";
const Y_TAG: &str = ", Y = ";
const Z_TAG: &str = ", Z = ";

/// One reading exactly as the device reported it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// The device's own time marker (seconds since its boot).
    pub device_time_s: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One accepted reading stamped with host time since acquisition start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub elapsed_s: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Sample {
    pub fn from_frame(frame: &Frame, elapsed: Duration) -> Self {
        Self {
            elapsed_s: elapsed.as_secs_f64(),
            x: frame.x,
            y: frame.y,
            z: frame.z,
        }
    }

    #[inline]
    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

/// Which accelerometer axis feeds the feature window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    X,
    Y,
    #[default]
    Z,
}

/// Parse one line from the sensor. Returns `None` for anything that is not a
/// complete frame.
///
/// The frame may start anywhere in the line. A cut-off frame followed by a
/// complete one (line buffer corruption) yields the complete one.
pub fn parse_frame(line: &str) -> Option<Frame> {
    line.match_indices(TIME_TAG)
        .find_map(|(start, _)| parse_fields(&line[start + TIME_TAG.len()..]))
}

fn parse_fields(rest: &str) -> Option<Frame> {
    let (device_time_s, rest) = take_number(rest, false)?;
    let (x, rest) = take_number(rest.strip_prefix(X_TAG)?, true)?;
    let (y, rest) = take_number(rest.strip_prefix(Y_TAG)?, true)?;
    let (z, rest) = take_number(rest.strip_prefix(Z_TAG)?, true)?;
    // Z must end at a field boundary, otherwise it may be the head of a longer number.
    if !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
        return None;
    }
    Some(Frame {
        device_time_s,
        x,
        y,
        z,
    })
}

/// Split a leading decimal off `s`. Signs are only accepted when `signed`.
fn take_number(s: &str, signed: bool) -> Option<(f64, &str)> {
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || (signed && (c == '-' || c == '+'))))
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let v: f64 = s[..end].parse().ok()?;
    if !v.is_finite() {
        return None;
    }
    Some((v, &s[end..]))
}

/// Render a prediction as one actuator command line.
pub fn encode_command(p: &Prediction) -> String {
    format!("{p}\n")
}
