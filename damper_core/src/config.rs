//! Runtime configuration for the control loop.
//!
//! These are the structs the tasks consume. They are separate from the
//! TOML-deserialized config in `damper_config`; see `conversions`.

use std::time::Duration;

use crate::channel::OverflowPolicy;
use crate::frame::Axis;

/// Task cadences.
#[derive(Debug, Clone)]
pub struct TimingCfg {
    /// Minimum spacing between accepted sensor ticks (T_s).
    pub sample_period: Duration,
    /// Minimum spacing between actuator transmissions (T_a).
    pub actuation_period: Duration,
    /// Sleep between polls while a task waits for its next tick.
    pub idle: Duration,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            sample_period: Duration::from_millis(10),
            actuation_period: Duration::from_millis(20),
            idle: Duration::from_millis(1),
        }
    }
}

/// Feature window shape.
#[derive(Debug, Clone)]
pub struct WindowCfg {
    /// W: samples per inference window.
    pub capacity: usize,
    /// K: inference every K insertions once the window is full.
    pub stride: usize,
    /// Axis fed into the window.
    pub axis: Axis,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self {
            capacity: 50,
            stride: 10,
            axis: Axis::Z,
        }
    }
}

/// Prediction handoff.
#[derive(Debug, Clone)]
pub struct ChannelCfg {
    /// Q: predictions buffered between the tasks.
    pub capacity: usize,
    pub overflow: OverflowPolicy,
}

impl Default for ChannelCfg {
    fn default() -> Self {
        Self {
            capacity: 5,
            overflow: OverflowPolicy::DropNewest,
        }
    }
}

/// Raw sample log.
#[derive(Debug, Clone)]
pub struct LogCfg {
    pub flush_every: usize,
}

impl Default for LogCfg {
    fn default() -> Self {
        Self { flush_every: 20 }
    }
}
