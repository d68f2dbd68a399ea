//! Hardware-neutral seams shared by every crate in the workspace.
//!
//! The control loop only ever talks to a sensor, an actuator and a predictive
//! model through the traits below, so serial hardware, simulators and test
//! doubles are interchangeable.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::fmt;

/// Output of an [`Oracle`]: a continuous correction or a discrete class id,
/// depending on the loaded model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prediction {
    Value(f64),
    Class(i64),
}

impl Default for Prediction {
    /// The actuator holds this value until the first real prediction arrives.
    fn default() -> Self {
        Prediction::Value(0.0)
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Value(v) => write!(f, "{v}"),
            Prediction::Class(c) => write!(f, "{c}"),
        }
    }
}

/// Line-oriented input device delivering textual sensor frames.
pub trait SensorPort {
    /// Read the next complete line, without its terminator.
    ///
    /// `Ok(None)` means nothing complete arrived within the port's own read
    /// timeout; that is a normal outcome. `Err` means the device is gone.
    fn read_line(&mut self) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>>;
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Line-oriented output device accepting actuator commands.
pub trait ActuatorPort {
    /// Write one already-terminated command line and flush it.
    fn write_line(&mut self, line: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Pretrained scorer: normalized feature vector in, scalar prediction out.
///
/// Implementations are loaded once, never mutated, and must be cheap enough
/// to run well inside one sampling period.
pub trait Oracle: Send + Sync {
    fn predict(&self, features: &[f64]) -> Prediction;

    /// Number of features the model was trained on, when known.
    fn input_width(&self) -> Option<usize> {
        None
    }
}

impl<T: SensorPort + ?Sized> SensorPort for Box<T> {
    fn read_line(&mut self) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_line()
    }
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).close()
    }
}

impl<T: ActuatorPort + ?Sized> ActuatorPort for Box<T> {
    fn write_line(&mut self, line: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write_line(line)
    }
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).close()
    }
}
