pub mod error;
pub mod util;

#[cfg(feature = "hardware")]
pub mod serial;

use damper_traits::{ActuatorPort, SensorPort};
use error::HwError;

/// Port name that selects the simulated backends instead of a serial device.
pub const SIM_PORT: &str = "sim";

/// Simulated IMU emitting frames in the same text layout as the real board.
///
/// The Z axis carries gravity plus a 12 Hz vibration with a weaker 31 Hz
/// harmonic; X and Y carry smaller, phase-shifted components. Every
/// `garble_every`-th line is truncated the way a serial line buffer cuts a
/// frame, so downstream parsing sees realistic noise.
pub struct SimulatedSensor {
    seq: u64,
    dt_s: f64,
    garble_every: u64,
    closed: bool,
}

impl SimulatedSensor {
    pub fn new(sample_period: std::time::Duration) -> Self {
        Self {
            seq: 0,
            dt_s: sample_period.as_secs_f64(),
            garble_every: 97,
            closed: false,
        }
    }

    /// Change how often a truncated frame is produced (0 disables).
    pub fn with_garble_every(mut self, n: u64) -> Self {
        self.garble_every = n;
        self
    }

    fn frame(&self, t: f64) -> String {
        use std::f64::consts::TAU;
        let z = 1.0 + 0.08 * (TAU * 12.0 * t).sin() + 0.02 * (TAU * 31.0 * t).sin();
        let x = 0.03 * (TAU * 12.0 * t + 0.7).sin();
        let y = 0.01 * (TAU * 12.0 * t + 1.9).cos();
        format!("Time: {t:.3} | Raw: X = {x:.4}, Y = {y:.4}, Z = {z:.4}")
    }
}

impl SensorPort for SimulatedSensor {
    fn read_line(&mut self) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        if self.closed {
            return Err(Box::new(HwError::Closed("sensor")));
        }
        self.seq += 1;
        let t = self.seq as f64 * self.dt_s;
        let line = self.frame(t);
        if self.garble_every > 0 && self.seq % self.garble_every == 0 {
            let cut = line.len() / 2;
            return Ok(Some(line[..cut].to_string()));
        }
        Ok(Some(line))
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.closed {
            return Err(Box::new(HwError::Closed("sensor")));
        }
        self.closed = true;
        tracing::debug!(frames = self.seq, "simulated sensor closed");
        Ok(())
    }
}

/// Simulated actuator that accepts command lines and remembers the last one.
#[derive(Debug, Default)]
pub struct SimulatedActuator {
    sent: u64,
    last: Option<String>,
    closed: bool,
}

impl SimulatedActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn last_line(&self) -> Option<&str> {
        self.last.as_deref()
    }
}

impl ActuatorPort for SimulatedActuator {
    fn write_line(&mut self, line: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.closed {
            return Err(Box::new(HwError::Closed("actuator")));
        }
        self.sent += 1;
        tracing::trace!(command = line.trim_end(), "actuator command (simulated)");
        self.last = Some(line.to_string());
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.closed {
            return Err(Box::new(HwError::Closed("actuator")));
        }
        self.closed = true;
        tracing::debug!(sent = self.sent, "simulated actuator closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn simulated_sensor_emits_frame_layout() {
        let mut sensor = SimulatedSensor::new(Duration::from_millis(10)).with_garble_every(0);
        let line = sensor.read_line().unwrap().unwrap();
        assert!(line.starts_with("Time: 0.010 | Raw: X = "), "{line}");
        assert!(line.contains(", Z = "));
    }

    #[test]
    fn simulated_sensor_garbles_periodically() {
        let mut sensor = SimulatedSensor::new(Duration::from_millis(10)).with_garble_every(3);
        let lines: Vec<String> = (0..3).map(|_| sensor.read_line().unwrap().unwrap()).collect();
        assert!(lines[0].contains("Z = "));
        assert!(!lines[2].contains("Z = "));
    }

    #[test]
    fn simulated_devices_reject_use_after_close() {
        let mut sensor = SimulatedSensor::new(Duration::from_millis(10));
        sensor.close().unwrap();
        assert!(sensor.read_line().is_err());
        assert!(sensor.close().is_err());

        let mut motor = SimulatedActuator::new();
        motor.write_line("0.5\n").unwrap();
        assert_eq!(motor.sent(), 1);
        assert_eq!(motor.last_line(), Some("0.5\n"));
        motor.close().unwrap();
        assert!(motor.write_line("0.5\n").is_err());
    }
}
