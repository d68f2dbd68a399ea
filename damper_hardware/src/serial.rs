use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use damper_traits::{ActuatorPort, SensorPort};
use tracing::{debug, trace};

use crate::error::{HwError, Result};
use crate::util::LineFramer;

fn open_port(path: &str, baud: u32, timeout: Duration) -> Result<Box<dyn serialport::SerialPort>> {
    serialport::new(path, baud)
        .timeout(timeout)
        .open()
        .map_err(|e| HwError::Serial(format!("open {path}: {e}")))
}

#[inline]
fn is_idle(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

/// IMU board on a serial line, read one text frame at a time.
pub struct SerialSensor {
    port: Option<Box<dyn serialport::SerialPort>>,
    framer: LineFramer,
    buf: [u8; 256],
}

impl SerialSensor {
    /// Open `path`; each read waits at most `read_timeout` for bytes.
    pub fn open(path: &str, baud: u32, read_timeout: Duration) -> Result<Self> {
        let port = open_port(path, baud, read_timeout)?;
        debug!(path, baud, "sensor port open");
        Ok(Self {
            port: Some(port),
            framer: LineFramer::default(),
            buf: [0; 256],
        })
    }
}

impl SensorPort for SerialSensor {
    fn read_line(&mut self) -> std::result::Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(line) = self.framer.next_line() {
            return Ok(Some(line));
        }
        let port = self.port.as_mut().ok_or(HwError::Closed("sensor"))?;
        match port.read(&mut self.buf) {
            Ok(0) => Ok(None),
            Ok(n) => {
                self.framer.push(&self.buf[..n]);
                Ok(self.framer.next_line())
            }
            Err(e) if is_idle(e.kind()) => {
                trace!(pending = self.framer.pending_len(), "sensor read idle");
                Ok(None)
            }
            Err(e) => Err(Box::new(HwError::Disconnected("sensor", e.to_string()))),
        }
    }

    fn close(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Dropping the handle releases the OS descriptor.
        match self.port.take() {
            Some(_) => Ok(()),
            None => Err(Box::new(HwError::Closed("sensor"))),
        }
    }
}

/// Motor controller on a serial line accepting one command per line.
pub struct SerialActuator {
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialActuator {
    pub fn open(path: &str, baud: u32, write_timeout: Duration) -> Result<Self> {
        let port = open_port(path, baud, write_timeout)?;
        debug!(path, baud, "actuator port open");
        Ok(Self { port: Some(port) })
    }
}

impl ActuatorPort for SerialActuator {
    fn write_line(&mut self, line: &str) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let port = self.port.as_mut().ok_or(HwError::Closed("actuator"))?;
        let res = port.write_all(line.as_bytes()).and_then(|()| port.flush());
        match res {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::TimedOut => Err(Box::new(HwError::WriteTimeout("actuator"))),
            Err(e) => Err(Box::new(HwError::Disconnected("actuator", e.to_string()))),
        }
    }

    fn close(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match self.port.take() {
            Some(mut p) => {
                let _ = p.flush();
                Ok(())
            }
            None => Err(Box::new(HwError::Closed("actuator"))),
        }
    }
}
