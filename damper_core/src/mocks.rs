//! Test and helper doubles for damper_core.
//!
//! All of them share an optional [`Journal`] so tests can assert on the
//! order in which resources were touched and closed.
use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use damper_traits::{ActuatorPort, Oracle, Prediction, SensorPort};

type BoxErr = Box<dyn std::error::Error + Send + Sync>;

/// Shared, ordered record of named events.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        if let Ok(mut v) = self.0.lock() {
            v.push(event.into());
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

/// Oracle that returns the same prediction for any input.
#[derive(Debug, Clone, Copy)]
pub struct FixedOracle(pub Prediction);

impl Oracle for FixedOracle {
    fn predict(&self, _features: &[f64]) -> Prediction {
        self.0
    }
}

/// Oracle whose n-th call returns `Value(n)`, starting at 1.
#[derive(Debug, Default)]
pub struct CountingOracle {
    calls: AtomicU64,
}

impl CountingOracle {
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Oracle for CountingOracle {
    fn predict(&self, _features: &[f64]) -> Prediction {
        let n = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        Prediction::Value(n as f64)
    }
}

/// One scripted outcome of `read_line`.
#[derive(Debug, Clone)]
pub enum Read {
    Line(String),
    Nothing,
    Fail(String),
}

/// Sensor that replays a script, then reports empty reads (or repeats its
/// last line, when built with `repeating`).
#[derive(Debug, Default)]
pub struct ScriptedSensor {
    script: VecDeque<Read>,
    repeat: Option<String>,
    closed: bool,
    journal: Option<Journal>,
}

impl ScriptedSensor {
    pub fn new(script: impl IntoIterator<Item = Read>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Sensor that yields `line` forever.
    pub fn repeating(line: impl Into<String>) -> Self {
        Self {
            repeat: Some(line.into()),
            ..Self::default()
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }
}

impl SensorPort for ScriptedSensor {
    fn read_line(&mut self) -> Result<Option<String>, BoxErr> {
        if self.closed {
            if let Some(j) = &self.journal {
                j.record("sensor.read_after_close");
            }
            return Err("sensor closed".into());
        }
        match self.script.pop_front() {
            Some(Read::Line(l)) => Ok(Some(l)),
            Some(Read::Nothing) => Ok(None),
            Some(Read::Fail(msg)) => Err(msg.into()),
            None => Ok(self.repeat.clone()),
        }
    }

    fn close(&mut self) -> Result<(), BoxErr> {
        self.closed = true;
        if let Some(j) = &self.journal {
            j.record("sensor.close");
        }
        Ok(())
    }
}

/// Actuator that stores every line it is sent.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    sent: Arc<Mutex<Vec<String>>>,
    fail_after: Option<usize>,
    journal: Option<Journal>,
    closed: bool,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write once `n` lines have been accepted.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Lines sent so far; shared between clones.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl ActuatorPort for RecordingActuator {
    fn write_line(&mut self, line: &str) -> Result<(), BoxErr> {
        if self.closed {
            if let Some(j) = &self.journal {
                j.record("actuator.write_after_close");
            }
            return Err("actuator closed".into());
        }
        let mut sent = self.sent.lock().map_err(|_| "actuator poisoned")?;
        if self.fail_after.is_some_and(|n| sent.len() >= n) {
            return Err("actuator link dropped".into());
        }
        sent.push(line.to_string());
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxErr> {
        self.closed = true;
        if let Some(j) = &self.journal {
            j.record("actuator.close");
        }
        Ok(())
    }
}

/// In-memory log sink that records `log.close` in a journal when dropped.
#[derive(Debug, Default)]
pub struct JournalWriter {
    buf: Arc<Mutex<Vec<u8>>>,
    journal: Option<Journal>,
}

impl JournalWriter {
    pub fn new(journal: Journal) -> Self {
        Self {
            buf: Arc::default(),
            journal: Some(journal),
        }
    }

    /// Handle to the bytes written, readable after the writer is gone.
    pub fn contents(&self) -> Arc<Mutex<Vec<u8>>> {
        self.buf.clone()
    }
}

impl Write for JournalWriter {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        let mut b = self
            .buf
            .lock()
            .map_err(|_| std::io::Error::other("log buffer poisoned"))?;
        b.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for JournalWriter {
    fn drop(&mut self) {
        if let Some(j) = &self.journal {
            j.record("log.close");
        }
    }
}
