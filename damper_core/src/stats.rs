//! Per-task counters reported when a run ends.
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    /// Lines that parsed into a frame and were logged.
    pub frames: u64,
    /// Lines that did not parse.
    pub discarded: u64,
    /// Reads that returned nothing within the port timeout.
    pub empty_reads: u64,
    pub inferences: u64,
    /// Predictions lost to a full channel under drop-newest.
    pub dropped: u64,
    /// Queued predictions displaced under drop-oldest.
    pub evicted: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuationStats {
    pub transmissions: u64,
    /// Predictions taken off the channel.
    pub consumed: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub acquisition: AcquisitionStats,
    pub actuation: ActuationStats,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Accepted frames per second of wall time.
    pub fn sample_rate_hz(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.acquisition.frames as f64 / secs
        } else {
            0.0
        }
    }
}
