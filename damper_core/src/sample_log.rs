//! Append-only CSV log of accepted samples.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::DamperError;
use crate::frame::Sample;

pub const HEADER: [&str; 4] = ["elapsed_sec", "raw_x", "raw_y", "raw_z"];

/// CSV writer that flushes every `flush_every` records and once more on close.
pub struct SampleLogger<W: Write> {
    wtr: csv::Writer<W>,
    flush_every: usize,
    since_flush: usize,
    records: u64,
}

impl<W: Write> std::fmt::Debug for SampleLogger<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleLogger")
            .field("flush_every", &self.flush_every)
            .field("records", &self.records)
            .finish()
    }
}

fn log_err(e: impl std::fmt::Display) -> DamperError {
    DamperError::Log(e.to_string())
}

impl SampleLogger<BufWriter<File>> {
    /// Create (truncate) the log file at `path` and write the header.
    pub fn create(path: &Path, flush_every: usize) -> Result<Self, DamperError> {
        let file = File::create(path)
            .map_err(|e| DamperError::Log(format!("create {}: {e}", path.display())))?;
        Self::new(BufWriter::new(file), flush_every)
    }
}

impl<W: Write> SampleLogger<W> {
    /// Wrap `inner` and write the header row immediately.
    pub fn new(inner: W, flush_every: usize) -> Result<Self, DamperError> {
        let mut wtr = csv::Writer::from_writer(inner);
        wtr.write_record(HEADER).map_err(log_err)?;
        wtr.flush().map_err(log_err)?;
        Ok(Self {
            wtr,
            flush_every: flush_every.max(1),
            since_flush: 0,
            records: 0,
        })
    }

    pub fn append(&mut self, s: &Sample) -> Result<(), DamperError> {
        self.wtr
            .write_record([
                format!("{:.3}", s.elapsed_s),
                s.x.to_string(),
                s.y.to_string(),
                s.z.to_string(),
            ])
            .map_err(log_err)?;
        self.records += 1;
        self.since_flush += 1;
        if self.since_flush >= self.flush_every {
            self.wtr.flush().map_err(log_err)?;
            self.since_flush = 0;
        }
        Ok(())
    }

    /// Records appended so far, header excluded.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Flush and hand back the underlying writer.
    pub fn close(self) -> Result<W, DamperError> {
        self.wtr.into_inner().map_err(|e| log_err(e.error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64, z: f64) -> Sample {
        Sample {
            elapsed_s: t,
            x: -0.12,
            y: 0.003,
            z,
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let mut log = SampleLogger::new(Vec::new(), 20).unwrap();
        log.append(&sample(0.0104, 0.998)).unwrap();
        log.append(&sample(1.5, -1.0)).unwrap();
        assert_eq!(log.records(), 2);
        let out = String::from_utf8(log.close().unwrap()).unwrap();
        assert_eq!(
            out,
            "elapsed_sec,raw_x,raw_y,raw_z\n0.010,-0.12,0.003,0.998\n1.500,-0.12,0.003,-1\n"
        );
    }
}
