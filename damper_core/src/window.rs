//! Fixed-capacity ring of the most recent axis readings.

/// Circular buffer holding the last W values of the monitored axis.
///
/// Storage starts zeroed; `is_filled()` turns true the first time the write
/// cursor wraps, after which every insert evicts exactly the oldest value.
#[derive(Debug, Clone)]
pub struct WindowBuffer {
    buf: Vec<f64>,
    cursor: usize,
    filled: bool,
    insertions: u64,
}

impl WindowBuffer {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "window capacity must be > 0");
        Self {
            buf: vec![0.0; capacity.max(1)],
            cursor: 0,
            filled: false,
            insertions: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.filled
    }

    /// Total values inserted since construction.
    #[inline]
    pub fn insertions(&self) -> u64 {
        self.insertions
    }

    /// Values inserted after the insert that filled the window; `None` while filling.
    #[inline]
    pub fn insertions_past_fill(&self) -> Option<u64> {
        self.filled
            .then(|| self.insertions.saturating_sub(self.buf.len() as u64))
    }

    pub fn insert(&mut self, value: f64) {
        self.buf[self.cursor] = value;
        self.cursor = (self.cursor + 1) % self.buf.len();
        if self.cursor == 0 {
            self.filled = true;
        }
        self.insertions = self.insertions.saturating_add(1);
    }

    /// Copy the window into `out`, oldest first.
    pub fn snapshot_into(&self, out: &mut Vec<f64>) {
        out.clear();
        out.extend_from_slice(&self.buf[self.cursor..]);
        out.extend_from_slice(&self.buf[..self.cursor]);
    }

    /// The window, oldest first.
    pub fn snapshot(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.buf.len());
        self.snapshot_into(&mut out);
        out
    }
}
