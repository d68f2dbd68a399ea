/// Longest line kept while waiting for a terminator; anything longer is noise.
pub const DEFAULT_MAX_LINE: usize = 512;

/// Reassembles newline-terminated text lines from arbitrarily chunked reads.
///
/// Serial reads return whatever bytes happen to be buffered, so a frame can
/// straddle two reads. Partial data is held until its `\n` arrives; a trailing
/// `\r` is stripped and invalid UTF-8 is replaced rather than rejected.
#[derive(Debug)]
pub struct LineFramer {
    pending: Vec<u8>,
    max_line: usize,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE)
    }
}

impl LineFramer {
    pub fn new(max_line: usize) -> Self {
        Self {
            pending: Vec::with_capacity(max_line.max(1)),
            max_line: max_line.max(1),
        }
    }

    /// Append freshly read bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        // A run this long without a newline is a garbled stream; resync on the next '\n'.
        if self.pending.len() > self.max_line && !self.pending.contains(&b'\n') {
            tracing::trace!(dropped = self.pending.len(), "line framer overflow");
            self.pending.clear();
        }
    }

    /// Pop the oldest complete line, if any.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Bytes received after the last complete line.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
