//! Throughput arithmetic shared by both sides.

use std::fmt;
use std::time::Duration;

/// Bytes per second for `bytes` moved in `elapsed`.
///
/// A zero `elapsed` (a transfer that completed below clock resolution)
/// returns `f64::INFINITY` rather than dividing by zero.
pub fn throughput(bytes: u64, elapsed: Duration) -> f64 {
    if elapsed.is_zero() {
        return f64::INFINITY;
    }
    bytes as f64 / elapsed.as_secs_f64()
}

/// Outcome of the timed data phase on either side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferResult {
    /// Bytes accepted by the stream (sender) or returned by reads (receiver).
    pub bytes_transferred: u64,
    /// Wall-clock span of the data phase only.
    pub elapsed: Duration,
    /// `bytes_transferred / elapsed`, see [`throughput`].
    pub bytes_per_sec: f64,
}

impl TransferResult {
    /// Builds the result for a finished data phase.
    pub fn new(bytes_transferred: u64, elapsed: Duration) -> Self {
        Self {
            bytes_transferred,
            elapsed,
            bytes_per_sec: throughput(bytes_transferred, elapsed),
        }
    }

    /// Throughput in KiB per second, the unit reports are printed in.
    pub fn kib_per_sec(&self) -> f64 {
        self.bytes_per_sec / 1024.0
    }
}

impl fmt::Display for TransferResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes in {:.6} seconds ({:.2} KB/s)",
            self.bytes_transferred,
            self.elapsed.as_secs_f64(),
            self.kib_per_sec()
        )
    }
}
