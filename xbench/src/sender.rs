//! Sending side of a benchmark run.
//!
//! The sender writes `block_count` blocks over one connection, half-closes
//! its write side to mark the end of the payload, and then waits for the
//! receiver's acknowledgment.
//!
//! The clock runs from just before the first write until the half-close
//! returns. Waiting for the acknowledgment is excluded so the figure is
//! comparable with the receiver's, whose clock stops at end of stream.

use std::io;
use std::time::Instant;

use log::{debug, info, trace, warn};

use crate::config::TransferConfig;
use crate::connection::{Closing, Connection};
use crate::error::{AckMissing, Error, Phase, Result};
use crate::throughput::TransferResult;
use crate::ACK_BUF_SIZE;

/// Bytes the receiver sent back after draining the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment(Vec<u8>);

impl Acknowledgment {
    /// Raw acknowledgment bytes. Never empty.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Outcome of a sender run.
#[derive(Debug)]
pub struct SendReport {
    /// Measured data phase.
    pub result: TransferResult,
    /// Acknowledgment status. A missing ack does not invalidate `result`.
    pub ack: std::result::Result<Acknowledgment, AckMissing>,
}

/// Runs the sending side over `conn`.
///
/// `conn` is closed before returning, whether the run succeeded or not.
pub fn run<C: Connection>(conn: C, config: &TransferConfig) -> Result<SendReport> {
    let mut conn = Closing::new(conn);
    config.validate()?;

    let block = config.block()?;
    info!(
        "Sending {} blocks of {} bytes ({} bytes total)",
        config.block_count,
        config.block_size,
        config.total_bytes()
    );

    let start = Instant::now();
    let sent = send_blocks(&mut *conn, &block, config.block_count)?;
    conn.shutdown_write()
        .map_err(|e| Error::io(Phase::HalfClose, e))?;
    let result = TransferResult::new(sent, start.elapsed());
    debug!("Write side shut down after {} bytes", sent);

    let ack = await_ack(&mut *conn);
    match &ack {
        Ok(ack) => info!(
            "Received acknowledgment: {}",
            String::from_utf8_lossy(ack.as_bytes())
        ),
        Err(e) => warn!("{}", e),
    }

    Ok(SendReport { result, ack })
}

/// Writes `count` copies of `block`, returning the bytes sent.
///
/// A block is only counted once every byte of it has been accepted; the
/// first write error aborts the loop.
pub fn send_blocks<C>(conn: &mut C, block: &[u8], count: usize) -> Result<u64>
where
    C: Connection + ?Sized,
{
    let mut sent: u64 = 0;
    for i in 0..count {
        conn.send_all(block)
            .map_err(|e| Error::io(Phase::Sending, e))?;
        sent += block.len() as u64;
        trace!("Sent block {}/{}", i + 1, count);
    }
    Ok(sent)
}

/// Reads the receiver's acknowledgment with one bounded read.
///
/// Any non-empty read counts; the content is not checked.
pub fn await_ack<C>(conn: &mut C) -> std::result::Result<Acknowledgment, AckMissing>
where
    C: Connection + ?Sized,
{
    let mut buf = [0u8; ACK_BUF_SIZE];
    loop {
        match conn.read(&mut buf) {
            Ok(0) => return Err(AckMissing::Eof),
            Ok(n) => return Ok(Acknowledgment(buf[..n].to_vec())),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(AckMissing::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockConnection;
    use crate::{ACK, FILL_BYTE};

    fn acking() -> MockConnection {
        MockConnection::new().with_incoming(ACK.to_vec())
    }

    #[test]
    fn test_short_writes_complete_block() {
        let config = TransferConfig::new()
            .with_block_size(1024)
            .with_block_count(1);
        let conn = acking().with_write_script([Ok(512), Ok(512)]);
        let stats = conn.stats();

        let report = run(conn, &config).unwrap();

        assert_eq!(stats.borrow().write_calls, 2);
        assert_eq!(stats.borrow().bytes_written, 1024);
        assert_eq!(report.result.bytes_transferred, 1024);
    }

    #[test]
    fn test_short_write_never_crosses_block_boundary() {
        let config = TransferConfig::new()
            .with_block_size(10)
            .with_block_count(2);
        // The fourth write is offered only the last byte of block 0.
        let conn = acking().with_write_script([Ok(3), Ok(3), Ok(3), Ok(3), Ok(10)]);
        let stats = conn.stats();

        run(conn, &config).unwrap();

        assert_eq!(stats.borrow().write_calls, 5);
        assert_eq!(stats.borrow().bytes_written, 20);
    }

    #[test]
    fn test_capped_writes_send_every_byte() {
        let config = TransferConfig::new()
            .with_block_size(100)
            .with_block_count(3);
        let conn = acking().with_max_write(7);
        let stats = conn.stats();

        let report = run(conn, &config).unwrap();

        let stats = stats.borrow();
        assert_eq!(stats.write_calls, 3 * 15);
        assert_eq!(stats.written.len(), 300);
        assert!(stats.written.iter().all(|&b| b == FILL_BYTE));
        assert_eq!(report.result.bytes_transferred, 300);
    }

    #[test]
    fn test_half_close_then_ack() {
        let config = TransferConfig::new()
            .with_block_size(64)
            .with_block_count(4);
        let conn = acking();
        let stats = conn.stats();

        let report = run(conn, &config).unwrap();

        assert_eq!(report.ack.unwrap().as_bytes(), ACK);
        assert!(stats.borrow().half_closed);
        assert!(stats.borrow().closed);
        assert_eq!(stats.borrow().read_calls, 1);
    }

    #[test]
    fn test_write_error_aborts_and_closes() {
        let config = TransferConfig::new()
            .with_block_size(100)
            .with_block_count(5);
        let conn = acking().with_write_script([
            Ok(100),
            Ok(40),
            Err(io::Error::from(io::ErrorKind::ConnectionReset)),
        ]);
        let stats = conn.stats();

        let err = run(conn, &config).unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Sending));
        let stats = stats.borrow();
        assert_eq!(stats.write_calls, 3);
        assert!(!stats.half_closed);
        assert!(stats.closed);
        assert_eq!(stats.read_calls, 0);
    }

    #[test]
    fn test_zero_length_write_is_an_error() {
        let config = TransferConfig::new()
            .with_block_size(16)
            .with_block_count(1);
        let conn = acking().with_write_script([Ok(0)]);

        match run(conn, &config) {
            Err(Error::Io { phase, source }) => {
                assert_eq!(phase, Phase::Sending);
                assert_eq!(source.kind(), io::ErrorKind::WriteZero);
            }
            other => panic!("expected write-zero error, got {:?}", other),
        }
    }

    #[test]
    fn test_interrupted_write_is_retried() {
        let config = TransferConfig::new()
            .with_block_size(1024)
            .with_block_count(1);
        let conn =
            acking().with_write_script([Err(io::Error::from(io::ErrorKind::Interrupted))]);
        let stats = conn.stats();

        run(conn, &config).unwrap();

        assert_eq!(stats.borrow().write_calls, 2);
        assert_eq!(stats.borrow().bytes_written, 1024);
    }

    #[test]
    fn test_missing_ack_keeps_result() {
        let config = TransferConfig::new()
            .with_block_size(256)
            .with_block_count(8);

        let report = run(MockConnection::new(), &config).unwrap();
        assert!(matches!(report.ack, Err(AckMissing::Eof)));
        assert_eq!(report.result.bytes_transferred, 2048);

        let conn = MockConnection::new()
            .with_read_script([Err(io::Error::from(io::ErrorKind::ConnectionReset))]);
        let stats = conn.stats();
        let report = run(conn, &config).unwrap();
        assert!(matches!(report.ack, Err(AckMissing::Io(_))));
        assert_eq!(report.result.bytes_transferred, 2048);
        assert!(stats.borrow().closed);
    }

    #[test]
    fn test_zero_blocks_still_half_closes() {
        let config = TransferConfig::new().with_block_count(0);
        let conn = acking();
        let stats = conn.stats();

        let report = run(conn, &config).unwrap();

        assert_eq!(report.result.bytes_transferred, 0);
        assert_eq!(stats.borrow().write_calls, 0);
        assert!(stats.borrow().half_closed);
    }

    #[test]
    fn test_invalid_config_closes_connection() {
        let config = TransferConfig::new().with_block_size(0);
        let conn = acking();
        let stats = conn.stats();

        assert!(matches!(run(conn, &config), Err(Error::InvalidConfig(_))));
        assert!(stats.borrow().closed);
        assert_eq!(stats.borrow().write_calls, 0);
    }

    #[test]
    fn test_oversized_block_is_rejected_without_panicking() {
        let config = TransferConfig::new()
            .with_block_size(usize::MAX)
            .with_block_count(0);
        let conn = acking();
        let stats = conn.stats();

        assert!(matches!(run(conn, &config), Err(Error::InvalidConfig(_))));
        assert!(stats.borrow().closed);
        assert!(!stats.borrow().half_closed);
    }

    #[test]
    fn test_half_close_failure() {
        let config = TransferConfig::new()
            .with_block_size(128)
            .with_block_count(2);
        let conn =
            acking().with_shutdown_error(io::Error::from(io::ErrorKind::NotConnected));
        let stats = conn.stats();

        match run(conn, &config) {
            Err(Error::Io { phase, source }) => {
                assert_eq!(phase, Phase::HalfClose);
                assert_eq!(source.kind(), io::ErrorKind::NotConnected);
            }
            other => panic!("expected half-close error, got {:?}", other),
        }
        let stats = stats.borrow();
        assert_eq!(stats.bytes_written, 256);
        assert!(stats.closed);
        assert_eq!(stats.read_calls, 0);
    }
}
