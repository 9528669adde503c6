//! Receiving side of a benchmark run.
//!
//! The receiver accepts exactly one connection, reads it to end of stream,
//! writes the acknowledgment and closes. Serving several transfers is done by
//! calling [`serve`] again on a fresh listener.

use std::io;
use std::time::Instant;

use log::{debug, info, warn};

use crate::config::TransferConfig;
use crate::connection::{Closing, Connection, Listener};
use crate::error::{Error, Phase, Result};
use crate::throughput::TransferResult;
use crate::ACK;

/// Outcome of a receiver run.
#[derive(Debug)]
pub struct ReceiveReport {
    /// Printable address of the sender.
    pub peer: String,
    /// Measured data phase.
    pub result: TransferResult,
    /// Set when writing the acknowledgment failed. `result` stays valid.
    pub ack_error: Option<io::Error>,
}

/// Accepts one connection from `listener` and runs the receiving side on it.
///
/// Both the accepted connection and the listener are closed before
/// returning.
pub fn serve<L: Listener>(mut listener: L, config: &TransferConfig) -> Result<ReceiveReport> {
    let (conn, peer) = listener.accept().map_err(Error::Accept)?;
    info!("Connected by {}", peer);

    run(conn, peer, config)
}

/// Drains `conn`, acknowledges, and closes it.
pub fn run<C: Connection>(
    conn: C,
    peer: String,
    config: &TransferConfig,
) -> Result<ReceiveReport> {
    let mut conn = Closing::new(conn);
    config.validate()?;

    let result = drain(&mut *conn, config)?;
    if result.bytes_transferred != config.total_bytes() {
        warn!(
            "Received {} bytes from {}, configured transfer is {} bytes",
            result.bytes_transferred,
            peer,
            config.total_bytes()
        );
    }

    let ack_error = match conn.send_all(ACK) {
        Ok(()) => {
            debug!("Acknowledgment sent to {}", peer);
            None
        }
        Err(e) => {
            warn!("Failed to send acknowledgment to {}: {}", peer, e);
            Some(e)
        }
    };

    Ok(ReceiveReport {
        peer,
        result,
        ack_error,
    })
}

/// Reads `conn` until a zero-length read, summing what each read returned.
///
/// A read error also ends the loop unless `config.strict_eof` is set, in
/// which case it is returned as an `Io` error in the receiving phase.
pub fn drain<C>(conn: &mut C, config: &TransferConfig) -> Result<TransferResult>
where
    C: Connection + ?Sized,
{
    let mut buf = vec![0u8; config.recv_chunk_size];
    let mut total: u64 = 0;
    let mut reads: u64 = 0;

    let start = Instant::now();
    loop {
        reads += 1;
        match conn.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => total += n as u64,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if config.strict_eof => return Err(Error::io(Phase::Receiving, e)),
            Err(e) => {
                warn!(
                    "Read failed after {} bytes, treating it as end of stream: {}",
                    total, e
                );
                break;
            }
        }
    }
    let result = TransferResult::new(total, start.elapsed());

    debug!("Stream drained: {} bytes in {} reads", total, reads);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockConnection, MockListener};

    fn small() -> TransferConfig {
        TransferConfig::new()
            .with_block_size(4096)
            .with_block_count(2)
    }

    #[test]
    fn test_drain_until_zero_read() {
        let conn = MockConnection::new().with_read_script([Ok(4096), Ok(4096), Ok(0)]);
        let stats = conn.stats();

        let report = run(conn, "peer".into(), &small()).unwrap();

        assert_eq!(report.result.bytes_transferred, 8192);
        assert_eq!(stats.borrow().read_calls, 3);
    }

    #[test]
    fn test_drain_stops_at_first_eof() {
        let script = std::iter::repeat_with(|| Ok(1))
            .take(1000)
            .chain([Ok(0), Ok(5), Ok(5)]);
        let mut conn = MockConnection::new().with_read_script(script);
        let stats = conn.stats();

        let result = drain(&mut conn, &TransferConfig::new()).unwrap();

        assert_eq!(result.bytes_transferred, 1000);
        assert_eq!(stats.borrow().read_calls, 1001);
    }

    #[test]
    fn test_reads_are_bounded_by_chunk_size() {
        let config = TransferConfig::new().with_recv_chunk_size(100);
        let mut conn = MockConnection::new().with_incoming(vec![0xAB; 1050]);
        let stats = conn.stats();

        let result = drain(&mut conn, &config).unwrap();

        assert_eq!(result.bytes_transferred, 1050);
        // 10 full reads, one of 50 bytes, one returning 0.
        assert_eq!(stats.borrow().read_calls, 12);
    }

    #[test]
    fn test_read_error_ends_stream_by_default() {
        let conn = MockConnection::new().with_read_script([
            Ok(4096),
            Ok(100),
            Err(io::Error::from(io::ErrorKind::ConnectionReset)),
        ]);
        let stats = conn.stats();

        let report = run(conn, "peer".into(), &small()).unwrap();

        assert_eq!(report.result.bytes_transferred, 4196);
        assert_eq!(stats.borrow().read_calls, 3);
        assert_eq!(stats.borrow().written, ACK);
    }

    #[test]
    fn test_read_error_fails_when_strict() {
        let config = small().with_strict_eof(true);
        let conn = MockConnection::new().with_read_script([
            Ok(4096),
            Err(io::Error::from(io::ErrorKind::ConnectionReset)),
        ]);
        let stats = conn.stats();

        let err = run(conn, "peer".into(), &config).unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Receiving));
        assert!(stats.borrow().closed);
        assert_eq!(stats.borrow().write_calls, 0);
    }

    #[test]
    fn test_interrupted_read_is_retried() {
        let mut conn = MockConnection::new().with_read_script([
            Err(io::Error::from(io::ErrorKind::Interrupted)),
            Ok(10),
            Ok(0),
        ]);

        let result = drain(&mut conn, &small().with_strict_eof(true)).unwrap();
        assert_eq!(result.bytes_transferred, 10);
    }

    #[test]
    fn test_ack_sent_after_drain() {
        let conn = MockConnection::new()
            .with_incoming(vec![b'a'; 8192])
            .with_max_write(2);
        let stats = conn.stats();

        let report = run(conn, "peer".into(), &small()).unwrap();

        assert!(report.ack_error.is_none());
        let stats = stats.borrow();
        assert_eq!(stats.written, ACK);
        assert_eq!(stats.write_calls, 2);
        assert!(stats.closed);
    }

    #[test]
    fn test_ack_failure_keeps_result() {
        let conn = MockConnection::new()
            .with_read_script([Ok(4096), Ok(4096), Ok(0)])
            .with_write_script([Err(io::Error::from(io::ErrorKind::BrokenPipe))]);
        let stats = conn.stats();

        let report = run(conn, "peer".into(), &small()).unwrap();

        assert_eq!(
            report.ack_error.map(|e| e.kind()),
            Some(io::ErrorKind::BrokenPipe)
        );
        assert_eq!(report.result.bytes_transferred, 8192);
        assert!(stats.borrow().closed);
    }

    #[test]
    fn test_mismatched_total_still_terminates() {
        let conn = MockConnection::new().with_incoming(vec![b'a'; 5000]);

        let report = run(conn, "peer".into(), &small()).unwrap();
        assert_eq!(report.result.bytes_transferred, 5000);
    }

    #[test]
    fn test_serve_accepts_once_and_releases() {
        let conn = MockConnection::new().with_incoming(vec![b'a'; 8192]);
        let stats = conn.stats();
        let listener = MockListener::new(conn);
        let dropped = listener.dropped();

        let report = serve(listener, &small()).unwrap();

        assert_eq!(report.peer, "mock-peer");
        assert_eq!(report.result.bytes_transferred, 8192);
        assert!(stats.borrow().closed);
        assert!(dropped.get());
    }

    #[test]
    fn test_serve_accept_failure() {
        let listener =
            MockListener::failing(io::Error::from(io::ErrorKind::ConnectionAborted));
        let dropped = listener.dropped();

        assert!(matches!(serve(listener, &small()), Err(Error::Accept(_))));
        assert!(dropped.get());
    }

    #[test]
    fn test_serve_invalid_config_releases_connection() {
        let conn = MockConnection::new().with_incoming(vec![b'a'; 16]);
        let stats = conn.stats();
        let listener = MockListener::new(conn);
        let dropped = listener.dropped();

        let config = small().with_recv_chunk_size(0);
        assert!(matches!(serve(listener, &config), Err(Error::InvalidConfig(_))));
        assert!(stats.borrow().closed);
        assert_eq!(stats.borrow().read_calls, 0);
        assert!(dropped.get());
    }
}
