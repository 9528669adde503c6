//! Scripted in-memory connections.
//!
//! `MockConnection` lets the sender and receiver be driven without sockets:
//! individual write and read calls can be scripted to return short counts or
//! errors, and every call is recorded in a shared [`MockStats`] that stays
//! readable after the connection has been moved into (and closed by) a run.
//!
//! # Example
//!
//! ```rust,ignore
//! let conn = MockConnection::new().with_write_script([Ok(512), Ok(512)]);
//! let stats = conn.stats();
//! sender::run(conn, &config)?;
//! assert_eq!(stats.borrow().write_calls, 2);
//! ```

use std::cell::{Cell, RefCell};
use std::cmp;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use crate::connection::{Connection, Listener};

/// Everything a `MockConnection` observed.
#[derive(Debug, Default)]
pub struct MockStats {
    /// Number of `write` calls, including failed ones.
    pub write_calls: usize,
    /// Number of `read` calls, including failed ones.
    pub read_calls: usize,
    /// Bytes accepted across all writes.
    pub bytes_written: u64,
    /// Bytes accepted across all writes, in order.
    pub written: Vec<u8>,
    /// `shutdown_write` was called.
    pub half_closed: bool,
    /// `close` was called.
    pub closed: bool,
}

/// Shared handle to a connection's stats.
pub type StatsHandle = Rc<RefCell<MockStats>>;

/// In-memory connection with scriptable I/O results.
///
/// Reads are served from the script when one is set (each `Ok(n)` yields `n`
/// filler bytes, an exhausted script yields EOF), otherwise from the incoming
/// buffer. Writes consume the write script first and then accept up to
/// `max_write` bytes per call.
#[derive(Debug, Default)]
pub struct MockConnection {
    incoming: Vec<u8>,
    pos: usize,
    reads: Option<VecDeque<io::Result<usize>>>,
    writes: VecDeque<io::Result<usize>>,
    max_write: Option<usize>,
    shutdown_error: Option<io::Error>,
    stats: StatsHandle,
}

impl MockConnection {
    /// Creates a connection with nothing to read that accepts every write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves reads from `data`, then EOF.
    pub fn with_incoming(mut self, data: Vec<u8>) -> Self {
        self.incoming = data;
        self.pos = 0;
        self
    }

    /// Scripts the result of successive reads.
    pub fn with_read_script(
        mut self,
        script: impl IntoIterator<Item = io::Result<usize>>,
    ) -> Self {
        self.reads = Some(script.into_iter().collect());
        self
    }

    /// Scripts the result of successive writes.
    pub fn with_write_script(
        mut self,
        script: impl IntoIterator<Item = io::Result<usize>>,
    ) -> Self {
        self.writes = script.into_iter().collect();
        self
    }

    /// Caps the bytes accepted by each unscripted write.
    pub fn with_max_write(mut self, max: usize) -> Self {
        self.max_write = Some(max);
        self
    }

    /// Fails the first `shutdown_write` with `err`.
    pub fn with_shutdown_error(mut self, err: io::Error) -> Self {
        self.shutdown_error = Some(err);
        self
    }

    /// Returns a handle to this connection's stats.
    pub fn stats(&self) -> StatsHandle {
        Rc::clone(&self.stats)
    }
}

impl Connection for MockConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut stats = self.stats.borrow_mut();
        stats.write_calls += 1;
        if stats.half_closed {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write after shutdown",
            ));
        }

        let limit = match self.writes.pop_front() {
            Some(Ok(n)) => n,
            Some(Err(e)) => return Err(e),
            None => self.max_write.unwrap_or(usize::MAX),
        };
        let n = cmp::min(limit, buf.len());
        stats.bytes_written += n as u64;
        stats.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stats.borrow_mut().read_calls += 1;

        if let Some(script) = self.reads.as_mut() {
            return match script.pop_front() {
                Some(Ok(n)) => {
                    let n = cmp::min(n, buf.len());
                    buf[..n].fill(crate::FILL_BYTE);
                    Ok(n)
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            };
        }

        let n = cmp::min(buf.len(), self.incoming.len() - self.pos);
        buf[..n].copy_from_slice(&self.incoming[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn shutdown_write(&mut self) -> io::Result<()> {
        if let Some(e) = self.shutdown_error.take() {
            return Err(e);
        }
        self.stats.borrow_mut().half_closed = true;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.stats.borrow_mut().closed = true;
        Ok(())
    }
}

/// Listener that hands out a single prepared `MockConnection`.
#[derive(Debug)]
pub struct MockListener {
    conn: Option<io::Result<MockConnection>>,
    dropped: Rc<Cell<bool>>,
}

impl MockListener {
    /// Accepts `conn` once.
    pub fn new(conn: MockConnection) -> Self {
        Self {
            conn: Some(Ok(conn)),
            dropped: Rc::new(Cell::new(false)),
        }
    }

    /// Fails the first accept with `err`.
    pub fn failing(err: io::Error) -> Self {
        Self {
            conn: Some(Err(err)),
            dropped: Rc::new(Cell::new(false)),
        }
    }

    /// Flag set once the listener has been dropped.
    pub fn dropped(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.dropped)
    }
}

impl Listener for MockListener {
    type Conn = MockConnection;

    fn accept(&mut self) -> io::Result<(MockConnection, String)> {
        match self.conn.take() {
            Some(Ok(conn)) => Ok((conn, "mock-peer".to_string())),
            Some(Err(e)) => Err(e),
            None => Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "mock listener already accepted",
            )),
        }
    }
}

impl Drop for MockListener {
    fn drop(&mut self) {
        self.dropped.set(true);
    }
}
