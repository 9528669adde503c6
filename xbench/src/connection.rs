//! Stream connection abstraction.
//!
//! The benchmark only needs a blocking byte stream that can be half-closed.
//! This module provides the `Connection` and `Listener` traits the sender and
//! receiver are written against, plus implementations for the socket types
//! the client and server use.
//!
//! # Implementations
//!
//! - `TcpStream` / `TcpListener`
//! - `UnixStream` / `UnixListener`
//! - `VsockStream` / `VsockListener`
//! - [`crate::mock::MockConnection`]: scripted connection for tests

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::ops::{Deref, DerefMut};
use std::os::unix::net::{UnixListener, UnixStream};

use log::debug;
use vsock::{VsockListener, VsockStream};

/// Blocking byte stream between sender and receiver.
pub trait Connection {
    /// Writes some prefix of `buf`, returning how many bytes were accepted.
    ///
    /// A short write is not an error.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Reads up to `buf.len()` bytes. `Ok(0)` means the peer shut down its
    /// write side.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Shuts down the write direction, leaving reads open.
    fn shutdown_write(&mut self) -> io::Result<()>;

    /// Shuts down both directions.
    fn close(&mut self) -> io::Result<()>;

    /// Writes all of `buf`, issuing further writes for the unsent suffix
    /// after a short write.
    fn send_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "stream accepted zero bytes",
                    ));
                }
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// A bound socket that hands out connections.
pub trait Listener {
    /// Connection type produced by `accept`.
    type Conn: Connection;

    /// Blocks until one peer connects. Returns the connection and a printable
    /// peer address.
    fn accept(&mut self) -> io::Result<(Self::Conn, String)>;
}

macro_rules! impl_stream_connection {
    ($($stream:ty),*) => {
        $(
            impl Connection for $stream {
                fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                    Write::write(self, buf)
                }

                fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                    Read::read(self, buf)
                }

                fn shutdown_write(&mut self) -> io::Result<()> {
                    self.shutdown(Shutdown::Write)
                }

                fn close(&mut self) -> io::Result<()> {
                    self.shutdown(Shutdown::Both)
                }
            }
        )*
    };
}

impl_stream_connection!(TcpStream, UnixStream, VsockStream);

impl Listener for TcpListener {
    type Conn = TcpStream;

    fn accept(&mut self) -> io::Result<(TcpStream, String)> {
        let (stream, peer) = TcpListener::accept(self)?;
        Ok((stream, peer.to_string()))
    }
}

impl Listener for UnixListener {
    type Conn = UnixStream;

    fn accept(&mut self) -> io::Result<(UnixStream, String)> {
        let (stream, peer) = UnixListener::accept(self)?;
        let peer = match peer.as_pathname() {
            Some(path) => path.display().to_string(),
            None => "unnamed unix peer".to_string(),
        };
        Ok((stream, peer))
    }
}

impl Listener for VsockListener {
    type Conn = VsockStream;

    fn accept(&mut self) -> io::Result<(VsockStream, String)> {
        let (stream, peer) = VsockListener::accept(self)?;
        Ok((stream, format!("{:?}", peer)))
    }
}

/// Owns a connection and closes it when dropped, on success and error paths
/// alike.
pub(crate) struct Closing<C: Connection>(C);

impl<C: Connection> Closing<C> {
    pub(crate) fn new(conn: C) -> Self {
        Self(conn)
    }
}

impl<C: Connection> Deref for Closing<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.0
    }
}

impl<C: Connection> DerefMut for Closing<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.0
    }
}

impl<C: Connection> Drop for Closing<C> {
    fn drop(&mut self) {
        // The peer may already be gone; the descriptor is released either way.
        if let Err(e) = self.0.close() {
            debug!("Close after transfer returned: {}", e);
        }
    }
}
