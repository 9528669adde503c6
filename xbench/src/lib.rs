//! # XBench - Single Connection Throughput Benchmark
//!
//! XBench measures one-directional bulk transfer throughput over a single
//! stream connection (TCP, Unix domain socket or vsock):
//!
//! - **Sender**: writes `block_count` blocks of `block_size` bytes, retrying
//!   short writes, then half-closes its write side and waits for an ack
//! - **Receiver**: accepts one connection, drains it until end of stream,
//!   then writes a fixed acknowledgment back
//!
//! ## Wire format
//!
//! ```text
//!   sender                                         receiver
//!     │ ── block 0 │ block 1 │ ... │ block N-1 ──────▶ │  drain until read == 0
//!     │ ── FIN (shutdown write) ───────────────────────▶ │
//!     │ ◀────────────────────────────────────── "ACK" ── │
//!     │ ◀───────────────────────────────────────── FIN ─ │
//! ```
//!
//! There is no framing and no size negotiation: both sides are configured
//! with the same [`TransferConfig`] out of band.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::net::TcpStream;
//! use xbench::{sender, TransferConfig};
//!
//! let stream = TcpStream::connect("127.0.0.1:5001")?;
//! let report = sender::run(stream, &TransferConfig::default())?;
//! println!("{}", report.result);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::net::Ipv4Addr;

pub mod config;
pub mod connection;
pub mod error;
pub mod mock;
pub mod receiver;
pub mod sender;
pub mod target;
pub mod throughput;

// Re-export commonly used types
pub use config::TransferConfig;
pub use connection::{Connection, Listener};
pub use error::{AckMissing, Error, Phase, Result};
pub use receiver::ReceiveReport;
pub use sender::{Acknowledgment, SendReport};
pub use target::Target;
pub use throughput::{TransferResult, throughput};

/// Default port shared by client and server.
pub const DEFAULT_PORT: u16 = 5001;

/// Default address the client connects to.
pub const DEFAULT_SERVER_IP: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Default address the server binds to.
pub const DEFAULT_BIND_IP: Ipv4Addr = Ipv4Addr::UNSPECIFIED;

/// Default bytes per block (1 MiB).
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

/// Default number of blocks per transfer.
pub const DEFAULT_BLOCK_COUNT: usize = 100;

/// Size of the receiver's scratch buffer.
pub const RECV_CHUNK_SIZE: usize = 4096;

/// Size of the buffer the sender reads the acknowledgment into.
pub const ACK_BUF_SIZE: usize = 1024;

/// Acknowledgment payload sent by the receiver once the stream is drained.
pub const ACK: &[u8] = b"ACK";

/// Filler byte for the payload blocks.
pub const FILL_BYTE: u8 = b'a';
