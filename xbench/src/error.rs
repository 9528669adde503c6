//! Error types.

use std::fmt;
use std::io;

use thiserror::Error;

/// Transfer phase an I/O error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Writing payload blocks.
    Sending,
    /// Shutting down the write direction after the last block.
    HalfClose,
    /// Draining the stream on the receiver.
    Receiving,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Sending => write!(f, "sending"),
            Phase::HalfClose => write!(f, "half-close"),
            Phase::Receiving => write!(f, "receiving"),
        }
    }
}

/// Fatal benchmark errors.
#[derive(Error, Debug)]
pub enum Error {
    /// The peer could not be reached.
    #[error("failed to connect to {target}: {source}")]
    Connect {
        /// Target that was dialed.
        target: String,
        /// Underlying socket error.
        source: io::Error,
    },

    /// The listening socket could not be set up.
    #[error("failed to bind {target}: {source}")]
    Bind {
        /// Target that was bound.
        target: String,
        /// Underlying socket error.
        source: io::Error,
    },

    /// Accepting the single inbound connection failed.
    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    /// A read or write failed mid transfer.
    #[error("transfer failed while {phase}: {source}")]
    Io {
        /// Phase the error was raised in.
        phase: Phase,
        /// Underlying stream error.
        source: io::Error,
    },

    /// The transfer shape cannot be run.
    #[error("invalid transfer config: {0}")]
    InvalidConfig(String),

    /// A target string could not be parsed.
    #[error("invalid target `{0}`")]
    InvalidTarget(String),
}

impl Error {
    pub(crate) fn io(phase: Phase, source: io::Error) -> Self {
        Error::Io { phase, source }
    }

    /// Returns the transfer phase for `Io` errors.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::Io { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

/// The sender did not get an acknowledgment. The measured data phase is
/// still valid when this is reported.
#[derive(Error, Debug)]
pub enum AckMissing {
    /// The receiver closed without writing anything.
    #[error("peer closed the connection without acknowledging")]
    Eof,

    /// Reading the acknowledgment failed.
    #[error("failed to read acknowledgment: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for benchmark operations.
pub type Result<T> = std::result::Result<T, Error>;
