//! Transfer shape shared out of band by both sides.

use crate::error::{Error, Result};
use crate::{DEFAULT_BLOCK_COUNT, DEFAULT_BLOCK_SIZE, FILL_BYTE, RECV_CHUNK_SIZE};

/// Shape of one benchmark run.
///
/// Nothing here goes over the wire. Client and server must be started with
/// matching values; a mismatch still terminates cleanly on half-close, the
/// receiver just counts a different total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Bytes per block.
    pub block_size: usize,
    /// Number of blocks the sender writes.
    pub block_count: usize,
    /// Byte the payload is filled with.
    pub fill_byte: u8,
    /// Size of the receiver's scratch buffer.
    pub recv_chunk_size: usize,
    /// Report a receive error as a failure instead of treating it as EOF.
    pub strict_eof: bool,
}

impl TransferConfig {
    /// Default shape: 100 blocks of 1 MiB.
    pub fn new() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            block_count: DEFAULT_BLOCK_COUNT,
            fill_byte: FILL_BYTE,
            recv_chunk_size: RECV_CHUNK_SIZE,
            strict_eof: false,
        }
    }

    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    pub fn with_block_count(mut self, count: usize) -> Self {
        self.block_count = count;
        self
    }

    pub fn with_fill_byte(mut self, byte: u8) -> Self {
        self.fill_byte = byte;
        self
    }

    pub fn with_recv_chunk_size(mut self, size: usize) -> Self {
        self.recv_chunk_size = size;
        self
    }

    /// See [`TransferConfig::strict_eof`].
    pub fn with_strict_eof(mut self, strict: bool) -> Self {
        self.strict_eof = strict;
        self
    }

    /// `block_size * block_count`, saturating at `u64::MAX`.
    pub fn total_bytes(&self) -> u64 {
        (self.block_size as u64).saturating_mul(self.block_count as u64)
    }

    /// Checks the shape can actually be run.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(Error::InvalidConfig("block size must be non-zero".into()));
        }
        if self.recv_chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "receive chunk size must be non-zero".into(),
            ));
        }
        if self.block_size > isize::MAX as usize {
            return Err(Error::InvalidConfig(format!(
                "block size {} exceeds the largest allocation",
                self.block_size
            )));
        }
        if (self.block_size as u64)
            .checked_mul(self.block_count as u64)
            .is_none()
        {
            return Err(Error::InvalidConfig(format!(
                "{} blocks of {} bytes overflow the byte counter",
                self.block_count, self.block_size
            )));
        }
        Ok(())
    }

    /// One payload block. Fails instead of aborting when the block cannot
    /// be allocated.
    pub(crate) fn block(&self) -> Result<Vec<u8>> {
        let mut block = Vec::new();
        block.try_reserve_exact(self.block_size).map_err(|e| {
            Error::InvalidConfig(format!(
                "cannot allocate a {} byte block: {}",
                self.block_size, e
            ))
        })?;
        block.resize(self.block_size, self.fill_byte);
        Ok(block)
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self::new()
    }
}
