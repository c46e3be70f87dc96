//! Queue file header
//!
//! Fixed-size header committed after every mutation. A record only becomes
//! part of the queue once a header covering it has been written.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RingLogError};

/// Magic bytes identifying a ringlog queue file
pub(crate) const MAGIC: [u8; 4] = *b"RLOG";

/// Current queue file format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + Reserved (2) + Count (8) + Head (8) + Tail (8)
pub const HEADER_SIZE: u64 = 32;

/// Record header size: Len (4) + CRC (4)
pub const RECORD_HEADER_SIZE: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct QueueHeader {
    pub(crate) magic: [u8; 4],
    pub(crate) version: u16,
    pub(crate) reserved: u16,
    /// Number of live records
    pub(crate) count: u64,
    /// Offset of the oldest live record
    pub(crate) head: u64,
    /// Offset one past the newest live record
    pub(crate) tail: u64,
}

impl QueueHeader {
    /// Header of a queue with no records
    pub fn empty() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            reserved: 0,
            count: 0,
            head: HEADER_SIZE,
            tail: HEADER_SIZE,
        }
    }

    /// Bytes occupied by live records
    pub fn live_bytes(&self) -> u64 {
        self.tail - self.head
    }

    /// Bytes between the header and the oldest live record
    pub fn dead_bytes(&self) -> u64 {
        self.head - HEADER_SIZE
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes =
            bincode::serialize(self).map_err(|e| RingLogError::Serialization(e.to_string()))?;
        debug_assert_eq!(bytes.len() as u64, HEADER_SIZE);
        Ok(bytes)
    }

    /// Decode and sanity-check a header read from a file of `file_len` bytes
    pub fn decode(bytes: &[u8], file_len: u64) -> Result<Self> {
        let header: QueueHeader = bincode::deserialize(bytes)
            .map_err(|e| RingLogError::QueueCorruption(format!("Unreadable header: {}", e)))?;

        if header.magic != MAGIC {
            return Err(RingLogError::QueueCorruption(format!(
                "Invalid queue magic: expected RLOG, got {:?}",
                header.magic
            )));
        }
        if header.version != VERSION {
            return Err(RingLogError::QueueCorruption(format!(
                "Unsupported queue version: {}",
                header.version
            )));
        }
        if header.head < HEADER_SIZE || header.head > header.tail || header.tail > file_len {
            return Err(RingLogError::QueueCorruption(format!(
                "Invalid offsets: head={} tail={} file_len={}",
                header.head, header.tail, file_len
            )));
        }
        if (header.count == 0) != (header.head == header.tail) {
            return Err(RingLogError::QueueCorruption(format!(
                "Record count {} does not match live region {}..{}",
                header.count, header.head, header.tail
            )));
        }

        Ok(header)
    }
}
