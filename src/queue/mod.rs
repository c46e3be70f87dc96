//! Durable Queue Module
//!
//! Ordered, persistent sequence of opaque byte records. Records are appended
//! at the tail and peeked/removed at the front; insertion order is the only
//! order. The logger sees the queue only through [`DurableQueue`], so the
//! codec and façade can run against [`MemoryQueue`] in tests and
//! [`FileQueue`] in production.
//!
//! ## File Format ([`FileQueue`])
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (32 bytes)                                       │
//! │   Magic "RLOG" (4) | Version u16 (2) | Reserved (2)     │
//! │   Count u64 (8) | Head u64 (8) | Tail u64 (8)           │
//! ├─────────────────────────────────────────────────────────┤
//! │ Dead space (removed records, zero-filled if enabled)    │
//! ├─────────────────────────────────────────────────────────┤  <- head
//! │ Record                                                  │
//! │ ┌─────────┬─────────┬───────────────────┐               │
//! │ │ Len (4) │ CRC (4) │ Data              │               │
//! │ └─────────┴─────────┴───────────────────┘               │
//! │ ... (Count records)                                     │
//! └─────────────────────────────────────────────────────────┘  <- tail
//! ```

mod file;
mod header;
mod memory;

use bytes::Bytes;

use crate::error::Result;

pub use file::FileQueue;
pub use header::{HEADER_SIZE, RECORD_HEADER_SIZE};
pub use memory::MemoryQueue;

/// Lazy iterator over stored records, front to tail
pub type QueueIter<'a> = Box<dyn Iterator<Item = Result<Bytes>> + 'a>;

/// Ordered persistent sequence of byte records
///
/// All operations except [`close`](DurableQueue::close) and the accessors
/// fail with [`RingLogError::Closed`](crate::RingLogError::Closed) once the
/// queue is closed. Closing twice is a no-op.
pub trait DurableQueue {
    /// Durably add one record at the tail
    fn append(&mut self, record: &[u8]) -> Result<()>;

    /// The oldest record, without removing it
    fn peek(&mut self) -> Result<Option<Bytes>> {
        Ok(self.peek_n(1)?.into_iter().next())
    }

    /// Up to `n` oldest records, oldest first, without removing them
    fn peek_n(&mut self, n: usize) -> Result<Vec<Bytes>>;

    /// Iterate every record, oldest first, without removing them
    fn iter(&mut self) -> Result<QueueIter<'_>>;

    /// Durably remove up to `n` oldest records; returns how many were removed
    fn remove(&mut self, n: usize) -> Result<usize>;

    /// Durably remove every record
    fn clear(&mut self) -> Result<()>;

    /// Number of stored records
    fn size(&self) -> usize;

    /// Largest record [`append`](DurableQueue::append) accepts, if bounded
    fn max_record_size(&self) -> Option<usize>;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Release the underlying resource
    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;
}
