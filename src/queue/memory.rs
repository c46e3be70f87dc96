//! In-memory queue
//!
//! Implements [`DurableQueue`] over a shared `VecDeque`. Clones and
//! [`MemoryQueue::reopen`] share the same storage, which lets a test close a
//! logger and open a new one over the records it left behind.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::error::{Result, RingLogError};

use super::{DurableQueue, QueueIter};

/// Queue backed by process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryQueue {
    records: Arc<Mutex<VecDeque<Bytes>>>,
    max_record_size: Option<usize>,
    closed: bool,
}

impl MemoryQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject appends larger than `max` bytes
    pub fn with_max_record_size(mut self, max: usize) -> Self {
        self.max_record_size = Some(max);
        self
    }

    /// Open a new handle on the same records
    pub fn reopen(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            max_record_size: self.max_record_size,
            closed: false,
        }
    }

    /// Copy of every stored record, oldest first
    pub fn snapshot(&self) -> Vec<Bytes> {
        self.records.lock().iter().cloned().collect()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(RingLogError::Closed);
        }
        Ok(())
    }
}

impl DurableQueue for MemoryQueue {
    fn append(&mut self, record: &[u8]) -> Result<()> {
        self.ensure_open()?;
        if let Some(max) = self.max_record_size {
            if record.len() > max {
                return Err(RingLogError::RecordTooLarge {
                    size: record.len(),
                    max,
                });
            }
        }
        self.records.lock().push_back(Bytes::copy_from_slice(record));
        Ok(())
    }

    fn peek_n(&mut self, n: usize) -> Result<Vec<Bytes>> {
        self.ensure_open()?;
        Ok(self.records.lock().iter().take(n).cloned().collect())
    }

    fn iter(&mut self) -> Result<QueueIter<'_>> {
        self.ensure_open()?;
        // Bytes clones share their buffers, so the snapshot is cheap
        let records = self.snapshot();
        Ok(Box::new(records.into_iter().map(Ok)))
    }

    fn remove(&mut self, n: usize) -> Result<usize> {
        self.ensure_open()?;
        let mut records = self.records.lock();
        let n = n.min(records.len());
        records.drain(..n);
        Ok(n)
    }

    fn clear(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.records.lock().clear();
        Ok(())
    }

    fn size(&self) -> usize {
        self.records.lock().len()
    }

    fn max_record_size(&self) -> Option<usize> {
        self.max_record_size
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
