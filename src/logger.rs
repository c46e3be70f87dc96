//! Logger Module
//!
//! The façade that ties the codec to a durable queue.
//!
//! ## Responsibilities
//! - Build entries with the logger's tag and the current time
//! - Encode entries and append them durably
//! - Read and decode entries from the front of the queue
//! - Trim the queue from the front (explicitly or by a capacity bound)
//! - Own the queue handle and release it exactly once
//!
//! ## Read Order
//! The front of the queue is the oldest surviving entry. Every read,
//! including [`Logger::read_latest`], starts there.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::codec::{self, decode_entry, encode_entry};
use crate::config::Config;
use crate::entry::{Level, LogEntry};
use crate::error::{Result, RingLogError};
use crate::queue::{DurableQueue, FileQueue, QueueIter};

/// Durable leveled logger over a [`DurableQueue`]
///
/// ## States
/// - **Open**: after construction; every operation is available.
/// - **Closed**: after [`close`](Logger::close). Every operation except
///   `close` fails with [`RingLogError::Closed`]; closing again is a no-op.
///
/// Dropping an open logger closes it.
pub struct Logger<Q: DurableQueue = FileQueue> {
    /// Backing queue; `None` once closed
    queue: Option<Q>,

    /// Tag stamped on every entry this logger writes
    tag: String,

    /// Upper bound on stored entries
    max_entries: Option<usize>,
}

impl Logger<FileQueue> {
    /// Open or create a file-backed logger with the given config
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        codec::validate_tag(&config.tag)?;

        let queue = FileQueue::open(&config.path, config.queue_options())?;
        info!(
            path = %config.path.display(),
            tag = %config.tag,
            entries = queue.size(),
            "Opened logger"
        );

        Ok(Self {
            queue: Some(queue),
            tag: config.tag,
            max_entries: config.max_entries,
        })
    }

    /// Open with a path and tag (convenience method)
    ///
    /// Uses the default config otherwise
    pub fn open_path(path: impl AsRef<Path>, tag: impl Into<String>) -> Result<Self> {
        let config = Config::builder()
            .path(path.as_ref())
            .tag(tag)
            .build();
        Self::open(config)
    }
}

impl<Q: DurableQueue> Logger<Q> {
    /// Create a logger over an already opened queue
    pub fn with_queue(queue: Q, tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        codec::validate_tag(&tag)?;

        Ok(Self {
            queue: Some(queue),
            tag,
            max_entries: None,
        })
    }

    /// Bound the number of stored entries
    pub fn with_max_entries(mut self, max: usize) -> Result<Self> {
        if max == 0 {
            return Err(RingLogError::Config(
                "max_entries must be at least 1".to_string(),
            ));
        }
        self.max_entries = Some(max);
        Ok(self)
    }

    // =========================================================================
    // Writing
    // =========================================================================

    pub fn debug(&mut self, message: impl Into<String>) -> Result<()> {
        self.log(Level::Debug, message)
    }

    pub fn info(&mut self, message: impl Into<String>) -> Result<()> {
        self.log(Level::Info, message)
    }

    pub fn warning(&mut self, message: impl Into<String>) -> Result<()> {
        self.log(Level::Warn, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> Result<()> {
        self.log(Level::Error, message)
    }

    /// Append an entry with `level`, this logger's tag and the current time
    pub fn log(&mut self, level: Level, message: impl Into<String>) -> Result<()> {
        let entry = LogEntry::now(level, self.tag.as_str(), message);
        self.append(&entry)
    }

    /// Append a caller-built entry as is
    ///
    /// The entry keeps its own timestamp, level and tag.
    ///
    /// With a capacity bound the oldest entries are evicted only after the
    /// append has succeeded, so a failed append never costs stored entries.
    pub fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let record = encode_entry(entry)?;

        self.queue_mut()?.append(&record)?;
        self.trim_overflow();

        debug!(level = entry.level(), tag = entry.tag(), "Appended log entry");
        Ok(())
    }

    /// Append entries in order; returns how many were appended
    ///
    /// Stops at the first failure. Entries appended before it stay in the
    /// log.
    pub fn append_batch<'a, I>(&mut self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a LogEntry>,
    {
        let mut appended = 0;
        for entry in entries {
            self.append(entry)?;
            appended += 1;
        }
        Ok(appended)
    }

    /// Replace the whole log with `entries`; returns how many were stored
    ///
    /// Every entry is encoded and checked against the queue's record limit
    /// before anything is removed, so an entry that cannot be stored leaves
    /// the log untouched. With a capacity bound only the newest
    /// `max_entries` are written.
    pub fn replace_all<'a, I>(&mut self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a LogEntry>,
    {
        let records = entries
            .into_iter()
            .map(encode_entry)
            .collect::<Result<Vec<_>>>()?;

        let queue = self.queue_mut()?;
        if let Some(max) = queue.max_record_size() {
            if let Some(record) = records.iter().find(|r| r.len() > max) {
                return Err(RingLogError::RecordTooLarge {
                    size: record.len(),
                    max,
                });
            }
        }

        let skip = match self.max_entries {
            Some(max) => records.len().saturating_sub(max),
            None => 0,
        };

        let queue = self.queue_mut()?;
        queue.clear()?;
        for record in &records[skip..] {
            queue.append(record)?;
        }

        let stored = records.len() - skip;
        debug!(entries = stored, dropped = skip, "Replaced log contents");
        Ok(stored)
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// The entry at the front of the queue, without removing it
    ///
    /// Despite the name this is the **oldest** surviving entry, not the
    /// most recently appended one. Returns `Ok(None)` when the log is empty.
    pub fn read_latest(&mut self) -> Result<Option<LogEntry>> {
        self.queue_mut()?
            .peek()?
            .map(|record| decode_entry(&record))
            .transpose()
    }

    /// Up to `count` entries from the front, oldest first, without removing
    /// them
    ///
    /// Asking for more entries than are stored returns all of them.
    pub fn read_latest_n(&mut self, count: usize) -> Result<Vec<LogEntry>> {
        self.queue_mut()?
            .peek_n(count)?
            .iter()
            .map(|record| decode_entry(record))
            .collect()
    }

    /// Lazily iterate every entry, oldest first, without removing them
    ///
    /// A record that fails to decode yields an `Err` in its position;
    /// the following records still decode.
    pub fn read_all(&mut self) -> Result<Entries<'_>> {
        let records = self.queue_mut()?.iter()?;
        Ok(Entries { records })
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Remove the `count` oldest entries; returns how many were removed
    ///
    /// A `count` larger than the log removes everything and is not an error.
    pub fn remove_processed_logs(&mut self, count: usize) -> Result<usize> {
        let removed = self.queue_mut()?.remove(count)?;
        debug!(requested = count, removed, "Removed processed log entries");
        Ok(removed)
    }

    /// Remove every entry; a no-op on an empty log
    pub fn clear_old_logs(&mut self) -> Result<()> {
        self.queue_mut()?.clear()?;
        debug!("Cleared log");
        Ok(())
    }

    /// Number of stored entries
    pub fn log_count(&self) -> Result<usize> {
        Ok(self.queue()?.size())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.queue()?.is_empty())
    }

    /// Release the queue
    ///
    /// The first call closes the queue and moves the logger to the closed
    /// state, even if closing the queue reports an error. Later calls return
    /// `Ok(())`.
    pub fn close(&mut self) -> Result<()> {
        match self.queue.take() {
            Some(mut queue) => {
                queue.close()?;
                info!(tag = %self.tag, "Closed logger");
                Ok(())
            }
            None => Ok(()),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Tag stamped on every entry this logger writes
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Configured capacity bound
    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_none()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn queue(&self) -> Result<&Q> {
        self.queue.as_ref().ok_or(RingLogError::Closed)
    }

    fn queue_mut(&mut self) -> Result<&mut Q> {
        self.queue.as_mut().ok_or(RingLogError::Closed)
    }

    /// Evict from the front until the log is back under `max_entries`
    ///
    /// Runs after a committed append. A failed eviction is logged and left
    /// for the next append to retry, since the append itself must not be
    /// reported as failed.
    fn trim_overflow(&mut self) {
        let Some(max) = self.max_entries else {
            return;
        };
        let Some(queue) = self.queue.as_mut() else {
            return;
        };

        let size = queue.size();
        if size <= max {
            return;
        }
        match queue.remove(size - max) {
            Ok(evicted) => debug!(evicted, max, "Evicted oldest log entries"),
            Err(e) => warn!(error = %e, size, max, "Failed to evict oldest log entries"),
        }
    }
}

impl<Q: DurableQueue> Drop for Logger<Q> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(tag = %self.tag, error = %e, "Failed to close logger on drop");
        }
    }
}

/// Lazy iterator over decoded entries, oldest first
///
/// Borrows the logger; it cannot be restarted once consumed.
pub struct Entries<'a> {
    records: QueueIter<'a>,
}

impl Iterator for Entries<'_> {
    type Item = Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records
            .next()
            .map(|record| record.and_then(|bytes| decode_entry(&bytes)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}
