//! File-backed queue
//!
//! Single-file durable queue. Appends write the framed record past the
//! current tail and then commit a new header; removals commit a header with
//! an advanced head. Space in front of the head is reclaimed by rewriting
//! the live records into a fresh file once it outgrows the live region.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::config::{QueueOptions, SyncStrategy};
use crate::error::{Result, RingLogError};

use super::header::{QueueHeader, HEADER_SIZE, RECORD_HEADER_SIZE};
use super::{DurableQueue, QueueIter};

/// Chunk size used when zero-filling removed records
const ZERO_CHUNK: usize = 4096;

/// Durable queue stored in one file
///
/// The file is owned by a single open handle. Opening the same path twice at
/// the same time, from this or another process, is not detected and leads
/// to undefined contents; callers must serialize access themselves.
pub struct FileQueue {
    /// Path of the queue file
    path: PathBuf,

    /// Open handle; `None` once closed
    file: Option<File>,

    /// Last committed header
    header: QueueHeader,

    options: QueueOptions,

    /// Mutations since the last fsync
    unsynced: usize,
}

impl FileQueue {
    /// Open or create a queue file
    ///
    /// On open:
    /// 1. Create the file (and parent directory) if it doesn't exist
    /// 2. Validate the header
    /// 3. Verify every live record's checksum
    /// 4. Discard bytes past the tail left by an interrupted append
    pub fn open(path: &Path, options: QueueOptions) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let file_len = file.metadata()?.len();

        let header = if file_len == 0 {
            let header = QueueHeader::empty();
            write_header(&mut file, &header)?;
            file.sync_all()?;
            info!(path = %path.display(), "Created queue file");
            header
        } else {
            let header = read_header(&mut file, file_len)?;
            verify_records(&mut file, &header)?;

            if file_len > header.tail {
                warn!(
                    path = %path.display(),
                    discarded = file_len - header.tail,
                    "Discarding uncommitted bytes past queue tail"
                );
                file.set_len(header.tail)?;
                file.sync_all()?;
            }

            info!(path = %path.display(), records = header.count, "Opened queue file");
            header
        };

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            header,
            options,
            unsynced: 0,
        })
    }

    /// Open with default options
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(path, QueueOptions::default())
    }

    /// Path of the queue file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Options the queue was opened with
    pub fn options(&self) -> &QueueOptions {
        &self.options
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file_mut()?.sync_all()?;
        self.unsynced = 0;
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn file_mut(&mut self) -> Result<&mut File> {
        self.file.as_mut().ok_or(RingLogError::Closed)
    }

    /// Record length limit; the frame stores lengths as u32
    fn record_limit(&self) -> usize {
        self.options.max_record_size.min(u32::MAX as usize)
    }

    /// Count one mutation and report whether it must be synced
    fn take_sync(&mut self) -> bool {
        match self.options.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNOperations { count } => {
                self.unsynced += 1;
                if self.unsynced >= count {
                    self.unsynced = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Make `header` the committed state
    ///
    /// Data written before the call reaches the disk before the header does
    /// whenever this mutation is synced.
    fn commit(&mut self, header: QueueHeader) -> Result<()> {
        let sync = self.take_sync();
        let file = self.file_mut()?;

        if sync {
            file.sync_data()?;
        }
        write_header(file, &header)?;
        if sync {
            file.sync_data()?;
        }

        self.header = header;
        Ok(())
    }

    /// Offset of the record following the one at `offset`
    fn skip_record(&mut self, offset: u64) -> Result<u64> {
        let tail = self.header.tail;
        let file = self.file_mut()?;
        let (len, _) = read_record_header(file, offset, tail)?;
        Ok(offset + RECORD_HEADER_SIZE + len as u64)
    }

    /// Zero-fill `[start, end)` once the header that released it is on disk
    ///
    /// Under batched syncing the header moving the head past these bytes may
    /// still be in the page cache; a crash would then leave the old header
    /// pointing at zeroed frames, which pass the checksum as empty records.
    fn scrub(&mut self, start: u64, end: u64) -> Result<()> {
        if self.unsynced > 0 {
            self.sync()?;
        }
        self.zero_fill(start, end)?;
        self.file_mut()?.sync_data()?;
        Ok(())
    }

    /// Overwrite `[start, end)` with zeros
    fn zero_fill(&mut self, start: u64, end: u64) -> Result<()> {
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(start))?;

        let zeros = [0u8; ZERO_CHUNK];
        let mut remaining = end - start;
        while remaining > 0 {
            let chunk = remaining.min(ZERO_CHUNK as u64) as usize;
            file.write_all(&zeros[..chunk])?;
            remaining -= chunk as u64;
        }
        Ok(())
    }

    /// Drop every record and shrink the file to a bare header
    fn reset(&mut self) -> Result<()> {
        let old = self.header;
        self.commit(QueueHeader::empty())?;

        if self.options.zero_on_remove && old.tail > HEADER_SIZE {
            self.scrub(HEADER_SIZE, old.tail)?;
        }

        let file = self.file_mut()?;
        file.set_len(HEADER_SIZE)?;
        file.sync_all()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Compact when dead space is both large and larger than the live region
    fn maybe_compact(&mut self) -> Result<()> {
        let dead = self.header.dead_bytes();
        if dead > 0
            && dead >= self.options.compaction_threshold
            && dead > self.header.live_bytes()
        {
            self.compact()?;
        }
        Ok(())
    }

    /// Rewrite the live records into a new file and swap it in
    ///
    /// The new file is fully synced before it atomically replaces the old
    /// one, so a crash leaves either the old or the new queue intact. On
    /// failure the partial compaction file is removed and the queue keeps
    /// using the old file.
    fn compact(&mut self) -> Result<()> {
        let old = self.header;
        let compact_path = self.compact_path();

        let compacted = QueueHeader {
            head: HEADER_SIZE,
            tail: HEADER_SIZE + old.live_bytes(),
            ..old
        };

        if let Err(e) = self.write_compacted(&compact_path, &compacted) {
            discard_compaction(&compact_path);
            return Err(e);
        }

        // Release the old handle before the rename so it also works where
        // open files cannot be replaced
        self.file = None;
        let renamed = fs::rename(&compact_path, &self.path);
        self.file = Some(OpenOptions::new().read(true).write(true).open(&self.path)?);
        if let Err(e) = renamed {
            discard_compaction(&compact_path);
            return Err(e.into());
        }

        self.header = compacted;
        self.unsynced = 0;

        info!(
            path = %self.path.display(),
            reclaimed = old.dead_bytes(),
            records = compacted.count,
            "Compacted queue file"
        );
        Ok(())
    }

    /// Write `header` and the live region into a fresh file at `path`
    fn write_compacted(&mut self, path: &Path, header: &QueueHeader) -> Result<()> {
        let old = self.header;
        let mut out = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        write_header(&mut out, header)?;

        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(old.head))?;
        let copied = io::copy(&mut Read::by_ref(file).take(old.live_bytes()), &mut out)?;
        if copied != old.live_bytes() {
            return Err(RingLogError::QueueCorruption(format!(
                "Live region truncated during compaction: copied {} of {} bytes",
                copied,
                old.live_bytes()
            )));
        }
        out.sync_all()?;
        Ok(())
    }

    fn compact_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".compact");
        self.path.with_file_name(name)
    }
}

impl DurableQueue for FileQueue {
    fn append(&mut self, record: &[u8]) -> Result<()> {
        self.file_mut()?;

        let max = self.record_limit();
        if record.len() > max {
            return Err(RingLogError::RecordTooLarge {
                size: record.len(),
                max,
            });
        }

        let tail = self.header.tail;
        let file = self.file_mut()?;

        let mut frame = Vec::with_capacity(RECORD_HEADER_SIZE as usize + record.len());
        frame.extend_from_slice(&(record.len() as u32).to_le_bytes());
        frame.extend_from_slice(&crc32fast::hash(record).to_le_bytes());
        frame.extend_from_slice(record);

        file.seek(SeekFrom::Start(tail))?;
        file.write_all(&frame)?;

        let next = QueueHeader {
            count: self.header.count + 1,
            tail: tail + frame.len() as u64,
            ..self.header
        };
        self.commit(next)?;

        debug!(len = record.len(), records = next.count, "Appended record");
        Ok(())
    }

    fn peek_n(&mut self, n: usize) -> Result<Vec<Bytes>> {
        let take = (n as u64).min(self.header.count) as usize;
        let mut records = Vec::with_capacity(take);
        for record in self.iter()?.take(take) {
            records.push(record?);
        }
        Ok(records)
    }

    fn iter(&mut self) -> Result<QueueIter<'_>> {
        let header = self.header;
        let file = self.file_mut()?;
        Ok(Box::new(FileQueueIter {
            file,
            offset: header.head,
            tail: header.tail,
            remaining: header.count,
        }))
    }

    fn remove(&mut self, n: usize) -> Result<usize> {
        self.file_mut()?;

        let n = (n as u64).min(self.header.count);
        if n == 0 {
            return Ok(0);
        }
        if n == self.header.count {
            self.reset()?;
            debug!(removed = n, "Removed all records");
            return Ok(n as usize);
        }

        let old_head = self.header.head;
        let mut new_head = old_head;
        for _ in 0..n {
            new_head = self.skip_record(new_head)?;
        }

        let next = QueueHeader {
            count: self.header.count - n,
            head: new_head,
            ..self.header
        };
        self.commit(next)?;
        debug!(removed = n, records = next.count, "Removed records");

        // Committed: housekeeping failures below must not fail the removal
        if self.options.zero_on_remove {
            if let Err(e) = self.scrub(old_head, new_head) {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to zero-fill removed records"
                );
            }
        }
        if let Err(e) = self.maybe_compact() {
            warn!(
                path = %self.path.display(),
                error = %e,
                "Compaction failed; keeping uncompacted file"
            );
        }
        Ok(n as usize)
    }

    fn clear(&mut self) -> Result<()> {
        self.file_mut()?;
        if self.header.count == 0 && self.header.tail == HEADER_SIZE {
            return Ok(());
        }
        self.reset()?;
        debug!("Cleared queue");
        Ok(())
    }

    fn size(&self) -> usize {
        self.header.count as usize
    }

    fn max_record_size(&self) -> Option<usize> {
        Some(self.record_limit())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
            info!(path = %self.path.display(), "Closed queue file");
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.file.is_none()
    }
}

/// Remove a leftover compaction file, if one was created
fn discard_compaction(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            debug!(path = %path.display(), error = %e, "Could not remove compaction file");
        }
    }
}

// =============================================================================
// Record Iteration
// =============================================================================

/// Lazy front-to-tail walk over the live records
struct FileQueueIter<'a> {
    file: &'a mut File,
    offset: u64,
    tail: u64,
    remaining: u64,
}

impl<'a> Iterator for FileQueueIter<'a> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        match read_record(self.file, self.offset, self.tail) {
            Ok((data, next)) => {
                self.offset = next;
                self.remaining -= 1;
                Some(Ok(data))
            }
            Err(e) => {
                // Framing is lost past a bad record
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

// =============================================================================
// Low-level I/O
// =============================================================================

fn write_header(file: &mut File, header: &QueueHeader) -> Result<()> {
    let bytes = header.encode()?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&bytes)?;
    Ok(())
}

fn read_header(file: &mut File, file_len: u64) -> Result<QueueHeader> {
    if file_len < HEADER_SIZE {
        return Err(RingLogError::QueueCorruption(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE, file_len
        )));
    }

    let mut bytes = [0u8; HEADER_SIZE as usize];
    file.seek(SeekFrom::Start(0))?;
    file.read_exact(&mut bytes)?;
    QueueHeader::decode(&bytes, file_len)
}

/// Read (len, crc) of the record at `offset`, checking it ends before `tail`
fn read_record_header(file: &mut File, offset: u64, tail: u64) -> Result<(u32, u32)> {
    if offset + RECORD_HEADER_SIZE > tail {
        return Err(RingLogError::QueueCorruption(format!(
            "Record header at {} runs past tail {}",
            offset, tail
        )));
    }

    let mut header = [0u8; RECORD_HEADER_SIZE as usize];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut header)?;

    let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

    if offset + RECORD_HEADER_SIZE + len as u64 > tail {
        return Err(RingLogError::QueueCorruption(format!(
            "Record at {} with length {} runs past tail {}",
            offset, len, tail
        )));
    }

    Ok((len, crc))
}

/// Read and checksum the record at `offset`; returns it and the next offset
fn read_record(file: &mut File, offset: u64, tail: u64) -> Result<(Bytes, u64)> {
    let (len, crc) = read_record_header(file, offset, tail)?;

    let mut data = vec![0u8; len as usize];
    file.read_exact(&mut data)?;

    let actual = crc32fast::hash(&data);
    if actual != crc {
        return Err(RingLogError::QueueCorruption(format!(
            "Checksum mismatch for record at {}: expected {:08x}, got {:08x}",
            offset, crc, actual
        )));
    }

    Ok((Bytes::from(data), offset + RECORD_HEADER_SIZE + len as u64))
}

/// Walk every live record and check it against the header
fn verify_records(file: &mut File, header: &QueueHeader) -> Result<()> {
    let mut offset = header.head;
    for _ in 0..header.count {
        let (_, next) = read_record(file, offset, header.tail)?;
        offset = next;
    }

    if offset != header.tail {
        return Err(RingLogError::QueueCorruption(format!(
            "{} records end at {}, header tail is {}",
            header.count, offset, header.tail
        )));
    }
    Ok(())
}
