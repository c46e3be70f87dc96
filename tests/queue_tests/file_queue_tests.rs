//! Tests for FileQueue
//!
//! These tests verify:
//! - Create/open behaviour and persistence across reopen
//! - FIFO append/peek/remove semantics against the file
//! - Torn tail recovery and checksum corruption detection
//! - Zero-fill on removal
//! - Compaction
//! - Failed operations leaving committed records intact

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use ringlog::config::{QueueOptions, SyncStrategy};
use ringlog::queue::{DurableQueue, FileQueue, HEADER_SIZE, RECORD_HEADER_SIZE};
use ringlog::RingLogError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_queue() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.queue");
    (temp_dir, path)
}

fn options() -> QueueOptions {
    QueueOptions {
        zero_on_remove: false,
        sync_strategy: SyncStrategy::EveryWrite,
        max_record_size: 1024,
        compaction_threshold: u64::MAX,
    }
}

fn open_with(path: &Path, options: QueueOptions) -> FileQueue {
    FileQueue::open(path, options).unwrap()
}

fn record(i: usize) -> Vec<u8> {
    format!("record-{:04}", i).into_bytes()
}

fn contents(queue: &mut FileQueue) -> Vec<Vec<u8>> {
    queue.iter().unwrap().map(|r| r.unwrap().to_vec()).collect()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_file_with_header() {
    let (_temp, path) = setup_temp_queue();

    let queue = open_with(&path, options());

    assert!(path.exists());
    assert_eq!(fs::metadata(&path).unwrap().len(), HEADER_SIZE);
    assert_eq!(queue.size(), 0);
}

#[test]
fn test_open_creates_parent_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("log.queue");

    let _queue = open_with(&path, options());

    assert!(path.exists());
}

#[test]
fn test_open_rejects_foreign_file() {
    let (_temp, path) = setup_temp_queue();
    fs::write(&path, vec![0xAB; 64]).unwrap();

    match FileQueue::open(&path, options()) {
        Err(RingLogError::QueueCorruption(_)) => {}
        Err(e) => panic!("Expected QueueCorruption, got {:?}", e),
        Ok(_) => panic!("Expected QueueCorruption, got an open queue"),
    }
}

#[test]
fn test_open_rejects_truncated_header() {
    let (_temp, path) = setup_temp_queue();
    fs::write(&path, b"RLOG").unwrap();

    assert!(matches!(
        FileQueue::open(&path, options()),
        Err(RingLogError::QueueCorruption(_))
    ));
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_append_and_peek() {
    let (_temp, path) = setup_temp_queue();
    let mut queue = open_with(&path, options());

    queue.append(&record(0)).unwrap();
    queue.append(&record(1)).unwrap();

    assert_eq!(queue.size(), 2);
    assert_eq!(queue.peek().unwrap().unwrap().as_ref(), record(0).as_slice());
    assert_eq!(
        fs::metadata(&path).unwrap().len(),
        HEADER_SIZE + 2 * (RECORD_HEADER_SIZE + record(0).len() as u64)
    );
}

#[test]
fn test_peek_on_empty_queue() {
    let (_temp, path) = setup_temp_queue();
    let mut queue = open_with(&path, options());

    assert_eq!(queue.peek().unwrap(), None);
    assert!(queue.peek_n(3).unwrap().is_empty());
}

#[test]
fn test_empty_record() {
    let (_temp, path) = setup_temp_queue();
    let mut queue = open_with(&path, options());

    queue.append(b"").unwrap();
    queue.append(b"x").unwrap();

    assert_eq!(queue.size(), 2);
    assert_eq!(contents(&mut queue), vec![b"".to_vec(), b"x".to_vec()]);
}

#[test]
fn test_peek_n_does_not_mutate() {
    let (_temp, path) = setup_temp_queue();
    let mut queue = open_with(&path, options());
    for i in 0..5 {
        queue.append(&record(i)).unwrap();
    }

    let first = queue.peek_n(3).unwrap();
    let again = queue.peek_n(3).unwrap();

    assert_eq!(first, again);
    assert_eq!(first.len(), 3);
    assert_eq!(first[2].as_ref(), record(2).as_slice());
    assert_eq!(queue.size(), 5);
}

#[test]
fn test_remove_front_and_clamp() {
    let (_temp, path) = setup_temp_queue();
    let mut queue = open_with(&path, options());
    for i in 0..5 {
        queue.append(&record(i)).unwrap();
    }

    assert_eq!(queue.remove(2).unwrap(), 2);
    assert_eq!(contents(&mut queue), vec![record(2), record(3), record(4)]);

    assert_eq!(queue.remove(50).unwrap(), 3);
    assert_eq!(queue.size(), 0);
    assert_eq!(fs::metadata(&path).unwrap().len(), HEADER_SIZE);
    assert_eq!(queue.remove(1).unwrap(), 0);
}

#[test]
fn test_append_after_remove_all() {
    let (_temp, path) = setup_temp_queue();
    let mut queue = open_with(&path, options());
    queue.append(&record(0)).unwrap();
    queue.remove(1).unwrap();

    queue.append(&record(1)).unwrap();

    assert_eq!(contents(&mut queue), vec![record(1)]);
}

#[test]
fn test_clear_is_idempotent() {
    let (_temp, path) = setup_temp_queue();
    let mut queue = open_with(&path, options());
    for i in 0..3 {
        queue.append(&record(i)).unwrap();
    }

    queue.clear().unwrap();
    assert_eq!(queue.size(), 0);
    queue.clear().unwrap();
    assert_eq!(queue.size(), 0);
    assert_eq!(fs::metadata(&path).unwrap().len(), HEADER_SIZE);
}

#[test]
fn test_record_too_large() {
    let (_temp, path) = setup_temp_queue();
    let mut queue = open_with(&path, options());

    let result = queue.append(&vec![b'x'; 1025]);

    assert!(matches!(
        result,
        Err(RingLogError::RecordTooLarge { size: 1025, max: 1024 })
    ));
    assert_eq!(queue.size(), 0);
    assert_eq!(fs::metadata(&path).unwrap().len(), HEADER_SIZE);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_reopen_preserves_order() {
    let (_temp, path) = setup_temp_queue();
    {
        let mut queue = open_with(&path, options());
        for i in 0..10 {
            queue.append(&record(i)).unwrap();
        }
        queue.remove(3).unwrap();
        queue.close().unwrap();
    }

    let mut queue = open_with(&path, options());
    assert_eq!(queue.size(), 7);
    assert_eq!(contents(&mut queue), (3..10).map(record).collect::<Vec<_>>());
}

#[test]
fn test_reopen_with_batched_sync() {
    let (_temp, path) = setup_temp_queue();
    let batched = QueueOptions {
        sync_strategy: SyncStrategy::EveryNOperations { count: 4 },
        ..options()
    };
    {
        let mut queue = open_with(&path, batched);
        for i in 0..6 {
            queue.append(&record(i)).unwrap();
        }
        queue.close().unwrap();
    }

    let mut queue = open_with(&path, batched);
    assert_eq!(contents(&mut queue), (0..6).map(record).collect::<Vec<_>>());
}

#[test]
fn test_explicit_sync_under_batched_strategy() {
    let (_temp, path) = setup_temp_queue();
    let batched = QueueOptions {
        sync_strategy: SyncStrategy::EveryNOperations { count: 100 },
        ..options()
    };
    let mut queue = open_with(&path, batched);
    assert_eq!(
        queue.options().sync_strategy,
        SyncStrategy::EveryNOperations { count: 100 }
    );

    queue.append(&record(0)).unwrap();
    queue.append(&record(1)).unwrap();
    queue.sync().unwrap();

    let reopened = open_with(&path, options());
    assert_eq!(reopened.size(), 2);
}

#[test]
fn test_torn_append_is_discarded() {
    let (_temp, path) = setup_temp_queue();
    {
        let mut queue = open_with(&path, options());
        queue.append(&record(0)).unwrap();
        queue.close().unwrap();
    }
    let committed_len = fs::metadata(&path).unwrap().len();

    // Bytes of a record whose header commit never happened
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[7, 0, 0, 0, 1, 2, 3, 4, b'p', b'a']).unwrap();
    drop(file);

    let mut queue = open_with(&path, options());
    assert_eq!(queue.size(), 1);
    assert_eq!(fs::metadata(&path).unwrap().len(), committed_len);

    queue.append(&record(1)).unwrap();
    assert_eq!(contents(&mut queue), vec![record(0), record(1)]);
}

#[test]
fn test_checksum_corruption_detected_on_open() {
    let (_temp, path) = setup_temp_queue();
    {
        let mut queue = open_with(&path, options());
        queue.append(&record(0)).unwrap();
        queue.close().unwrap();
    }

    // Flip a data byte of the first record
    let mut file = OpenOptions::new().write(true).open(&path).unwrap();
    file.seek(SeekFrom::Start(HEADER_SIZE + RECORD_HEADER_SIZE)).unwrap();
    file.write_all(b"X").unwrap();
    drop(file);

    match FileQueue::open(&path, options()) {
        Err(RingLogError::QueueCorruption(msg)) => assert!(msg.contains("Checksum")),
        Err(e) => panic!("Expected QueueCorruption, got {:?}", e),
        Ok(_) => panic!("Expected QueueCorruption, got an open queue"),
    }
}

// =============================================================================
// Zero-fill Tests
// =============================================================================

#[test]
fn test_zero_on_remove_scrubs_removed_records() {
    let (_temp, path) = setup_temp_queue();
    let scrub = QueueOptions {
        zero_on_remove: true,
        ..options()
    };
    let mut queue = open_with(&path, scrub);
    queue.append(b"secret-token-1").unwrap();
    queue.append(b"kept-record").unwrap();

    queue.remove(1).unwrap();

    let raw = fs::read(&path).unwrap();
    assert!(!contains(&raw, b"secret-token-1"));
    assert!(contains(&raw, b"kept-record"));
    assert_eq!(contents(&mut queue), vec![b"kept-record".to_vec()]);
}

#[test]
fn test_without_zero_on_remove_bytes_remain() {
    let (_temp, path) = setup_temp_queue();
    let mut queue = open_with(&path, options());
    queue.append(b"stale-record").unwrap();
    queue.append(b"kept-record").unwrap();

    queue.remove(1).unwrap();

    let raw = fs::read(&path).unwrap();
    assert!(contains(&raw, b"stale-record"));
}

#[test]
fn test_zeroed_region_survives_reopen() {
    let (_temp, path) = setup_temp_queue();
    let scrub = QueueOptions {
        zero_on_remove: true,
        ..options()
    };
    {
        let mut queue = open_with(&path, scrub);
        for i in 0..4 {
            queue.append(&record(i)).unwrap();
        }
        queue.remove(2).unwrap();
        queue.close().unwrap();
    }

    let mut queue = open_with(&path, scrub);
    assert_eq!(contents(&mut queue), vec![record(2), record(3)]);
}

#[test]
fn test_zero_on_remove_with_batched_sync() {
    let (_temp, path) = setup_temp_queue();
    let scrub = QueueOptions {
        zero_on_remove: true,
        sync_strategy: SyncStrategy::EveryNOperations { count: 100 },
        ..options()
    };
    let mut queue = open_with(&path, scrub);
    for i in 0..4 {
        queue.append(&record(i)).unwrap();
    }

    queue.remove(2).unwrap();

    // Read the file through a second handle while the queue stays open
    let raw = fs::read(&path).unwrap();
    assert!(!contains(&raw, &record(0)));
    assert!(!contains(&raw, &record(1)));
    let reopened_contents = {
        let mut reader = open_with(&path, options());
        contents(&mut reader)
    };
    assert_eq!(reopened_contents, vec![record(2), record(3)]);
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_compaction_reclaims_dead_space() {
    let (_temp, path) = setup_temp_queue();
    let compacting = QueueOptions {
        compaction_threshold: 0,
        ..options()
    };
    let mut queue = open_with(&path, compacting);
    for i in 0..10 {
        queue.append(&record(i)).unwrap();
    }

    queue.remove(6).unwrap();

    let frame = RECORD_HEADER_SIZE + record(0).len() as u64;
    assert_eq!(fs::metadata(&path).unwrap().len(), HEADER_SIZE + 4 * frame);
    assert_eq!(contents(&mut queue), (6..10).map(record).collect::<Vec<_>>());

    queue.append(&record(10)).unwrap();
    queue.close().unwrap();

    let mut queue = open_with(&path, compacting);
    assert_eq!(contents(&mut queue), (6..11).map(record).collect::<Vec<_>>());
}

#[test]
fn test_no_compaction_below_threshold() {
    let (_temp, path) = setup_temp_queue();
    let mut queue = open_with(&path, options());
    for i in 0..10 {
        queue.append(&record(i)).unwrap();
    }
    let len_before = fs::metadata(&path).unwrap().len();

    queue.remove(6).unwrap();

    assert_eq!(fs::metadata(&path).unwrap().len(), len_before);
    assert_eq!(queue.size(), 4);
}

// =============================================================================
// Failure Tests
// =============================================================================

fn compact_path(path: &Path) -> PathBuf {
    path.with_file_name("test.queue.compact")
}

#[test]
fn test_oversized_append_leaves_records_intact() {
    let (_temp, path) = setup_temp_queue();
    let mut queue = open_with(&path, options());
    for i in 0..3 {
        queue.append(&record(i)).unwrap();
    }
    let len_before = fs::metadata(&path).unwrap().len();

    assert!(queue.append(&vec![b'x'; 2048]).is_err());

    assert_eq!(queue.size(), 3);
    assert_eq!(fs::metadata(&path).unwrap().len(), len_before);
    queue.close().unwrap();

    let mut queue = open_with(&path, options());
    assert_eq!(contents(&mut queue), (0..3).map(record).collect::<Vec<_>>());
}

#[test]
fn test_failed_compaction_does_not_fail_remove() {
    let (_temp, path) = setup_temp_queue();
    let compacting = QueueOptions {
        compaction_threshold: 0,
        ..options()
    };
    let mut queue = open_with(&path, compacting);
    for i in 0..10 {
        queue.append(&record(i)).unwrap();
    }
    // A directory in the way makes every compaction attempt fail
    fs::create_dir(compact_path(&path)).unwrap();

    assert_eq!(queue.remove(6).unwrap(), 6);
    assert_eq!(queue.size(), 4);
    assert_eq!(contents(&mut queue), (6..10).map(record).collect::<Vec<_>>());

    assert_eq!(queue.remove(1).unwrap(), 1);
    assert_eq!(queue.size(), 3);
    queue.close().unwrap();

    let mut queue = open_with(&path, options());
    assert_eq!(contents(&mut queue), (7..10).map(record).collect::<Vec<_>>());
}

#[test]
fn test_failed_compaction_removes_partial_file() {
    let (_temp, path) = setup_temp_queue();
    let compacting = QueueOptions {
        compaction_threshold: 0,
        ..options()
    };
    let mut queue = open_with(&path, compacting);
    for i in 0..10 {
        queue.append(&record(i)).unwrap();
    }

    // Cut into the last record so the live region cannot be copied in full
    let len = fs::metadata(&path).unwrap().len();
    OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap()
        .set_len(len - 3)
        .unwrap();

    assert_eq!(queue.remove(6).unwrap(), 6);
    assert_eq!(queue.size(), 4);
    assert!(!compact_path(&path).exists());
    assert_eq!(fs::metadata(&path).unwrap().len(), len - 3);
}

// =============================================================================
// Close Tests
// =============================================================================

#[test]
fn test_operations_after_close_fail() {
    let (_temp, path) = setup_temp_queue();
    let mut queue = open_with(&path, options());
    queue.append(&record(0)).unwrap();

    queue.close().unwrap();

    assert!(queue.is_closed());
    assert!(matches!(queue.append(b"x"), Err(RingLogError::Closed)));
    assert!(matches!(queue.peek(), Err(RingLogError::Closed)));
    assert!(matches!(queue.remove(1), Err(RingLogError::Closed)));
    assert!(matches!(queue.clear(), Err(RingLogError::Closed)));
    assert!(queue.iter().is_err());
    assert!(queue.close().is_ok());
}
