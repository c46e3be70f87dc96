//! Tests for MemoryQueue
//!
//! These tests verify:
//! - FIFO append/peek/remove semantics
//! - Removal clamping
//! - Shared storage across reopened handles
//! - Closed-state behaviour

use ringlog::queue::{DurableQueue, MemoryQueue};
use ringlog::RingLogError;

fn filled(count: usize) -> MemoryQueue {
    let mut queue = MemoryQueue::new();
    for i in 0..count {
        queue.append(format!("record{}", i).as_bytes()).unwrap();
    }
    queue
}

#[test]
fn test_new_queue_is_empty() {
    let mut queue = MemoryQueue::new();

    assert_eq!(queue.size(), 0);
    assert!(queue.is_empty());
    assert_eq!(queue.peek().unwrap(), None);
    assert!(queue.peek_n(5).unwrap().is_empty());
}

#[test]
fn test_peek_returns_front() {
    let mut queue = filled(3);

    assert_eq!(queue.peek().unwrap().unwrap().as_ref(), b"record0");
    assert_eq!(queue.size(), 3);
}

#[test]
fn test_peek_n_oldest_first() {
    let mut queue = filled(5);

    let records = queue.peek_n(3).unwrap();
    let records: Vec<&[u8]> = records.iter().map(|r| r.as_ref()).collect();
    assert_eq!(records, vec![&b"record0"[..], b"record1", b"record2"]);
    assert_eq!(queue.size(), 5);
}

#[test]
fn test_peek_n_more_than_size() {
    let mut queue = filled(2);

    assert_eq!(queue.peek_n(10).unwrap().len(), 2);
}

#[test]
fn test_iter_in_order() {
    let mut queue = filled(4);

    let all: Vec<_> = queue.iter().unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(all.len(), 4);
    assert_eq!(all[3].as_ref(), b"record3");
}

#[test]
fn test_remove_front() {
    let mut queue = filled(5);

    assert_eq!(queue.remove(2).unwrap(), 2);
    assert_eq!(queue.size(), 3);
    assert_eq!(queue.peek().unwrap().unwrap().as_ref(), b"record2");
}

#[test]
fn test_remove_clamps() {
    let mut queue = filled(3);

    assert_eq!(queue.remove(100).unwrap(), 3);
    assert_eq!(queue.size(), 0);
    assert_eq!(queue.remove(1).unwrap(), 0);
}

#[test]
fn test_clear() {
    let mut queue = filled(3);

    queue.clear().unwrap();
    assert_eq!(queue.size(), 0);
    queue.clear().unwrap();
    assert_eq!(queue.size(), 0);
}

#[test]
fn test_max_record_size() {
    let mut queue = MemoryQueue::new().with_max_record_size(4);

    queue.append(b"1234").unwrap();
    match queue.append(b"12345") {
        Err(RingLogError::RecordTooLarge { size, max }) => {
            assert_eq!(size, 5);
            assert_eq!(max, 4);
        }
        other => panic!("Expected RecordTooLarge, got {:?}", other),
    }
    assert_eq!(queue.size(), 1);
}

#[test]
fn test_reopen_shares_records() {
    let mut queue = filled(2);
    queue.close().unwrap();

    let mut reopened = queue.reopen();
    assert!(!reopened.is_closed());
    assert_eq!(reopened.size(), 2);
    reopened.append(b"record2").unwrap();

    assert_eq!(queue.snapshot().len(), 3);
}

#[test]
fn test_operations_after_close_fail() {
    let mut queue = filled(1);
    queue.close().unwrap();

    assert!(queue.is_closed());
    assert!(matches!(queue.append(b"x"), Err(RingLogError::Closed)));
    assert!(matches!(queue.peek(), Err(RingLogError::Closed)));
    assert!(matches!(queue.remove(1), Err(RingLogError::Closed)));
    assert!(matches!(queue.clear(), Err(RingLogError::Closed)));
    assert!(queue.close().is_ok());
}
