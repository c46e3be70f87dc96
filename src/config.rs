//! Configuration for ringlog
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, RingLogError};

/// Main configuration for a file-backed logger
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the queue file backing the log (one file per logger)
    pub path: PathBuf,

    /// Zero-fill the bytes of removed records instead of leaving stale data
    pub zero_on_remove: bool,

    /// Sync strategy: how often to fsync the queue file
    pub sync_strategy: SyncStrategy,

    /// Largest encoded record the queue accepts (in bytes)
    pub max_record_size: usize,

    /// Minimum amount of reclaimable space (in bytes) before the queue file
    /// is compacted
    pub compaction_threshold: u64,

    // -------------------------------------------------------------------------
    // Logger Configuration
    // -------------------------------------------------------------------------
    /// Tag stamped on every entry written by the logger
    pub tag: String,

    /// Upper bound on stored entries; oldest entries are dropped on append.
    /// `None` keeps everything until trimmed explicitly.
    pub max_entries: Option<usize>,
}

/// Queue sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every mutation (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced mutations (balanced durability/performance)
    EveryNOperations { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./ringlog.queue"),
            zero_on_remove: true,
            sync_strategy: SyncStrategy::EveryWrite,
            max_record_size: 1024 * 1024, // 1 MB
            compaction_threshold: 64 * 1024, // 64 KB
            tag: String::new(),
            max_entries: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the configuration for values the logger cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == Some(0) {
            return Err(RingLogError::Config(
                "max_entries must be at least 1".to_string(),
            ));
        }
        if self.max_record_size == 0 {
            return Err(RingLogError::Config(
                "max_record_size must be at least 1".to_string(),
            ));
        }
        if let SyncStrategy::EveryNOperations { count: 0 } = self.sync_strategy {
            return Err(RingLogError::Config(
                "sync interval must be at least 1 operation".to_string(),
            ));
        }
        Ok(())
    }

    /// Queue-level options derived from this config
    pub fn queue_options(&self) -> QueueOptions {
        QueueOptions {
            zero_on_remove: self.zero_on_remove,
            sync_strategy: self.sync_strategy,
            max_record_size: self.max_record_size,
            compaction_threshold: self.compaction_threshold,
        }
    }
}

/// Options the file queue is opened with
#[derive(Debug, Clone, Copy)]
pub struct QueueOptions {
    pub zero_on_remove: bool,
    pub sync_strategy: SyncStrategy,
    pub max_record_size: usize,
    pub compaction_threshold: u64,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Config::default().queue_options()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the queue file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the tag stamped on every entry
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.config.tag = tag.into();
        self
    }

    /// Enable or disable zero-filling of removed records
    pub fn zero_on_remove(mut self, enabled: bool) -> Self {
        self.config.zero_on_remove = enabled;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the maximum encoded record size (in bytes)
    pub fn max_record_size(mut self, size: usize) -> Self {
        self.config.max_record_size = size;
        self
    }

    /// Set the compaction threshold (in bytes)
    pub fn compaction_threshold(mut self, bytes: u64) -> Self {
        self.config.compaction_threshold = bytes;
        self
    }

    /// Bound the number of stored entries
    pub fn max_entries(mut self, max: usize) -> Self {
        self.config.max_entries = Some(max);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
