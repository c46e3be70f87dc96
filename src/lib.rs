//! # ringlog
//!
//! A small durable circular log for breadcrumb-style diagnostic trails:
//! - Leveled logging calls that append one durable record each
//! - Oldest-first reads that never mutate the log
//! - Trimming from the front to bound storage growth
//! - Pluggable record queue (file-backed or in-memory)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Logger                              │
//! │        debug/info/warning/error · read_* · trim/clear        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌───────────────┐
//!   │    Codec    │          │ DurableQueue  │
//!   │ ts|lvl|tag| │          │ (trait)       │
//!   │   message   │          └───────┬───────┘
//!   └──────┬──────┘                  │
//!          │                ┌────────┴────────┐
//!          ▼                ▼                 ▼
//!   ┌─────────────┐  ┌─────────────┐  ┌─────────────┐
//!   │  LogEntry   │  │  FileQueue  │  │ MemoryQueue │
//!   └─────────────┘  └─────────────┘  └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use ringlog::Logger;
//!
//! # fn main() -> ringlog::Result<()> {
//! let mut logger = Logger::open_path("app_logs.queue", "MainActivity")?;
//! logger.info("Application started")?;
//!
//! for entry in logger.read_all()? {
//!     println!("{}", entry?);
//! }
//!
//! logger.remove_processed_logs(1)?;
//! logger.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod entry;
pub mod codec;
pub mod queue;
pub mod logger;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RingLogError, Result};
pub use config::{Config, SyncStrategy};
pub use entry::{Level, LogEntry};
pub use logger::{Entries, Logger};
pub use queue::{DurableQueue, FileQueue, MemoryQueue};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ringlog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
