//! Log Entry Module
//!
//! The logical record stored in the log.
//!
//! ## Responsibilities
//! - Immutable (timestamp, level, tag, message) value
//! - Closed set of severity levels produced by the logger
//! - Sortable timestamp generation
//!
//! ## Timestamp Format
//! ```text
//! yyyy-MM-dd HH:mm:ss.SSS      e.g. 2024-03-01 14:07:55.012
//! ```
//! Fixed width and zero padded, so timestamps written by one logger sort
//! lexicographically in chronological order.

mod level;
mod log_entry;

pub use level::Level;
pub use log_entry::{now_timestamp, LogEntry, TIMESTAMP_FORMAT};
