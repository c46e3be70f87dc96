//! Log entry definition

use std::fmt;

use chrono::Local;

use super::Level;

/// chrono format string for entry timestamps (`yyyy-MM-dd HH:mm:ss.SSS`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Current local time in the entry timestamp format
pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// A single log record
///
/// Fields are fixed at construction. The level is kept as text so records
/// written with a level outside [`Level`] still decode; entries produced by
/// the logger always carry one of the four [`Level`] names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    timestamp: String,
    level: String,
    tag: String,
    message: String,
}

impl LogEntry {
    /// Create an entry stamped with the current time
    pub fn now(level: Level, tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(now_timestamp(), level.as_str(), tag, message)
    }

    /// Create an entry from explicit field values
    pub fn new(
        timestamp: impl Into<String>,
        level: impl Into<String>,
        tag: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            level: level.into(),
            tag: tag.into(),
            message: message.into(),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Level text as stored
    pub fn level(&self) -> &str {
        &self.level
    }

    /// Level parsed back into [`Level`], if it is one of the known names
    pub fn level_kind(&self) -> Option<Level> {
        self.level.parse().ok()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LogEntry {
    /// `[timestamp] LEVEL/tag: message`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}/{}: {}",
            self.timestamp, self.level, self.tag, self.message
        )
    }
}
