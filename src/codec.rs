//! Entry codec
//!
//! Encoding and decoding between a [`LogEntry`] and one stored record.
//!
//! ## Record Format
//!
//! ```text
//! ┌───────────┬───┬───────┬───┬─────┬───┬──────────────────────┐
//! │ timestamp │ | │ level │ | │ tag │ | │ message (may hold |) │
//! └───────────┴───┴───────┴───┴─────┴───┴──────────────────────┘
//! ```
//!
//! UTF-8 text, four fields, no trailing delimiter and no escaping. The
//! message is last, so decoding splits into at most four parts and any
//! delimiter inside the message survives. The first three fields are not
//! protected: [`encode_entry`] rejects them when they contain the delimiter.

use crate::entry::LogEntry;
use crate::error::{Result, RingLogError};

/// Field separator
pub const DELIMITER: char = '|';

/// Number of fields in a record
pub const FIELD_COUNT: usize = 4;

// =============================================================================
// Encoding
// =============================================================================

/// Encode an entry into record bytes
///
/// Format: timestamp|level|tag|message
pub fn encode_entry(entry: &LogEntry) -> Result<Vec<u8>> {
    validate_entry(entry)?;

    let fields = [entry.timestamp(), entry.level(), entry.tag(), entry.message()];
    let len = fields.iter().map(|f| f.len()).sum::<usize>() + FIELD_COUNT - 1;

    let mut record = String::with_capacity(len);
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            record.push(DELIMITER);
        }
        record.push_str(field);
    }

    Ok(record.into_bytes())
}

/// Check that an entry's leading fields are free of the delimiter
pub fn validate_entry(entry: &LogEntry) -> Result<()> {
    check_field("timestamp", entry.timestamp())?;
    check_field("level", entry.level())?;
    check_field("tag", entry.tag())
}

/// Check that a tag can be written into records
pub fn validate_tag(tag: &str) -> Result<()> {
    check_field("tag", tag)
}

fn check_field(name: &str, value: &str) -> Result<()> {
    if value.contains(DELIMITER) {
        return Err(RingLogError::Validation(format!(
            "{} must not contain '{}': {:?}",
            name, DELIMITER, value
        )));
    }
    Ok(())
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode record bytes into an entry
pub fn decode_entry(bytes: &[u8]) -> Result<LogEntry> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| RingLogError::Format(format!("Record is not valid UTF-8: {}", e)))?;

    let mut parts = text.splitn(FIELD_COUNT, DELIMITER);
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(timestamp), Some(level), Some(tag), Some(message)) => {
            Ok(LogEntry::new(timestamp, level, tag, message))
        }
        _ => Err(RingLogError::Format(format!(
            "Expected {} fields, got {}",
            FIELD_COUNT,
            text.split(DELIMITER).count()
        ))),
    }
}
