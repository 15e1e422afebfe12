//! Pagination cursor
//!
//! The export endpoint pages by the `(lastUpdated, id)` pair of the last
//! record seen. After every successful page the cursor is moved to the last
//! record of that page and sent back as the `last-updated` and `last-id`
//! query parameters.

use crate::domain::errors::LappsError;
use crate::domain::record::Record;
use crate::domain::result::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Watermark used to request the next page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cursor {
    /// `lastUpdated` of the last record processed (epoch millis as sent by the API)
    pub last_updated: i64,

    /// `id` of the last record processed
    pub last_id: i64,
}

impl Cursor {
    /// Create a cursor from explicit values
    pub fn new(last_updated: i64, last_id: i64) -> Self {
        Self {
            last_updated,
            last_id,
        }
    }

    /// Query parameters for the export request
    pub fn query_params(&self) -> [(&'static str, String); 2] {
        [
            ("last-updated", self.last_updated.to_string()),
            ("last-id", self.last_id.to_string()),
        ]
    }

    /// Walk a page in response order, ending at the last record's watermark
    ///
    /// The cursor is only replaced once every record has been read, so a
    /// record missing its pagination fields leaves the cursor untouched.
    ///
    /// # Errors
    ///
    /// Returns [`LappsError::Serialization`] if a record lacks an integer
    /// `id` or `lastUpdated` field.
    pub fn advance_from(&mut self, records: &[Record]) -> Result<()> {
        let mut next = *self;
        for (index, record) in records.iter().enumerate() {
            next.last_updated = integer_field(record, "lastUpdated", index)?;
            next.last_id = integer_field(record, "id", index)?;
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "last-updated={}&last-id={}",
            self.last_updated, self.last_id
        )
    }
}

fn integer_field(record: &Record, field: &str, index: usize) -> Result<i64> {
    record.get(field).and_then(|v| v.as_i64()).ok_or_else(|| {
        LappsError::Serialization(format!(
            "record {index} has no integer '{field}' field needed for pagination"
        ))
    })
}
