//! Exported record types
//!
//! Records are kept as raw JSON objects; the exporter only looks at the
//! pagination fields (`id`, `lastUpdated`) and otherwise writes records
//! through untouched.

use crate::domain::ids::SiteId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A single exported record (field name to value)
pub type Record = Map<String, Value>;

/// Kinds of records the export endpoint can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// Program registrations
    #[serde(rename = "registrations-2")]
    Registrations,
    /// Site members
    #[serde(rename = "members-2")]
    Members,
    /// Financial transactions
    #[serde(rename = "transactions-2")]
    Transactions,
    /// Accounting codes (unpaginated)
    #[serde(rename = "accountingCodes")]
    AccountingCodes,
}

impl RecordType {
    /// All supported record types
    pub const ALL: [RecordType; 4] = [
        RecordType::Registrations,
        RecordType::Members,
        RecordType::Transactions,
        RecordType::AccountingCodes,
    ];

    /// Name used in URLs and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Registrations => "registrations-2",
            RecordType::Members => "members-2",
            RecordType::Transactions => "transactions-2",
            RecordType::AccountingCodes => "accountingCodes",
        }
    }

    /// Whether the endpoint pages by `(lastUpdated, id)`
    ///
    /// Unpaginated endpoints return their whole result set in one response
    /// and their records carry no pagination metadata.
    pub fn is_paginated(&self) -> bool {
        !matches!(self, RecordType::AccountingCodes)
    }

    /// Path of the endpoint serving this record type, relative to the admin host
    pub fn endpoint_path(&self, site_id: SiteId) -> String {
        if self.is_paginated() {
            format!("/v2/sites/{site_id}/export/{}", self.as_str())
        } else {
            format!("/v2/sites/{site_id}/{}", self.as_str())
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = RecordType::ALL.iter().map(|t| t.as_str()).collect();
                format!(
                    "Unsupported record type '{s}'. Must be one of: {}",
                    names.join(", ")
                )
            })
    }
}

/// One successfully fetched, non-empty page of records
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based batch number within the run
    pub batch: u64,

    /// Record type the page belongs to
    pub record_type: RecordType,

    /// Records in response order
    pub records: Vec<Record>,
}

impl Page {
    /// Create a new page
    pub fn new(batch: u64, record_type: RecordType, records: Vec<Record>) -> Self {
        Self {
            batch,
            record_type,
            records,
        }
    }

    /// Number of records in the page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the page holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
