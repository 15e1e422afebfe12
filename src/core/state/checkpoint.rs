//! Checkpoint model for resumable exports
//!
//! A checkpoint records where the last run for a `{site_id, record_type}`
//! pair stopped, so a later run can pick up from the same cursor.

use crate::domain::{Cursor, RecordType, SiteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of the run that last touched a checkpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    /// Run is in progress (or died without finishing)
    #[default]
    InProgress,
    /// Run reached end-of-stream
    Completed,
    /// Run aborted
    Failed,
}

/// Persisted export progress per `{site_id, record_type}`
///
/// # Examples
///
/// ```
/// use lapps_export::core::state::{Checkpoint, CheckpointStatus};
/// use lapps_export::domain::{Cursor, RecordType, SiteId};
/// use uuid::Uuid;
///
/// let site = SiteId::new(42).unwrap();
/// let mut checkpoint = Checkpoint::new(site, RecordType::Members, Uuid::new_v4());
/// checkpoint.record_page(Cursor::new(150, 2), 1000);
///
/// assert_eq!(checkpoint.cursor, Cursor::new(150, 2));
/// assert_eq!(checkpoint.status, CheckpointStatus::InProgress);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Site being exported
    pub site_id: SiteId,

    /// Record type being exported
    pub record_type: RecordType,

    /// Cursor after the last persisted page
    pub cursor: Cursor,

    /// Pages persisted by the last run
    pub pages_exported: u64,

    /// Records persisted by the last run
    pub records_exported: u64,

    /// Last time this checkpoint was written
    pub updated_at: DateTime<Utc>,

    /// Run that wrote this checkpoint
    pub last_run_id: Uuid,

    /// Status of that run
    pub status: CheckpointStatus,
}

impl Checkpoint {
    /// Fresh checkpoint for a run starting now
    pub fn new(site_id: SiteId, record_type: RecordType, run_id: Uuid) -> Self {
        Self {
            site_id,
            record_type,
            cursor: Cursor::default(),
            pages_exported: 0,
            records_exported: 0,
            updated_at: Utc::now(),
            last_run_id: run_id,
            status: CheckpointStatus::InProgress,
        }
    }

    /// Move the checkpoint past a persisted page
    pub fn record_page(&mut self, cursor: Cursor, records: usize) {
        self.cursor = cursor;
        self.pages_exported += 1;
        self.records_exported += records as u64;
        self.updated_at = Utc::now();
    }

    /// Mark the run as having reached end-of-stream
    pub fn mark_completed(&mut self) {
        self.status = CheckpointStatus::Completed;
        self.updated_at = Utc::now();
    }

    /// Mark the run as aborted
    pub fn mark_failed(&mut self) {
        self.status = CheckpointStatus::Failed;
        self.updated_at = Utc::now();
    }

    /// Whether the last run reached end-of-stream
    pub fn is_completed(&self) -> bool {
        self.status == CheckpointStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoint() -> Checkpoint {
        Checkpoint::new(SiteId::new(7).unwrap(), RecordType::Transactions, Uuid::new_v4())
    }

    #[test]
    fn test_new_checkpoint_starts_at_zero() {
        let checkpoint = checkpoint();
        assert_eq!(checkpoint.cursor, Cursor::default());
        assert_eq!(checkpoint.pages_exported, 0);
        assert_eq!(checkpoint.status, CheckpointStatus::InProgress);
        assert!(!checkpoint.is_completed());
    }

    #[test]
    fn test_record_page_accumulates() {
        let mut checkpoint = checkpoint();
        checkpoint.record_page(Cursor::new(100, 1), 1000);
        checkpoint.record_page(Cursor::new(200, 9), 3);

        assert_eq!(checkpoint.cursor, Cursor::new(200, 9));
        assert_eq!(checkpoint.pages_exported, 2);
        assert_eq!(checkpoint.records_exported, 1003);
    }

    #[test]
    fn test_status_transitions() {
        let mut checkpoint = checkpoint();
        checkpoint.mark_failed();
        assert_eq!(checkpoint.status, CheckpointStatus::Failed);
        checkpoint.mark_completed();
        assert!(checkpoint.is_completed());
    }

    #[test]
    fn test_checkpoint_json_shape() {
        let mut checkpoint = checkpoint();
        checkpoint.record_page(Cursor::new(150, 2), 2);
        let json = serde_json::to_value(&checkpoint).unwrap();

        assert_eq!(json["site_id"], 7);
        assert_eq!(json["record_type"], "transactions-2");
        assert_eq!(json["cursor"]["last_updated"], 150);
        assert_eq!(json["status"], "in_progress");

        let back: Checkpoint = serde_json::from_value(json).unwrap();
        assert_eq!(back, checkpoint);
    }
}
