//! Page persistence traits
//!
//! The export loop hands every fully parsed page to a [`PageSink`]. Sinks
//! decide where (or whether) pages are stored.

use crate::core::export::summary::ExportSummary;
use crate::domain::{Page, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a sink produced for one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageArtifact {
    /// Batch number of the page
    pub batch: u64,

    /// Number of records in the page
    pub records: usize,

    /// File the page was written to (None when nothing was written)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Hex SHA-256 of the written bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl PageArtifact {
    /// Artifact for a page that was counted but not stored
    pub fn unwritten(page: &Page) -> Self {
        Self {
            batch: page.batch,
            records: page.len(),
            path: None,
            sha256: None,
        }
    }
}

/// Destination for exported pages
#[async_trait]
pub trait PageSink: Send {
    /// Persist one page
    ///
    /// Called only with complete, successfully parsed pages. A sink must not
    /// leave a partially written page behind on error.
    ///
    /// # Errors
    ///
    /// Returns an I/O or serialization error if the page cannot be stored.
    async fn write_page(&mut self, page: &Page) -> Result<PageArtifact>;

    /// Called once after a run reaches end-of-stream
    ///
    /// Returns the path of any summary file written.
    async fn finish(&mut self, summary: &ExportSummary) -> Result<Option<PathBuf>>;
}

/// Sink that stores nothing (dry-run mode)
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl PageSink for NullSink {
    async fn write_page(&mut self, page: &Page) -> Result<PageArtifact> {
        tracing::debug!(
            batch = page.batch,
            records = page.len(),
            "Dry run: page not written"
        );
        Ok(PageArtifact::unwritten(page))
    }

    async fn finish(&mut self, _summary: &ExportSummary) -> Result<Option<PathBuf>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordType;
    use serde_json::json;

    #[tokio::test]
    async fn test_null_sink_counts_without_writing() {
        let record = json!({"id": 1}).as_object().cloned().unwrap();
        let page = Page::new(3, RecordType::Members, vec![record.clone(), record]);

        let mut sink = NullSink;
        let artifact = sink.write_page(&page).await.unwrap();

        assert_eq!(artifact.batch, 3);
        assert_eq!(artifact.records, 2);
        assert!(artifact.path.is_none());
        assert!(artifact.sha256.is_none());
    }
}
