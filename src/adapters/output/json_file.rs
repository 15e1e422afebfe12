//! JSON file sink
//!
//! Each page becomes `{output_dir}/{type}-{run_stamp}-{batch:05}.json`, a
//! pretty-printed JSON array of the page's records. The run stamp is the UTC
//! start time plus a random suffix, so runs started in the same second still
//! get distinct names; an existing file is never replaced. A
//! `{type}-{run_stamp}-manifest.json` listing every page and its SHA-256 is
//! written when the run reaches end-of-stream.

use super::traits::{PageArtifact, PageSink};
use crate::core::export::summary::ExportSummary;
use crate::domain::{Cursor, LappsError, Page, RecordType, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Writes pages as JSON files in a directory
#[derive(Debug)]
pub struct JsonFileSink {
    output_dir: PathBuf,
    record_type: RecordType,
    run_stamp: String,
    dir_ready: bool,
}

/// Contents of the manifest file
#[derive(Debug, Serialize)]
struct Manifest<'a> {
    run_id: Uuid,
    site_id: u64,
    record_type: RecordType,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    initial_cursor: Cursor,
    final_cursor: Cursor,
    total_records: usize,
    requests_issued: u32,
    retries: usize,
    pages: &'a [PageArtifact],
}

impl JsonFileSink {
    /// Sink writing into `output_dir`, stamped with the current time
    pub fn new(output_dir: impl Into<PathBuf>, record_type: RecordType) -> Self {
        Self::with_stamp(output_dir, record_type, Utc::now())
    }

    /// Sink whose file names carry the given run start time
    pub fn with_stamp(
        output_dir: impl Into<PathBuf>,
        record_type: RecordType,
        started_at: DateTime<Utc>,
    ) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        let run_stamp = format!("{}-{}", started_at.format("%Y%m%dT%H%M%SZ"), &suffix[..8]);
        Self::with_run_stamp(output_dir, record_type, run_stamp)
    }

    /// Sink using `run_stamp` verbatim in its file names
    pub fn with_run_stamp(
        output_dir: impl Into<PathBuf>,
        record_type: RecordType,
        run_stamp: impl Into<String>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            record_type,
            run_stamp: run_stamp.into(),
            dir_ready: false,
        }
    }

    /// Stamp shared by every file of this run
    pub fn run_stamp(&self) -> &str {
        &self.run_stamp
    }

    /// Directory pages are written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File a page with the given batch number is written to
    pub fn page_path(&self, batch: u64) -> PathBuf {
        self.output_dir.join(format!(
            "{}-{}-{batch:05}.json",
            self.record_type, self.run_stamp
        ))
    }

    /// File the manifest is written to
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}-{}-manifest.json", self.record_type, self.run_stamp))
    }

    async fn ensure_dir(&mut self) -> Result<()> {
        if !self.dir_ready {
            tokio::fs::create_dir_all(&self.output_dir)
                .await
                .map_err(|e| {
                    LappsError::Io(format!(
                        "Failed to create output directory {}: {e}",
                        self.output_dir.display()
                    ))
                })?;
            self.dir_ready = true;
        }
        Ok(())
    }
}

/// Write `bytes` to `path` through a temporary file so readers never see a partial file
///
/// Fails instead of replacing an existing `path`.
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| LappsError::Io(format!("Failed to inspect {}: {e}", path.display())))?;
    if exists {
        return Err(LappsError::Io(format!(
            "Refusing to overwrite existing file {}",
            path.display()
        )));
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| LappsError::Io(format!("Failed to write {}: {e}", tmp.display())))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(LappsError::Io(format!(
            "Failed to move {} into place: {e}",
            path.display()
        )));
    }
    Ok(())
}

#[async_trait]
impl PageSink for JsonFileSink {
    async fn write_page(&mut self, page: &Page) -> Result<PageArtifact> {
        self.ensure_dir().await?;

        let bytes = serde_json::to_vec_pretty(&page.records)?;
        let sha256 = format!("{:x}", Sha256::digest(&bytes));
        let path = self.page_path(page.batch);

        write_atomically(&path, &bytes).await?;

        tracing::debug!(
            path = %path.display(),
            records = page.len(),
            sha256 = %sha256,
            "Page written"
        );

        Ok(PageArtifact {
            batch: page.batch,
            records: page.len(),
            path: Some(path),
            sha256: Some(sha256),
        })
    }

    async fn finish(&mut self, summary: &ExportSummary) -> Result<Option<PathBuf>> {
        self.ensure_dir().await?;

        let manifest = Manifest {
            run_id: summary.run_id,
            site_id: summary.site_id.get(),
            record_type: summary.record_type,
            started_at: summary.started_at,
            finished_at: Utc::now(),
            initial_cursor: summary.initial_cursor,
            final_cursor: summary.final_cursor,
            total_records: summary.total_records,
            requests_issued: summary.requests_issued,
            retries: summary.retries.len(),
            pages: &summary.pages,
        };

        let path = self.manifest_path();
        write_atomically(&path, &serde_json::to_vec_pretty(&manifest)?).await?;

        tracing::info!(path = %path.display(), pages = summary.pages.len(), "Manifest written");
        Ok(Some(path))
    }
}
