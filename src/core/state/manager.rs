//! Checkpoint store backed by JSON files
//!
//! Checkpoints live next to the exported pages as
//! `{output_dir}/.checkpoint-{site_id}-{record_type}.json`. Writes go to a
//! temporary file first and are renamed into place.

use super::checkpoint::Checkpoint;
use crate::domain::{LappsError, RecordType, Result, SiteId};
use std::path::{Path, PathBuf};

const CHECKPOINT_PREFIX: &str = ".checkpoint-";

/// Loads and saves checkpoints in a directory
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Store rooted at `dir` (usually the export output directory)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the checkpoints
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the checkpoint of a `{site_id, record_type}` pair
    pub fn path_for(&self, site_id: SiteId, record_type: RecordType) -> PathBuf {
        self.dir
            .join(format!("{CHECKPOINT_PREFIX}{site_id}-{record_type}.json"))
    }

    /// Load a checkpoint
    ///
    /// Returns `Ok(None)` if no checkpoint exists yet.
    ///
    /// # Errors
    ///
    /// Returns a state error if the file exists but cannot be read or parsed.
    pub async fn load(
        &self,
        site_id: SiteId,
        record_type: RecordType,
    ) -> Result<Option<Checkpoint>> {
        let path = self.path_for(site_id, record_type);
        match tokio::fs::read(&path).await {
            Ok(bytes) => read_checkpoint(&path, &bytes).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LappsError::State(format!(
                "Failed to read checkpoint {}: {e}",
                path.display()
            ))),
        }
    }

    /// Save a checkpoint, replacing any previous one for the same pair
    ///
    /// # Errors
    ///
    /// Returns a state error if the directory or file cannot be written.
    pub async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let path = self.path_for(checkpoint.site_id, checkpoint.record_type);
        let bytes = serde_json::to_vec_pretty(checkpoint)?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            LappsError::State(format!(
                "Failed to create checkpoint directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await.map_err(|e| {
            LappsError::State(format!("Failed to write checkpoint {}: {e}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            LappsError::State(format!("Failed to move checkpoint {}: {e}", path.display()))
        })?;

        tracing::debug!(
            site_id = %checkpoint.site_id,
            record_type = %checkpoint.record_type,
            cursor = %checkpoint.cursor,
            pages = checkpoint.pages_exported,
            "Checkpoint saved"
        );
        Ok(())
    }

    /// All checkpoints in the directory, ordered by site and record type
    ///
    /// A missing directory yields an empty list. Unparsable files are skipped
    /// with a warning.
    pub async fn list(&self) -> Result<Vec<Checkpoint>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(LappsError::State(format!(
                    "Failed to list checkpoints in {}: {e}",
                    self.dir.display()
                )))
            }
        };

        let mut checkpoints = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_checkpoint = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(CHECKPOINT_PREFIX) && n.ends_with(".json"));
            if !is_checkpoint {
                continue;
            }

            let bytes = tokio::fs::read(&path).await?;
            match read_checkpoint(&path, &bytes) {
                Ok(checkpoint) => checkpoints.push(checkpoint),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping checkpoint"),
            }
        }

        checkpoints.sort_by_key(|c| (c.site_id.get(), c.record_type.as_str()));
        Ok(checkpoints)
    }
}

fn read_checkpoint(path: &Path, bytes: &[u8]) -> Result<Checkpoint> {
    serde_json::from_slice(bytes).map_err(|e| {
        LappsError::State(format!(
            "Failed to parse checkpoint {}: {e}",
            path.display()
        ))
    })
}
