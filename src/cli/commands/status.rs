//! Status command implementation
//!
//! This module implements the `status` command for displaying the saved
//! checkpoints in the output directory.

use crate::config::load_partial_config;
use crate::core::state::{CheckpointStatus, CheckpointStore};
use crate::domain::RecordType;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the status command
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Directory to inspect (defaults to export.output_dir)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Only show checkpoints of this site
    #[arg(long)]
    pub site_id: Option<u64>,

    /// Only show checkpoints of this record type
    #[arg(long = "type", value_name = "TYPE")]
    pub record_type: Option<RecordType>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking export status");

        println!("📊 Export Status");
        println!();

        let output_dir = match &self.output_dir {
            Some(dir) => dir.clone(),
            None => match load_partial_config(config_path) {
                Ok(config) => config.export.output_dir,
                Err(e) => {
                    println!("❌ Failed to load configuration file");
                    println!("   Error: {e}");
                    return Ok(2);
                }
            },
        };

        let store = CheckpointStore::new(&output_dir);
        let checkpoints = match store.list().await {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load checkpoints");
                println!("   Error: {e}");
                return Ok(5);
            }
        };

        let filtered: Vec<_> = checkpoints
            .iter()
            .filter(|c| self.site_id.map_or(true, |site| c.site_id.get() == site))
            .filter(|c| self.record_type.map_or(true, |t| c.record_type == t))
            .collect();

        if filtered.is_empty() {
            println!("No checkpoints found in {}.", output_dir.display());
            println!("Run 'lapps-export export' to start exporting data.");
            return Ok(0);
        }

        println!("Found {} checkpoint(s):", filtered.len());
        println!();
        println!(
            "{:<10} {:<16} {:<15} {:<10} {:<12} {:<36} {:<20}",
            "Site", "Type", "Status", "Pages", "Records", "Cursor", "Updated"
        );
        println!("{}", "-".repeat(120));

        for checkpoint in filtered {
            let status = match checkpoint.status {
                CheckpointStatus::Completed => "✅ Completed",
                CheckpointStatus::InProgress => "🔄 In Progress",
                CheckpointStatus::Failed => "❌ Failed",
            };

            println!(
                "{:<10} {:<16} {:<15} {:<10} {:<12} {:<36} {:<20}",
                checkpoint.site_id,
                checkpoint.record_type,
                status,
                checkpoint.pages_exported,
                checkpoint.records_exported,
                checkpoint.cursor,
                checkpoint.updated_at.format("%Y-%m-%d %H:%M:%S")
            );
        }

        println!();
        Ok(0)
    }
}
