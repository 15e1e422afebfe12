//! Export command implementation
//!
//! This module implements the `export` command: resolve configuration from
//! file, environment and flags, then run the export loop for one record type.

use crate::adapters::leagueapps::LeagueAppsClient;
use crate::adapters::output::{JsonFileSink, NullSink, PageSink};
use crate::config::{load_partial_config, LappsConfig};
use crate::core::export::{ExportOptions, ExportSummary, Exporter};
use crate::core::retry::RetryPolicy;
use crate::core::state::CheckpointStore;
use crate::domain::RecordType;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the export command
///
/// Every flag overrides the matching configuration file or `LAPPS_*` value.
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Site to export from
    #[arg(long)]
    pub site_id: Option<u64>,

    /// Client id registered for API access
    #[arg(long)]
    pub client_id: Option<String>,

    /// Path to the client's RSA private key (PEM)
    #[arg(long)]
    pub pem_file: Option<PathBuf>,

    /// Record type (registrations-2, members-2, transactions-2, accountingCodes)
    #[arg(long = "type", value_name = "TYPE")]
    pub record_type: Option<RecordType>,

    /// LeagueApps domain (e.g. leagueapps.io)
    #[arg(long)]
    pub domain: Option<String>,

    /// Token server base URL (defaults to https://auth.{domain})
    #[arg(long = "auth", value_name = "URL")]
    pub auth_host: Option<String>,

    /// Initial last-updated cursor value
    #[arg(long)]
    pub last_updated: Option<i64>,

    /// Initial last-id cursor value
    #[arg(long)]
    pub last_id: Option<i64>,

    /// Directory receiving page files
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Fetch and count pages without writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Continue from the saved checkpoint (explicit cursor flags win)
    #[arg(long)]
    pub resume: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_partial_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("❌ Failed to load configuration: {e}");
                return Ok(e.exit_code());
            }
        };

        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("❌ Configuration validation failed: {e}");
            return Ok(2);
        }

        let site_id = config.api.site_id().map_err(anyhow::Error::msg)?;
        let record_type = config.export.record_type().map_err(anyhow::Error::msg)?;
        let store = CheckpointStore::new(&config.export.output_dir);

        let mut cursor = config.export.initial_cursor();
        if config.export.resume && !self.cursor_given() && record_type.is_paginated() {
            match store.load(site_id, record_type).await {
                Ok(Some(checkpoint)) => {
                    tracing::info!(
                        cursor = %checkpoint.cursor,
                        last_run_id = %checkpoint.last_run_id,
                        "Resuming from checkpoint"
                    );
                    println!("↩️  Resuming from checkpoint: {}", checkpoint.cursor);
                    cursor = checkpoint.cursor;
                }
                Ok(None) => {
                    tracing::info!("No checkpoint found, starting from configured cursor");
                }
                Err(e) => {
                    eprintln!("❌ Failed to load checkpoint: {e}");
                    return Ok(e.exit_code());
                }
            }
        }

        let client = match LeagueAppsClient::from_config(&config) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create LeagueApps client");
                eprintln!("❌ Failed to initialize export: {e}");
                return Ok(e.exit_code());
            }
        };

        let policy = match RetryPolicy::from_config(&config.export) {
            Ok(policy) => policy,
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {e}");
                return Ok(e.exit_code());
            }
        };

        let options = ExportOptions::new(site_id, record_type)
            .with_cursor(cursor)
            .with_policy(policy)
            .with_dry_run(config.export.dry_run);

        if options.dry_run {
            println!("🔍 DRY RUN MODE - pages will be fetched but not written");
            println!();
        }
        println!(
            "🚀 Exporting {record_type} for site {site_id} from {}",
            client.admin_host()
        );
        println!();

        let summary = if options.dry_run {
            run(client, NullSink, options, None).await
        } else {
            let sink = JsonFileSink::new(&config.export.output_dir, record_type);
            run(client, sink, options, Some(store)).await
        };

        print_summary(&summary);
        Ok(summary.exit_code())
    }

    fn cursor_given(&self) -> bool {
        self.last_updated.is_some() || self.last_id.is_some()
    }

    /// Apply command-line values on top of file and environment configuration
    pub fn apply_overrides(&self, config: &mut LappsConfig) {
        if let Some(site_id) = self.site_id {
            config.api.site_id = Some(site_id);
        }
        if let Some(client_id) = &self.client_id {
            config.auth.client_id = Some(client_id.clone());
        }
        if let Some(pem_file) = &self.pem_file {
            config.auth.pem_file = Some(pem_file.clone());
        }
        if let Some(record_type) = self.record_type {
            config.export.record_type = Some(record_type);
        }
        if let Some(domain) = &self.domain {
            config.api.domain = domain.clone();
        }
        if let Some(auth_host) = &self.auth_host {
            config.auth.auth_host = Some(auth_host.clone());
        }
        if let Some(last_updated) = self.last_updated {
            config.export.last_updated = last_updated;
        }
        if let Some(last_id) = self.last_id {
            config.export.last_id = last_id;
        }
        if let Some(output_dir) = &self.output_dir {
            config.export.output_dir = output_dir.clone();
        }
        if self.dry_run {
            config.export.dry_run = true;
        }
        if self.resume {
            config.export.resume = true;
        }
    }
}

async fn run<S: PageSink>(
    client: LeagueAppsClient,
    sink: S,
    options: ExportOptions,
    store: Option<CheckpointStore>,
) -> ExportSummary {
    let exporter = Exporter::new(client, sink, options);
    match store {
        Some(store) => exporter.with_checkpoints(store).run().await,
        None => exporter.run().await,
    }
}

fn print_summary(summary: &ExportSummary) {
    println!();
    println!("📊 Export Summary:");
    println!("  Run ID: {}", summary.run_id);
    println!("  Pages: {}", summary.pages.len());
    println!("  Records: {}", summary.total_records);
    println!("  Requests: {}", summary.requests_issued);
    println!("  Token Requests: {}", summary.tokens_requested);
    println!(
        "  Retries: {} ({:.2}s backing off)",
        summary.retries.len(),
        summary.total_backoff().as_secs_f64()
    );
    println!("  Final Cursor: {}", summary.final_cursor);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    if let Some(manifest) = &summary.manifest_path {
        println!("  Manifest: {}", manifest.display());
    }
    println!();

    match &summary.error {
        None => println!("✅ Export completed successfully!"),
        Some(error) => {
            println!("❌ Export aborted: {error}");
            if summary.final_cursor != summary.initial_cursor {
                println!(
                    "   Re-run with --resume (or --last-updated {} --last-id {}) to continue.",
                    summary.final_cursor.last_updated, summary.final_cursor.last_id
                );
            }
        }
    }
}
