//! Core export logic.
//!
//! # Modules
//!
//! - [`retry`] - response classification and randomized backoff
//! - [`export`] - the export loop and its summary
//! - [`state`] - checkpoints for resumable runs
//!
//! # Export Workflow
//!
//! 1. **Authenticate**: sign an RS256 assertion and exchange it for a token
//! 2. **Fetch**: request the page at the current cursor
//! 3. **Classify**: advance on 200, re-authenticate on 401, back off on
//!    429/5xx/timeouts, abort on anything else
//! 4. **Persist**: hand the page to the sink and move the cursor to its last record
//! 5. **Checkpoint**: save the cursor so an interrupted run can resume
//! 6. **Report**: an empty page ends the run; the summary says how it went
//!
//! # Example
//!
//! ```rust,no_run
//! use lapps_export::adapters::leagueapps::LeagueAppsClient;
//! use lapps_export::adapters::output::JsonFileSink;
//! use lapps_export::config::load_config;
//! use lapps_export::core::export::{ExportOptions, Exporter};
//! use lapps_export::core::retry::RetryPolicy;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("lapps-export.toml")?;
//! let client = LeagueAppsClient::from_config(&config)?;
//! let site_id = config.api.site_id()?;
//! let record_type = config.export.record_type()?;
//!
//! let options = ExportOptions::new(site_id, record_type)
//!     .with_policy(RetryPolicy::from_config(&config.export)?);
//! let sink = JsonFileSink::new(&config.export.output_dir, record_type);
//!
//! let summary = Exporter::new(client, sink, options).run().await;
//! println!("Exported {} records", summary.total_records);
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod retry;
pub mod state;
