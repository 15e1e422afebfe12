// lapps-export - LeagueApps data export client
// Licensed under the MIT License

//! # lapps-export
//!
//! Client for the LeagueApps data export API. It authenticates with a signed
//! JWT bearer assertion, then walks the export endpoint page by page with a
//! `(last-updated, last-id)` cursor until the server returns an empty page.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export loop, retry classification and backoff, checkpoints
//! - [`adapters`] - LeagueApps HTTP client and page sinks
//! - [`domain`] - Core domain types (ids, records, cursor, errors)
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lapps_export::adapters::leagueapps::LeagueAppsClient;
//! use lapps_export::adapters::output::JsonFileSink;
//! use lapps_export::config::load_config;
//! use lapps_export::core::export::{ExportOptions, Exporter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("lapps-export.toml")?;
//!     let site_id = config.api.site_id()?;
//!     let record_type = config.export.record_type()?;
//!
//!     let client = LeagueAppsClient::from_config(&config)?;
//!     let sink = JsonFileSink::new(&config.export.output_dir, record_type);
//!     let options = ExportOptions::new(site_id, record_type);
//!
//!     let summary = Exporter::new(client, sink, options).run().await;
//!     println!("Exported {} records", summary.total_records);
//!     std::process::exit(summary.exit_code());
//! }
//! ```
//!
//! ## Retry Behaviour
//!
//! | Response            | Action                                        |
//! |---------------------|-----------------------------------------------|
//! | 200                 | persist the page, advance the cursor          |
//! | 401                 | drop the token, re-authenticate at once       |
//! | 429, 5xx, timeout   | sleep a randomized exponential backoff, retry |
//! | anything else       | abort                                         |
//!
//! Five consecutive attempts without progress abort the run.
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`], whose error type
//! [`domain::LappsError`] maps to the process exit code.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
