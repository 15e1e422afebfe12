//! External system integrations.
//!
//! - [`leagueapps`] - token exchange and page retrieval against the LeagueApps API
//! - [`output`] - where exported pages go
//!
//! # Design Pattern
//!
//! Adapters sit behind traits ([`leagueapps::ExportApi`], [`output::PageSink`])
//! so the export loop can be driven by scripted implementations in tests.
//!
//! ```rust,no_run
//! use lapps_export::adapters::leagueapps::{ExportApi, LeagueAppsClient};
//! use lapps_export::config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("lapps-export.toml")?;
//! let client = LeagueAppsClient::from_config(&config)?;
//! let _token = client.obtain_token().await?;
//! # Ok(())
//! # }
//! ```

pub mod leagueapps;
pub mod output;
