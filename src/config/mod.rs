//! Configuration management for the exporter.
//!
//! Settings come from four layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file (default `lapps-export.toml`), with `${VAR_NAME}` substitution
//! 3. `LAPPS_<SECTION>_<KEY>` environment variables (a `.env` file is honored)
//! 4. Command-line flags
//!
//! # Example Configuration
//!
//! ```toml
//! [auth]
//! client_id = "my-site-client"
//! pem_file = "my-site-client.pem"
//!
//! [api]
//! site_id = 42
//! domain = "leagueapps.io"
//!
//! [export]
//! record_type = "members-2"
//! output_dir = "export"
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lapps_export::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("lapps-export.toml")?;
//! println!("Admin API: {}", config.admin_host());
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_partial_config};
pub use schema::{
    ApiConfig, ApplicationConfig, AuthConfig, ExportConfig, LappsConfig, LoggingConfig,
};
pub use secret::{read_signing_key, secret_string, SecretString, SecretValue};
