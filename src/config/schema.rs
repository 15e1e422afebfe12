//! Configuration schema types
//!
//! This module defines the configuration structure for the exporter. Every
//! section has serde defaults so a partial file (or no file at all, with the
//! required values supplied by flags or environment) still deserializes.

use crate::domain::cursor::Cursor;
use crate::domain::ids::{ClientId, SiteId};
use crate::domain::record::RecordType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Audience the token endpoint expects in every assertion
pub const DEFAULT_AUDIENCE: &str = "https://auth.leagueapps.io/v2/auth/token";

/// Production domain
pub const DEFAULT_DOMAIN: &str = "leagueapps.io";

/// Longest accepted backoff slot, in seconds
pub const MAX_SLOT_TIME_SECS: f64 = 3600.0;

/// Local development domain, served over plain HTTP on port 8082
pub const LOCAL_DOMAIN: &str = "lapps-local.io";

/// Main exporter configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LappsConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Token endpoint and credentials
    #[serde(default)]
    pub auth: AuthConfig,

    /// Admin API location
    #[serde(default)]
    pub api: ApiConfig,

    /// Export loop settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LappsConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error describing the first missing or invalid value
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.auth.validate()?;
        self.api.validate()?;
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Base URL of the token server
    ///
    /// An explicit `auth.auth_host` wins; otherwise `https://auth.{domain}`.
    pub fn auth_host(&self) -> String {
        match &self.auth.auth_host {
            Some(host) => host.trim_end_matches('/').to_string(),
            None => format!("https://auth.{}", self.api.domain),
        }
    }

    /// Base URL of the admin API
    pub fn admin_host(&self) -> String {
        if let Some(host) = &self.api.admin_host {
            return host.trim_end_matches('/').to_string();
        }
        if self.api.domain == LOCAL_DOMAIN {
            format!("http://admin.{}:8082", self.api.domain)
        } else {
            format!("https://admin.{}", self.api.domain)
        }
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Token endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// OAuth client id (`iss` and `sub` of the assertion)
    #[serde(default)]
    pub client_id: Option<String>,

    /// Path of the PEM-encoded RSA private key
    #[serde(default)]
    pub pem_file: Option<PathBuf>,

    /// Token server override (defaults to `https://auth.{domain}`)
    #[serde(default)]
    pub auth_host: Option<String>,

    /// `aud` claim of the assertion
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Assertion lifetime in seconds (`exp - iat`)
    #[serde(default = "default_token_lifetime_secs")]
    pub token_lifetime_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            pem_file: None,
            auth_host: None,
            audience: default_audience(),
            token_lifetime_secs: default_token_lifetime_secs(),
        }
    }
}

impl AuthConfig {
    /// Typed client id
    pub fn client_id(&self) -> Result<ClientId, String> {
        let raw = self
            .client_id
            .as_deref()
            .ok_or_else(|| "auth.client_id is required".to_string())?;
        ClientId::new(raw)
    }

    /// Path of the signing key
    pub fn pem_file(&self) -> Result<&Path, String> {
        self.pem_file
            .as_deref()
            .ok_or_else(|| "auth.pem_file is required".to_string())
    }

    fn validate(&self) -> Result<(), String> {
        self.client_id()?;
        self.pem_file()?;

        if let Some(host) = &self.auth_host {
            validate_url("auth.auth_host", host)?;
        }

        if self.audience.trim().is_empty() {
            return Err("auth.audience cannot be empty".to_string());
        }

        if self.token_lifetime_secs == 0 || self.token_lifetime_secs > 3600 {
            return Err(format!(
                "auth.token_lifetime_secs must be between 1 and 3600, got {}",
                self.token_lifetime_secs
            ));
        }

        Ok(())
    }
}

/// Admin API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Site whose records are exported
    #[serde(default)]
    pub site_id: Option<u64>,

    /// Domain used to derive the auth and admin hosts
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Admin host override (defaults to `https://admin.{domain}`)
    #[serde(default)]
    pub admin_host: Option<String>,

    /// Per-request timeout for page fetches
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            site_id: None,
            domain: default_domain(),
            admin_host: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Typed site id
    pub fn site_id(&self) -> Result<SiteId, String> {
        let raw = self
            .site_id
            .ok_or_else(|| "api.site_id is required".to_string())?;
        SiteId::new(raw)
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<(), String> {
        self.site_id()?;

        if self.domain.trim().is_empty() || self.domain.contains('/') {
            return Err(format!("Invalid api.domain '{}'", self.domain));
        }

        if let Some(host) = &self.admin_host {
            validate_url("api.admin_host", host)?;
        }

        if self.request_timeout_secs == 0 {
            return Err("api.request_timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Export loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Type of records to export
    #[serde(default)]
    pub record_type: Option<RecordType>,

    /// Initial `last-updated` cursor value
    #[serde(default)]
    pub last_updated: i64,

    /// Initial `last-id` cursor value
    #[serde(default)]
    pub last_id: i64,

    /// Directory receiving page files, the manifest and checkpoints
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Fetch pages without writing them
    #[serde(default)]
    pub dry_run: bool,

    /// Seed the cursor from the last checkpoint
    #[serde(default)]
    pub resume: bool,

    /// Consecutive non-progressing attempts before the run is aborted
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff slot length in seconds
    #[serde(default = "default_slot_time_secs")]
    pub slot_time_secs: f64,

    /// Cap on the backoff exponent (0 = uncapped)
    #[serde(default = "default_max_slots")]
    pub max_slots: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            record_type: None,
            last_updated: 0,
            last_id: 0,
            output_dir: default_output_dir(),
            dry_run: false,
            resume: false,
            max_attempts: default_max_attempts(),
            slot_time_secs: default_slot_time_secs(),
            max_slots: default_max_slots(),
        }
    }
}

impl ExportConfig {
    /// Typed record type
    pub fn record_type(&self) -> Result<RecordType, String> {
        self.record_type
            .ok_or_else(|| "export.record_type is required".to_string())
    }

    /// Cursor of the first request
    pub fn initial_cursor(&self) -> Cursor {
        Cursor::new(self.last_updated, self.last_id)
    }

    fn validate(&self) -> Result<(), String> {
        self.record_type()?;

        if self.last_updated < 0 || self.last_id < 0 {
            return Err(format!(
                "export.last_updated and export.last_id must not be negative, got ({}, {})",
                self.last_updated, self.last_id
            ));
        }

        if self.max_attempts == 0 || self.max_attempts > 20 {
            return Err(format!(
                "export.max_attempts must be between 1 and 20, got {}",
                self.max_attempts
            ));
        }

        if !self.slot_time_secs.is_finite()
            || self.slot_time_secs < 0.0
            || self.slot_time_secs > MAX_SLOT_TIME_SECS
        {
            return Err(format!(
                "export.slot_time_secs must be between 0 and {MAX_SLOT_TIME_SECS}, got {}",
                self.slot_time_secs
            ));
        }

        if self.max_slots > 16 {
            return Err(format!(
                "export.max_slots must be at most 16, got {}",
                self.max_slots
            ));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err("export.output_dir cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path is required when local logging is enabled".to_string());
        }

        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> Result<(), String> {
    let parsed = url::Url::parse(value).map_err(|e| format!("Invalid {field} '{value}': {e}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!(
            "Invalid {field} '{value}': scheme must be http or https, got {other}"
        )),
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_audience() -> String {
    DEFAULT_AUDIENCE.to_string()
}

fn default_token_lifetime_secs() -> u64 {
    300
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("export")
}

fn default_max_attempts() -> u32 {
    5
}

fn default_slot_time_secs() -> f64 {
    1.42
}

fn default_max_slots() -> u32 {
    5
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
