//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::LappsConfig;
use crate::domain::errors::LappsError;
use crate::domain::record::RecordType;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Loads and validates configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`LappsConfig`]
/// 4. Applies environment variable overrides (`LAPPS_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if the file is missing or unreadable, a
/// referenced environment variable is unset, parsing fails, or validation
/// fails.
///
/// # Examples
///
/// ```no_run
/// use lapps_export::config::loader::load_config;
///
/// let config = load_config("lapps-export.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<LappsConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(LappsError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let config = load_partial_config(path)?;

    config.validate().map_err(|e| {
        LappsError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Loads configuration without validating it
///
/// A missing file yields the defaults, so required values may come entirely
/// from environment variables or command-line flags. The caller applies its
/// own overrides and then calls [`LappsConfig::validate`].
pub fn load_partial_config(path: impl AsRef<Path>) -> Result<LappsConfig> {
    let path = path.as_ref();

    let mut config = if path.exists() {
        let contents = fs::read_to_string(path).map_err(|e| {
            LappsError::Configuration(format!(
                "Failed to read configuration file {}: {e}",
                path.display()
            ))
        })?;

        let contents = substitute_env_vars(&contents)?;

        toml::from_str(&contents)
            .map_err(|e| LappsError::Configuration(format!("Failed to parse TOML: {e}")))?
    } else {
        tracing::debug!(
            path = %path.display(),
            "Configuration file not found, starting from defaults"
        );
        LappsConfig::default()
    };

    apply_env_overrides(&mut config)?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left alone.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| LappsError::Other(format!("invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(LappsError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the `LAPPS_*` prefix
///
/// Every scalar key can be overridden. Variables follow the pattern
/// `LAPPS_<SECTION>_<KEY>`, for example `LAPPS_API_SITE_ID` or
/// `LAPPS_EXPORT_RECORD_TYPE`; `auth.auth_host` is `LAPPS_AUTH_HOST`.
///
/// # Errors
///
/// Returns an error if a variable is set but cannot be parsed
fn apply_env_overrides(config: &mut LappsConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("LAPPS_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Auth overrides
    if let Ok(val) = std::env::var("LAPPS_AUTH_CLIENT_ID") {
        config.auth.client_id = Some(val);
    }
    if let Ok(val) = std::env::var("LAPPS_AUTH_PEM_FILE") {
        config.auth.pem_file = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var("LAPPS_AUTH_HOST") {
        config.auth.auth_host = Some(val);
    }
    if let Ok(val) = std::env::var("LAPPS_AUTH_AUDIENCE") {
        config.auth.audience = val;
    }
    if let Some(lifetime) = parse_env("LAPPS_AUTH_TOKEN_LIFETIME_SECS")? {
        config.auth.token_lifetime_secs = lifetime;
    }

    // API overrides
    if let Some(site_id) = parse_env("LAPPS_API_SITE_ID")? {
        config.api.site_id = Some(site_id);
    }
    if let Ok(val) = std::env::var("LAPPS_API_DOMAIN") {
        config.api.domain = val;
    }
    if let Ok(val) = std::env::var("LAPPS_API_ADMIN_HOST") {
        config.api.admin_host = Some(val);
    }
    if let Some(timeout) = parse_env("LAPPS_API_REQUEST_TIMEOUT_SECS")? {
        config.api.request_timeout_secs = timeout;
    }

    // Export overrides
    if let Ok(val) = std::env::var("LAPPS_EXPORT_RECORD_TYPE") {
        let record_type = val
            .parse::<RecordType>()
            .map_err(LappsError::Configuration)?;
        config.export.record_type = Some(record_type);
    }
    if let Some(last_updated) = parse_env("LAPPS_EXPORT_LAST_UPDATED")? {
        config.export.last_updated = last_updated;
    }
    if let Some(last_id) = parse_env("LAPPS_EXPORT_LAST_ID")? {
        config.export.last_id = last_id;
    }
    if let Ok(val) = std::env::var("LAPPS_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = PathBuf::from(val);
    }
    if let Some(dry_run) = parse_env("LAPPS_EXPORT_DRY_RUN")? {
        config.export.dry_run = dry_run;
    }
    if let Some(resume) = parse_env("LAPPS_EXPORT_RESUME")? {
        config.export.resume = resume;
    }
    if let Some(max_attempts) = parse_env("LAPPS_EXPORT_MAX_ATTEMPTS")? {
        config.export.max_attempts = max_attempts;
    }
    if let Some(slot_time) = parse_env("LAPPS_EXPORT_SLOT_TIME_SECS")? {
        config.export.slot_time_secs = slot_time;
    }
    if let Some(max_slots) = parse_env("LAPPS_EXPORT_MAX_SLOTS")? {
        config.export.max_slots = max_slots;
    }

    // Logging overrides
    if let Some(enabled) = parse_env("LAPPS_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = enabled;
    }
    if let Ok(val) = std::env::var("LAPPS_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("LAPPS_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            LappsError::Configuration(format!("Invalid value for {name}: '{val}'"))
        }),
        Err(_) => Ok(None),
    }
}
