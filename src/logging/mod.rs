//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - console output for operators
//! - optional JSON file logging with rotation
//!
//! Access tokens and signing keys are never logged.
//!
//! # Example
//!
//! ```no_run
//! use lapps_export::logging::init_logging;
//! use lapps_export::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export run
///
/// # Example
///
/// ```no_run
/// use lapps_export::log_export_start;
/// use lapps_export::domain::{Cursor, RecordType, SiteId};
///
/// let site_id = SiteId::new(42).unwrap();
/// log_export_start!(site_id, RecordType::Members, Cursor::default());
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($site_id:expr, $record_type:expr, $cursor:expr) => {
        tracing::info!(
            site_id = %$site_id,
            record_type = %$record_type,
            cursor = %$cursor,
            "Starting export"
        );
    };
}

/// Log a persisted page
///
/// # Example
///
/// ```no_run
/// use lapps_export::log_page_exported;
/// use lapps_export::domain::Cursor;
///
/// log_page_exported!(3, 1000, Cursor::new(150, 2));
/// ```
#[macro_export]
macro_rules! log_page_exported {
    ($batch:expr, $records:expr, $cursor:expr) => {
        tracing::info!(
            batch = $batch,
            records = $records,
            cursor = %$cursor,
            "Page exported"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use lapps_export::log_error_with_context;
/// use lapps_export::domain::LappsError;
///
/// let error = LappsError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use lapps_export::log_retry_attempt;
///
/// log_retry_attempt!(2, 5, "status 503");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying request"
        );
    };
}
