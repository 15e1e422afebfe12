//! Result type alias for the exporter

use super::errors::LappsError;

/// Result type alias using [`LappsError`] as the error type
///
/// # Examples
///
/// ```
/// use lapps_export::domain::result::Result;
/// use lapps_export::domain::errors::LappsError;
///
/// fn parse_site(raw: &str) -> Result<u64> {
///     raw.parse()
///         .map_err(|_| LappsError::Validation(format!("not a site id: {raw}")))
/// }
///
/// assert!(parse_site("42").is_ok());
/// assert!(parse_site("x").is_err());
/// ```
pub type Result<T> = std::result::Result<T, LappsError>;
