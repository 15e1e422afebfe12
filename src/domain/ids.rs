//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers the LeagueApps API hands out, so a
//! site id can never be passed where a record id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// LeagueApps site identifier
///
/// # Examples
///
/// ```
/// use lapps_export::domain::ids::SiteId;
/// use std::str::FromStr;
///
/// let site = SiteId::from_str("42").unwrap();
/// assert_eq!(site.get(), 42);
/// assert!(SiteId::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct SiteId(u64);

impl SiteId {
    /// Creates a new SiteId, rejecting zero
    pub fn new(id: u64) -> Result<Self, String> {
        if id == 0 {
            return Err("Site ID must be a positive integer".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the numeric site id
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SiteId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("Invalid site ID '{s}': expected a positive integer"))?;
        Self::new(id)
    }
}

impl TryFrom<u64> for SiteId {
    type Error = String;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SiteId> for u64 {
    fn from(id: SiteId) -> Self {
        id.0
    }
}

/// OAuth client identifier
///
/// Used as both `iss` and `sub` of the bearer assertion. Usually matches the
/// basename of the certificate file issued for the site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);

impl ClientId {
    /// Creates a new ClientId, rejecting blank values
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Client ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the client id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClientId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ClientId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_id_valid() {
        let site = SiteId::new(42).unwrap();
        assert_eq!(site.get(), 42);
        assert_eq!(site.to_string(), "42");
    }

    #[test]
    fn test_site_id_rejects_zero() {
        assert!(SiteId::new(0).is_err());
        assert!(SiteId::from_str("0").is_err());
    }

    #[test]
    fn test_site_id_from_str() {
        assert_eq!(SiteId::from_str(" 7 ").unwrap().get(), 7);
        assert!(SiteId::from_str("-1").is_err());
        assert!(SiteId::from_str("abc").is_err());
    }

    #[test]
    fn test_site_id_serde() {
        let site: SiteId = serde_json::from_str("42").unwrap();
        assert_eq!(site.get(), 42);
        assert_eq!(serde_json::to_string(&site).unwrap(), "42");
        assert!(serde_json::from_str::<SiteId>("0").is_err());
    }

    #[test]
    fn test_client_id_valid() {
        let client = ClientId::new("site-42-export").unwrap();
        assert_eq!(client.as_str(), "site-42-export");
    }

    #[test]
    fn test_client_id_rejects_blank() {
        assert!(ClientId::new("").is_err());
        assert!(ClientId::new("   ").is_err());
    }
}
