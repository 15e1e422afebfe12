//! Bearer access token

use std::fmt;

/// Opaque bearer token returned by the token endpoint
///
/// The server expires tokens after roughly five minutes; the client treats a
/// token as valid until the export endpoint answers 401. `Debug` output is
/// redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token string
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Value for the `authorization` header
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// The raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}
