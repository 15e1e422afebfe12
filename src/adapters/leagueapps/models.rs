//! Wire models of the LeagueApps token endpoint

use serde::{Deserialize, Serialize};

/// Grant type of the JWT bearer flow (RFC 7523)
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Claims of the signed assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Token endpoint URL the assertion is meant for
    pub aud: String,

    /// Client id
    pub iss: String,

    /// Client id
    pub sub: String,

    /// Issued at (unix seconds)
    pub iat: i64,

    /// Expiry (unix seconds)
    pub exp: i64,
}

/// Form body posted to the token endpoint
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    /// Always [`JWT_BEARER_GRANT_TYPE`]
    pub grant_type: &'a str,

    /// Signed assertion
    pub assertion: &'a str,
}

/// Successful token endpoint response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for the admin API
    pub access_token: String,
}
