//! Token provider for the JWT bearer grant
//!
//! The client proves its identity by signing a short-lived assertion with its
//! RSA private key (RS256) and exchanging it at `{auth_host}/v2/auth/token`
//! for an opaque bearer token.

use super::models::{AssertionClaims, TokenRequest, TokenResponse, JWT_BEARER_GRANT_TYPE};
use crate::config::{read_signing_key, LappsConfig, SecretString};
use crate::domain::{AccessToken, ApiError, ClientId, LappsError, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use secrecy::ExposeSecret;

/// Builds assertions and exchanges them for access tokens
pub struct TokenProvider {
    http: Client,
    token_url: String,
    client_id: ClientId,
    audience: String,
    lifetime_secs: i64,
    signing_key: EncodingKey,
}

impl TokenProvider {
    /// Create a provider from an already loaded signing key
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key is not a valid RSA PEM key.
    pub fn new(
        http: Client,
        auth_host: &str,
        client_id: ClientId,
        audience: impl Into<String>,
        lifetime_secs: u64,
        signing_key: &SecretString,
    ) -> Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(signing_key.expose_secret().as_bytes())
            .map_err(|e| LappsError::Configuration(format!("Invalid RSA signing key: {e}")))?;

        Ok(Self {
            http,
            token_url: format!("{}/v2/auth/token", auth_host.trim_end_matches('/')),
            client_id,
            audience: audience.into(),
            lifetime_secs: i64::try_from(lifetime_secs).unwrap_or(i64::MAX),
            signing_key,
        })
    }

    /// Create a provider from configuration, reading the key from `auth.pem_file`
    pub fn from_config(http: Client, config: &LappsConfig) -> Result<Self> {
        let client_id = config
            .auth
            .client_id()
            .map_err(LappsError::Configuration)?;
        let pem_file = config.auth.pem_file().map_err(LappsError::Configuration)?;
        let signing_key = read_signing_key(pem_file)?;

        Self::new(
            http,
            &config.auth_host(),
            client_id,
            config.auth.audience.clone(),
            config.auth.token_lifetime_secs,
            &signing_key,
        )
    }

    /// Full URL of the token endpoint
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Claims of an assertion issued at `now`
    pub fn claims_at(&self, now: DateTime<Utc>) -> AssertionClaims {
        let iat = now.timestamp();
        AssertionClaims {
            aud: self.audience.clone(),
            iss: self.client_id.to_string(),
            sub: self.client_id.to_string(),
            iat,
            exp: iat.saturating_add(self.lifetime_secs),
        }
    }

    /// Sign an assertion issued at `now`
    pub fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let claims = self.claims_at(now);
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| LappsError::Other(format!("Failed to sign assertion: {e}")))
    }

    /// Exchange a fresh assertion for an access token
    ///
    /// # Errors
    ///
    /// * [`ApiError::AuthFailure`] if the endpoint answers anything but 200
    /// * [`ApiError::Connection`] if the endpoint cannot be reached
    /// * [`ApiError::InvalidResponse`] if a 200 body has no `access_token`
    pub async fn obtain_token(&self) -> Result<AccessToken> {
        let assertion = self.sign_assertion(Utc::now())?;

        tracing::debug!(
            token_url = %self.token_url,
            client_id = %self.client_id,
            "Requesting access token"
        );

        let response = self
            .http
            .post(&self.token_url)
            .form(&TokenRequest {
                grant_type: JWT_BEARER_GRANT_TYPE,
                assertion: &assertion,
            })
            .send()
            .await
            .map_err(|e| {
                ApiError::Connection(format!("Failed to reach token endpoint: {e}"))
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Failed to get access token");
            return Err(ApiError::AuthFailure {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse token response: {e}"))
        })?;

        tracing::info!(client_id = %self.client_id, "Obtained access token");

        Ok(AccessToken::new(token.access_token))
    }
}
