//! LeagueApps admin API client
//!
//! Implements [`ExportApi`] over reqwest: tokens come from the
//! [`TokenProvider`], pages from
//! `GET {admin_host}/v2/sites/{site_id}/export/{type}` (or the unpaginated
//! `/v2/sites/{site_id}/{type}` variant).

use super::api::{ExportApi, FetchResponse, HttpResponse, PageRequest};
use super::auth::TokenProvider;
use crate::config::LappsConfig;
use crate::domain::{AccessToken, LappsError, Result, SiteId};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// HTTP client for the token and export endpoints
pub struct LeagueAppsClient {
    http: Client,
    admin_host: String,
    site_id: SiteId,
    request_timeout: Duration,
    token_provider: TokenProvider,
}

impl LeagueAppsClient {
    /// Create a client from configuration
    ///
    /// Reads and parses the signing key, so a bad key is reported before any
    /// request is made.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if required settings are missing, the
    /// key cannot be loaded, or the HTTP client cannot be built.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lapps_export::adapters::leagueapps::LeagueAppsClient;
    /// use lapps_export::config::load_config;
    ///
    /// # fn example() -> lapps_export::domain::Result<()> {
    /// let config = load_config("lapps-export.toml")?;
    /// let client = LeagueAppsClient::from_config(&config)?;
    /// println!("Exporting from {}", client.admin_host());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_config(config: &LappsConfig) -> Result<Self> {
        let http = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("lapps-export/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                LappsError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        let site_id = config.api.site_id().map_err(LappsError::Configuration)?;
        let token_provider = TokenProvider::from_config(http.clone(), config)?;

        Ok(Self::new(
            http,
            config.admin_host(),
            site_id,
            config.api.request_timeout(),
            token_provider,
        ))
    }

    /// Create a client from its parts
    pub fn new(
        http: Client,
        admin_host: impl Into<String>,
        site_id: SiteId,
        request_timeout: Duration,
        token_provider: TokenProvider,
    ) -> Self {
        Self {
            http,
            admin_host: admin_host.into().trim_end_matches('/').to_string(),
            site_id,
            request_timeout,
            token_provider,
        }
    }

    /// Base URL of the admin API
    pub fn admin_host(&self) -> &str {
        &self.admin_host
    }

    /// Full URL serving the given request
    pub fn page_url(&self, request: &PageRequest) -> String {
        format!(
            "{}{}",
            self.admin_host,
            request.record_type.endpoint_path(self.site_id)
        )
    }
}

#[async_trait]
impl ExportApi for LeagueAppsClient {
    async fn obtain_token(&self) -> Result<AccessToken> {
        self.token_provider.obtain_token().await
    }

    async fn fetch_page(&self, request: &PageRequest, token: &AccessToken) -> FetchResponse {
        let url = self.page_url(request);

        tracing::debug!(
            url = %url,
            cursor = %request.cursor,
            "Requesting page"
        );

        let sent = self
            .http
            .get(&url)
            .query(&request.cursor.query_params())
            .header(reqwest::header::AUTHORIZATION, token.bearer_header())
            .timeout(self.request_timeout)
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return FetchResponse::TimedOut(self.request_timeout),
            Err(e) => return FetchResponse::ConnectionFailed(e.to_string()),
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => FetchResponse::Completed(HttpResponse::new(status, body)),
            Err(e) if e.is_timeout() => FetchResponse::TimedOut(self.request_timeout),
            Err(e) => FetchResponse::ConnectionFailed(format!("Failed to read response body: {e}")),
        }
    }
}
