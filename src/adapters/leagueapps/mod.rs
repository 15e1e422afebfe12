//! LeagueApps API adapter
//!
//! This module provides the integration with the LeagueApps auth and admin
//! servers: assertion signing and token exchange, page retrieval, and the
//! [`ExportApi`] trait the export loop is written against.

pub mod api;
pub mod auth;
pub mod client;
pub mod models;

pub use api::{ExportApi, FetchResponse, HttpResponse, PageRequest};
pub use auth::TokenProvider;
pub use client::LeagueAppsClient;
pub use models::{AssertionClaims, JWT_BEARER_GRANT_TYPE};
