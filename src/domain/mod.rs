//! Domain models and types for the exporter.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`SiteId`], [`ClientId`])
//! - **Record model** ([`RecordType`], [`Record`], [`Page`])
//! - **Pagination state** ([`Cursor`])
//! - **Credentials** ([`AccessToken`])
//! - **Error types** ([`LappsError`], [`ApiError`])
//! - **Result type alias** ([`Result`])
//!
//! # Example
//!
//! ```rust
//! use lapps_export::domain::{Cursor, RecordType, SiteId};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let site = SiteId::new(42)?;
//! assert_eq!(
//!     RecordType::Members.endpoint_path(site),
//!     "/v2/sites/42/export/members-2"
//! );
//!
//! let mut cursor = Cursor::default();
//! let page = vec![json!({"id": 2, "lastUpdated": 150}).as_object().cloned().unwrap()];
//! cursor.advance_from(&page)?;
//! assert_eq!(cursor, Cursor::new(150, 2));
//! # Ok(())
//! # }
//! ```

pub mod cursor;
pub mod errors;
pub mod ids;
pub mod record;
pub mod result;
pub mod token;

// Re-export commonly used types for convenience
pub use cursor::Cursor;
pub use errors::{ApiError, LappsError, TransientCause};
pub use ids::{ClientId, SiteId};
pub use record::{Page, Record, RecordType};
pub use result::Result;
pub use token::AccessToken;
