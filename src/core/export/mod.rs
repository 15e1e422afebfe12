//! Export loop and run reporting
//!
//! - [`exporter`] - the token / fetch / advance state machine
//! - [`summary`] - what a run did and how it ended

pub mod exporter;
pub mod summary;

pub use exporter::{ExportOptions, Exporter};
pub use summary::{ExportSummary, RetryEvent, RetryReason};
