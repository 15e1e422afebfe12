//! Page persistence
//!
//! - [`JsonFileSink`] writes each page as a JSON file plus a run manifest
//! - [`NullSink`] stores nothing (dry run)

pub mod json_file;
pub mod traits;

pub use json_file::JsonFileSink;
pub use traits::{NullSink, PageArtifact, PageSink};
