// Checkpoint persistence for resumable exports

pub mod checkpoint;
pub mod manager;

pub use checkpoint::{Checkpoint, CheckpointStatus};
pub use manager::CheckpointStore;
