//! Logging and progress helpers

pub mod log;
pub mod progress;

pub use log::{log_operation_complete, log_operation_start};
pub use progress::{create_spinner, finish_and_clear};
