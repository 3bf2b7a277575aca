//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod read;
pub mod sample;

pub use read::run_read;
pub use sample::run_sample;
