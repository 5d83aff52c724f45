//! Background Tasks Module
//!
//! Contains background tasks that run periodically during proxy operation.
//!
//! # Tasks
//! - Stats reporter: Logs a cache statistics snapshot at configured intervals

mod stats_reporter;

pub use stats_reporter::spawn_stats_task;
