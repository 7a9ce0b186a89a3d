//! Terminal display utilities for CLI output.

pub mod tables;

pub use tables::{create_hits_table, create_resolved_table, create_stats_table};
