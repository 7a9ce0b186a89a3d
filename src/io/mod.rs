//! Input/Output handling for the CLI.
//!
//! This module provides:
//! - JSON Lines and JSON readers for embeddings and query vectors
//! - Unified output formatting (text, JSON)
//! - Consistent exit codes

pub mod exit_code;
pub mod format;
pub mod input;

pub use exit_code::ExitCode;
pub use format::{JsonResponse, OutputFormat};
pub use input::{EmbeddingBatch, read_embeddings_jsonl, read_query_vector};
