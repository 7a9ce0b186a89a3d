//! Error types for the similarity search core
//!
//! This module provides structured error types using thiserror so callers can
//! match on each failure kind instead of parsing messages.

use crate::vector::VectorError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for index and search operations
#[derive(Error, Debug)]
pub enum IndexError {
    /// Caller supplied data the index cannot accept
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// `save` was called before any index was built or loaded
    #[error("No index to save. Build the index first.")]
    NotBuilt,

    /// A query arrived while no index is in memory
    #[error("Index not loaded. Build or load the index before searching.")]
    NotLoaded,

    /// On-disk artifacts exist but failed a consistency check
    #[error("Index at '{path}' is corrupted: {check}\nSuggestion: Rebuild the index")]
    CorruptIndex { path: PathBuf, check: Corruption },

    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },
}

impl IndexError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotBuilt => "NOT_BUILT",
            Self::NotLoaded => "NOT_LOADED",
            Self::CorruptIndex { .. } => "INDEX_CORRUPTED",
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::FileWrite { .. } => "FILE_WRITE_ERROR",
            Self::ConfigError { .. } => "CONFIG_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::NotBuilt | Self::NotLoaded => vec![
                "Run 'lookalike build --input <embeddings.jsonl>' to create the index",
                "Check that index.index_path and index.metadata_path point at an existing index",
            ],
            Self::CorruptIndex { .. } => vec![
                "Run 'lookalike build' to rebuild the index from the catalog",
                "Check for disk errors or an interrupted copy of the index directory",
            ],
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
            ],
            Self::FileWrite { .. } => vec![
                "Check disk space and permissions in the index directory",
            ],
            Self::ConfigError { .. } => vec![
                "Run 'lookalike config' to inspect the effective settings",
                "Run 'lookalike init --force' to regenerate the settings file",
            ],
            Self::InvalidInput(_) => vec![],
        }
    }

    /// Shorthand for a corruption error on `path`.
    pub(crate) fn corrupt(path: impl Into<PathBuf>, check: Corruption) -> Self {
        Self::CorruptIndex {
            path: path.into(),
            check,
        }
    }
}

/// Reasons an input is rejected before it reaches the index
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInput {
    #[error("cannot build an index from an empty batch")]
    EmptyBatch,

    #[error("embeddings count ({vectors}) must match product IDs count ({ids})")]
    LengthMismatch { vectors: usize, ids: usize },

    #[error("vector {index}: {source}")]
    BatchVector { index: usize, source: VectorError },

    #[error("{0}")]
    Vector(#[from] VectorError),

    #[error("k must be at least 1")]
    ZeroK,

    #[error("k must be between 1 and {max}, got {k}")]
    KOutOfRange { k: usize, max: usize },

    #[error("similarity threshold must be between 0 and 1, got {0}")]
    Threshold(f32),

    #[error("line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
}

/// The consistency check a persisted index failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Corruption {
    #[error("file too small to contain a header ({size} bytes)")]
    MissingHeader { size: u64 },

    #[error("unrecognized magic bytes")]
    BadMagic,

    #[error("format version {found} is not supported (expected {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("stored dimension is zero")]
    ZeroDimension,

    #[error("expected {expected} bytes, found {actual}")]
    Truncated { expected: u64, actual: u64 },

    #[error("header describes {count} vectors of dimension {dimension}, which overflows the addressable size")]
    OversizedHeader { count: u32, dimension: u32 },

    #[error("payload checksum does not match")]
    ChecksumMismatch,

    #[error("stored vector {slot} contains a non-finite value")]
    NonFinite { slot: usize },

    #[error("metadata is unreadable: {0}")]
    MalformedMetadata(String),

    #[error("metadata lists {listed} product IDs but records num_products = {recorded}")]
    ProductCountMismatch { listed: usize, recorded: usize },

    #[error("metadata records {metadata} vectors but the index holds {index}")]
    CountMismatch { metadata: usize, index: usize },

    #[error("metadata records dimension {metadata} but the index uses {index}")]
    DimensionMismatch { metadata: usize, index: usize },

    #[error("index dimension {stored} does not match the configured dimension {configured}")]
    ConfiguredDimension { configured: usize, stored: usize },

    #[error("embeddings file holds {embeddings} vectors of dimension {dimension}, index expects {count} of dimension {expected}")]
    EmbeddingsMismatch {
        embeddings: usize,
        dimension: usize,
        count: usize,
        expected: usize,
    },
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;
