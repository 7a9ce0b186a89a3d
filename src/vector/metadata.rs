//! Metadata persisted alongside the index file.
//!
//! The metadata carries the slot -> product id mapping. An index file without
//! its metadata (or with metadata from another build) is unusable, so load
//! cross-checks counts, dimensions and the payload checksum.

use crate::error::{Corruption, IndexError, IndexResult};
use crate::types::ProductId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata for a persisted index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Product IDs in slot order
    pub product_ids: Vec<ProductId>,

    /// Dimension of every stored vector
    pub embedding_dim: usize,

    /// Number of products; always `product_ids.len()`
    pub num_products: usize,

    /// Version of the metadata format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Unix timestamp when the index was built
    #[serde(default)]
    pub created_at: u64,

    /// Hex SHA-256 of the index payload this metadata belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_checksum: Option<String>,
}

fn default_version() -> u32 {
    IndexMetadata::CURRENT_VERSION
}

impl IndexMetadata {
    /// Current metadata version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create metadata for a freshly built index
    pub fn new(product_ids: Vec<ProductId>, embedding_dim: usize, index_checksum: String) -> Self {
        Self {
            num_products: product_ids.len(),
            product_ids,
            embedding_dim,
            version: Self::CURRENT_VERSION,
            created_at: crate::types::get_utc_timestamp(),
            index_checksum: Some(index_checksum),
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Load metadata from a JSON file, validating its internal consistency
    pub fn load(path: &Path) -> IndexResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| IndexError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let metadata: Self = serde_json::from_str(&json).map_err(|e| {
            IndexError::corrupt(path, Corruption::MalformedMetadata(e.to_string()))
        })?;

        if metadata.version > Self::CURRENT_VERSION {
            return Err(IndexError::corrupt(
                path,
                Corruption::UnsupportedVersion {
                    found: metadata.version,
                    supported: Self::CURRENT_VERSION,
                },
            ));
        }

        if metadata.num_products != metadata.product_ids.len() {
            return Err(IndexError::corrupt(
                path,
                Corruption::ProductCountMismatch {
                    listed: metadata.product_ids.len(),
                    recorded: metadata.num_products,
                },
            ));
        }

        Ok(metadata)
    }
}
