//! Product lookup for search results.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{IndexError, IndexResult};
use crate::search::SearchHit;
use crate::types::ProductId;
use crate::vector::Similarity;

/// Catalog entry for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub image_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Source of product details keyed by id.
pub trait ProductStore: Send + Sync {
    fn get_product(&self, id: ProductId) -> Option<ProductRecord>;
}

/// Catalog held entirely in memory, usually loaded once at startup.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductStore {
    products: HashMap<ProductId, ProductRecord>,
}

impl InMemoryProductStore {
    #[must_use]
    pub fn new(records: impl IntoIterator<Item = ProductRecord>) -> Self {
        Self {
            products: records.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    /// Loads a JSON array of product records.
    pub fn from_json_file(path: &Path) -> IndexResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| IndexError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let records: Vec<ProductRecord> =
            serde_json::from_str(&json).map_err(|e| IndexError::FileRead {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            })?;

        let store = Self::new(records);
        info!(products = store.len(), path = %path.display(), "Loaded product catalog");
        Ok(store)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl ProductStore for InMemoryProductStore {
    fn get_product(&self, id: ProductId) -> Option<ProductRecord> {
        self.products.get(&id).cloned()
    }
}

/// A search hit joined with its catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedHit {
    #[serde(flatten)]
    pub product: ProductRecord,
    pub similarity: Similarity,
}

/// Attaches product details to hits, dropping hits whose product is gone.
pub fn resolve_hits(store: &dyn ProductStore, hits: &[SearchHit]) -> Vec<ResolvedHit> {
    hits.iter()
        .filter_map(|hit| match store.get_product(hit.product_id) {
            Some(product) => Some(ResolvedHit {
                product,
                similarity: hit.similarity,
            }),
            None => {
                debug!(product_id = %hit.product_id, "Dropping hit for unknown product");
                None
            }
        })
        .collect()
}
