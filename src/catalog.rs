//! Bulk indexing of a product catalog.
//!
//! Embeds every catalog image in fixed-size batches, then builds and saves
//! the index in one step.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::embedding::ImageEmbedder;
use crate::error::{IndexError, IndexResult};
use crate::types::ProductId;
use crate::vector::VectorIndexManager;

/// Outcome of a catalog indexing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogReport {
    pub indexed: usize,
    /// Products stored with a zero placeholder because embedding failed.
    pub degraded: usize,
    pub batches: usize,
}

pub struct CatalogIndexer {
    manager: Arc<VectorIndexManager>,
    embedder: Arc<dyn ImageEmbedder>,
    batch_size: usize,
}

impl CatalogIndexer {
    /// Fails with `ConfigError` when the embedder and index disagree on
    /// dimension or `batch_size` is zero.
    pub fn new(
        manager: Arc<VectorIndexManager>,
        embedder: Arc<dyn ImageEmbedder>,
        batch_size: usize,
    ) -> IndexResult<Self> {
        if batch_size == 0 {
            return Err(IndexError::ConfigError {
                reason: "batch size must be at least 1".to_string(),
            });
        }
        if embedder.dimension() != manager.dimension() {
            return Err(IndexError::ConfigError {
                reason: format!(
                    "embedder produces {}-dimensional vectors but the index expects {}",
                    embedder.dimension(),
                    manager.dimension()
                ),
            });
        }

        Ok(Self {
            manager,
            embedder,
            batch_size,
        })
    }

    /// Embeds all `products`, replaces the in-memory index and persists it.
    pub fn index(&self, products: &[(ProductId, PathBuf)]) -> IndexResult<CatalogReport> {
        let started = Instant::now();
        let total_batches = products.len().div_ceil(self.batch_size);
        let mut embeddings = Vec::with_capacity(products.len());

        for (batch, chunk) in products.chunks(self.batch_size).enumerate() {
            let images: Vec<&std::path::Path> = chunk.iter().map(|(_, p)| p.as_path()).collect();
            embeddings.extend(self.embedder.embed_batch(&images));
            debug!(
                batch = batch + 1,
                total = total_batches,
                embedded = embeddings.len(),
                "Embedded batch"
            );
        }

        let degraded = embeddings
            .iter()
            .filter(|v| v.iter().all(|&x| x == 0.0))
            .count();
        if degraded > 0 {
            warn!(degraded, "Some products were indexed with zero vectors");
        }

        let ids: Vec<ProductId> = products.iter().map(|(id, _)| *id).collect();
        self.manager.build(&embeddings, &ids)?;
        self.manager.save()?;

        info!(
            indexed = ids.len(),
            degraded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Catalog indexed"
        );

        Ok(CatalogReport {
            indexed: ids.len(),
            degraded,
            batches: total_batches,
        })
    }
}
