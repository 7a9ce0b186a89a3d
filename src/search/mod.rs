//! Ranking and filtering on top of the vector index.
//!
//! The index answers "which slots are nearest"; this layer turns that into
//! "which products are similar enough". It over-fetches candidates, converts
//! squared distances to cosine similarities, drops anything under the
//! threshold and stops once `k` products are collected.
//!
//! Over-fetching a fixed `k * 3` candidates means fewer than `k` results can
//! come back even when more products would pass the threshold further down
//! the ranking.

mod products;

pub use products::{InMemoryProductStore, ProductRecord, ProductStore, ResolvedHit, resolve_hits};

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::{IndexResult, InvalidInput};
use crate::types::ProductId;
use crate::vector::{Similarity, VectorIndexManager};

/// Candidates requested from the index per result slot.
pub const OVERFETCH_FACTOR: usize = 3;

/// A product judged similar to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchHit {
    pub product_id: ProductId,
    pub similarity: Similarity,
}

/// Caller-facing search parameters; unset fields fall back to configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchRequest {
    pub k: Option<usize>,
    pub threshold: Option<f32>,
}

impl SearchRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Applies defaults and bounds, returning `(k, threshold)`.
    pub fn resolve(&self, config: &SearchConfig) -> Result<(usize, f32), InvalidInput> {
        let k = self.k.unwrap_or(config.default_k);
        if k == 0 {
            return Err(InvalidInput::ZeroK);
        }
        if k > config.max_k {
            return Err(InvalidInput::KOutOfRange {
                k,
                max: config.max_k,
            });
        }

        let threshold = self.threshold.unwrap_or(config.default_threshold);
        validate_threshold(threshold)?;

        Ok((k, threshold))
    }
}

fn validate_threshold(threshold: f32) -> Result<(), InvalidInput> {
    if threshold.is_nan() || !(0.0..=1.0).contains(&threshold) {
        return Err(InvalidInput::Threshold(threshold));
    }
    Ok(())
}

/// Similarity search over a shared index manager.
#[derive(Debug, Clone)]
pub struct SearchService {
    manager: Arc<VectorIndexManager>,
    config: SearchConfig,
}

impl SearchService {
    #[must_use]
    pub fn new(manager: Arc<VectorIndexManager>, config: SearchConfig) -> Self {
        Self { manager, config }
    }

    #[must_use]
    pub fn manager(&self) -> &Arc<VectorIndexManager> {
        &self.manager
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Returns at most `k` products with similarity `>= threshold`, most
    /// similar first.
    ///
    /// Fails with `NotLoaded` when no index is in memory, and with
    /// `InvalidInput` for `k == 0`, a threshold outside `[0, 1]`, or a
    /// malformed query vector.
    pub fn search(&self, query: &[f32], k: usize, threshold: f32) -> IndexResult<Vec<SearchHit>> {
        if k == 0 {
            return Err(InvalidInput::ZeroK.into());
        }
        validate_threshold(threshold)?;

        // One snapshot for the whole search keeps slots and ids in step
        let snapshot = self.manager.snapshot()?;
        let fetch = k.saturating_mul(OVERFETCH_FACTOR).min(snapshot.len());
        let neighbors = snapshot.query(query, fetch)?;

        let mut hits = Vec::with_capacity(k);
        for neighbor in &neighbors {
            let Some(product_id) = snapshot.product_id(neighbor.slot) else {
                debug!(slot = %neighbor.slot, "Skipping slot without product mapping");
                continue;
            };

            let similarity = Similarity::from_squared_distance(neighbor.distance);
            if similarity.get() >= threshold {
                hits.push(SearchHit {
                    product_id,
                    similarity,
                });
                if hits.len() == k {
                    break;
                }
            }
        }

        debug!(
            k,
            threshold,
            candidates = neighbors.len(),
            returned = hits.len(),
            "Similarity search complete"
        );
        Ok(hits)
    }

    /// Resolves `request` against configured defaults, then searches.
    pub fn search_request(
        &self,
        query: &[f32],
        request: &SearchRequest,
    ) -> IndexResult<Vec<SearchHit>> {
        let (k, threshold) = request.resolve(&self.config)?;
        self.search(query, k, threshold)
    }
}
