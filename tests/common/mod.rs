#![allow(dead_code)]

use lookalike::config::IndexConfig;
use lookalike::{ProductId, VectorDimension, VectorIndexManager};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tempfile::TempDir;

pub const DIM: usize = 512;

/// Reproducible random vectors with components in [-1, 1). Not normalized.
pub fn random_vectors(count: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..dim).map(|_| rng.random_range(-1.0f32..1.0)).collect())
        .collect()
}

/// Product ids `first..first + count`.
pub fn product_ids(first: i64, count: usize) -> Vec<ProductId> {
    (first..first + count as i64).map(ProductId::new).collect()
}

/// A manager whose artifacts live in a fresh temp directory.
pub fn temp_manager(dim: usize) -> (Arc<VectorIndexManager>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let manager = manager_in(&temp_dir, dim);
    (Arc::new(manager), temp_dir)
}

/// A fresh manager pointed at the artifacts under `dir`.
pub fn manager_in(dir: &TempDir, dim: usize) -> VectorIndexManager {
    VectorIndexManager::new(
        IndexConfig::in_dir(dir.path().join("index")),
        VectorDimension::new(dim).expect("Invalid dimension"),
    )
}
