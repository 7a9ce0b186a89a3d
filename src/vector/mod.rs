//! Vector index for product image embeddings.
//!
//! This module owns everything below the ranking policy: dimension and
//! similarity newtypes, L2 math, the exact flat index, the on-disk formats
//! and the [`VectorIndexManager`] that ties them together.
//!
//! # Architecture
//! Vectors are L2-normalized on insertion and on query, so squared Euclidean
//! distance `d²` between unit vectors relates to cosine similarity through
//! `cos = 1 - d² / 2`. The index is an exact brute-force scan; large indexes
//! are scanned in parallel with identical results.

mod distance;
mod flat;
mod manager;
mod metadata;
mod storage;
mod types;

// Re-export core types for public API
pub use distance::{cosine_similarity, l2_norm, normalize_l2, normalized, squared_euclidean};
pub use flat::{FlatIndex, Neighbor};
pub use manager::{INDEX_TYPE_FLAT, IndexSnapshot, IndexStats, IndexStatus, VectorIndexManager};
pub use metadata::IndexMetadata;
pub use storage::{VectorFile, VectorFileKind, payload_checksum, read_vector_file};
pub use types::{Similarity, Slot, VECTOR_DIMENSION_512, VectorDimension, VectorError};
