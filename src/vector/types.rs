//! Type-safe wrappers and core types for the vector index.
//!
//! Newtypes keep slots, dimensions and similarity scores from being mixed up
//! with the plain integers and floats they wrap.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard vector dimension for image embeddings (CLIP ViT-B/32).
pub const VECTOR_DIMENSION_512: usize = 512;

/// Position of a vector inside an index.
///
/// Slots are dense and assigned in insertion order, so slot `i` corresponds to
/// the `i`-th vector handed to `build` and to `product_ids[i]` in the metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot(usize);

impl Slot {
    /// Creates a new `Slot`.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the underlying position.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cosine similarity between a query and an indexed vector.
///
/// Always within [0.0, 1.0]:
/// - 1.0 indicates identical direction
/// - 0.0 indicates orthogonal or opposing vectors
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Similarity(f32);

impl Similarity {
    /// Creates a new `Similarity` with validation.
    ///
    /// Returns an error if the value is not in the range [0.0, 1.0] or is NaN.
    pub fn new(value: f32) -> Result<Self, VectorError> {
        if value.is_nan() {
            return Err(VectorError::InvalidSimilarity {
                value,
                reason: "Similarity cannot be NaN",
            });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(VectorError::InvalidSimilarity {
                value,
                reason: "Similarity must be in range [0.0, 1.0]",
            });
        }
        Ok(Self(value))
    }

    /// Converts a squared Euclidean distance between unit vectors.
    ///
    /// For unit vectors `d² = 2 - 2cos`, so `cos = 1 - d²/2`. The result is
    /// clamped into [0.0, 1.0]: opposing vectors score 0 and float drift
    /// around identical vectors never exceeds 1.
    #[must_use]
    pub fn from_squared_distance(distance: f32) -> Self {
        let value = 1.0 - distance / 2.0;
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Returns the underlying f32 value.
    #[must_use]
    pub fn get(&self) -> f32 {
        self.0
    }
}

impl std::fmt::Display for Similarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Type-safe wrapper for vector dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Creates the standard 512-dimensional image embedding dimension.
    #[must_use]
    pub const fn dimension_512() -> Self {
        Self(VECTOR_DIMENSION_512)
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension and only finite values.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        if let Some(position) = vector.iter().position(|v| !v.is_finite()) {
            return Err(VectorError::NonFinite { position });
        }
        Ok(())
    }
}

impl std::fmt::Display for VectorDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur while validating vectors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors use the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error("Vector contains a non-finite value at position {position}")]
    NonFinite { position: usize },

    #[error("Invalid similarity value: {value}\nReason: {reason}")]
    InvalidSimilarity { value: f32, reason: &'static str },
}
