//! Interface to the image embedding model.
//!
//! The model itself lives outside this crate. Implementations turn an image
//! into a fixed-length vector; the index normalizes whatever they return.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::vector::{VectorDimension, VectorError};

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Failed to read image '{path}': {source}")]
    ImageRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Embedding model failed: {0}\nSuggestion: Check that the model is loaded and the image is a supported format")]
    Model(String),

    #[error(transparent)]
    Vector(#[from] VectorError),
}

/// Produces embeddings for product images.
///
/// Implementations must be thread-safe; one embedder is typically shared by
/// the catalog pipeline and the query path.
pub trait ImageEmbedder: Send + Sync {
    /// Length of every vector this embedder produces.
    #[must_use]
    fn dimension(&self) -> VectorDimension;

    /// Embeds a single image.
    fn embed_one(&self, image: &Path) -> Result<Vec<f32>, EmbeddingError>;

    /// Embeds a batch, one output per input in the same order.
    ///
    /// An image that fails to embed, or whose embedding has the wrong
    /// dimension or non-finite values, is replaced by an all-zero vector so
    /// the batch stays aligned with its product ids.
    fn embed_batch(&self, images: &[&Path]) -> Vec<Vec<f32>> {
        let dimension = self.dimension();
        images
            .iter()
            .map(|image| {
                match self.embed_one(image).and_then(|v| {
                    dimension.validate_vector(&v)?;
                    Ok(v)
                }) {
                    Ok(vector) => vector,
                    Err(e) => {
                        warn!(
                            image = %image.display(),
                            error = %e,
                            "Embedding failed, using zero vector"
                        );
                        vec![0.0; dimension.get()]
                    }
                }
            })
            .collect()
    }
}

/// Deterministic embedder for tests: the vector depends only on the file name.
#[cfg(test)]
pub struct MockImageEmbedder {
    dimension: VectorDimension,
}

#[cfg(test)]
impl MockImageEmbedder {
    #[must_use]
    pub fn with_dimension(dimension: VectorDimension) -> Self {
        Self { dimension }
    }
}

#[cfg(test)]
impl ImageEmbedder for MockImageEmbedder {
    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn embed_one(&self, image: &Path) -> Result<Vec<f32>, EmbeddingError> {
        let name = image
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| EmbeddingError::Model(format!("unnamed image {}", image.display())))?;
        if name.starts_with("broken") {
            return Err(EmbeddingError::Model(format!("cannot decode {name}")));
        }

        let dim = self.dimension.get();
        let mut embedding = vec![0.1; dim];
        for (i, byte) in name.bytes().enumerate() {
            embedding[(i + byte as usize) % dim] += 1.0;
        }
        Ok(embedding)
    }
}
