//! Lifecycle owner of the in-memory product index.
//!
//! The manager holds at most one immutable [`IndexSnapshot`] at a time.
//! Readers clone an `Arc` to the current snapshot and search it without
//! holding any lock; `build` and `load` construct a complete replacement
//! before publishing it with a single swap, so a query observes either the
//! old index or the new one, never a mix.
//!
//! Persistence writes three artifacts: the checksummed index file, the raw
//! normalized embeddings, and the metadata JSON mapping slots to product ids.
//! Only one process is expected to write a given index location at a time.

use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{IndexConfig, Settings};
use crate::error::{Corruption, IndexError, IndexResult, InvalidInput};
use crate::types::ProductId;
use crate::vector::distance::normalized;
use crate::vector::flat::{FlatIndex, Neighbor};
use crate::vector::metadata::IndexMetadata;
use crate::vector::storage::{StagedFile, VectorFileKind, read_vector_file};
use crate::vector::types::{Slot, VectorDimension};

/// Name reported by `stats` for the exact brute-force index.
pub const INDEX_TYPE_FLAT: &str = "flat";

/// An immutable index together with its slot -> product id mapping.
#[derive(Debug)]
pub struct IndexSnapshot {
    index: FlatIndex,
    product_ids: Vec<ProductId>,
}

impl IndexSnapshot {
    fn new(index: FlatIndex, product_ids: Vec<ProductId>) -> Self {
        debug_assert_eq!(index.len(), product_ids.len());
        Self { index, product_ids }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.index.dimension()
    }

    /// Product stored at `slot`, if the slot is in range.
    #[must_use]
    pub fn product_id(&self, slot: Slot) -> Option<ProductId> {
        self.product_ids.get(slot.get()).copied()
    }

    #[must_use]
    pub fn product_ids(&self) -> &[ProductId] {
        &self.product_ids
    }

    #[must_use]
    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    /// Validates and normalizes `vector`, then returns up to `top_n`
    /// neighbors by increasing squared distance.
    pub fn query(&self, vector: &[f32], top_n: usize) -> IndexResult<Vec<Neighbor>> {
        self.dimension()
            .validate_vector(vector)
            .map_err(InvalidInput::from)?;

        let query = normalized(vector);
        Ok(self.index.search(&query, top_n))
    }
}

/// Whether an index is currently held in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    Loaded,
    NotLoaded,
}

impl std::fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loaded => write!(f, "loaded"),
            Self::NotLoaded => write!(f, "not_loaded"),
        }
    }
}

/// Summary of the in-memory index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub status: IndexStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_type: Option<&'static str>,
}

/// Builds, persists, loads and queries the product index.
#[derive(Debug)]
pub struct VectorIndexManager {
    paths: IndexConfig,
    dimension: VectorDimension,
    current: RwLock<Option<Arc<IndexSnapshot>>>,
    /// Serializes build, load and save.
    writer: Mutex<()>,
}

impl VectorIndexManager {
    /// Creates an empty manager for vectors of `dimension` stored at `paths`.
    #[must_use]
    pub fn new(paths: IndexConfig, dimension: VectorDimension) -> Self {
        Self {
            paths,
            dimension,
            current: RwLock::new(None),
            writer: Mutex::new(()),
        }
    }

    /// Creates an empty manager from validated settings.
    pub fn from_settings(settings: &Settings) -> IndexResult<Self> {
        Ok(Self::new(settings.index.clone(), settings.model.dimension()?))
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    #[must_use]
    pub fn paths(&self) -> &IndexConfig {
        &self.paths
    }

    /// Replaces the in-memory index with one built from `vectors`.
    ///
    /// `vectors[i]` belongs to `ids[i]`. Vectors are normalized on a copy;
    /// the caller's data is not modified. On error the previous index, if
    /// any, stays in place.
    pub fn build(&self, vectors: &[Vec<f32>], ids: &[ProductId]) -> IndexResult<()> {
        if vectors.is_empty() {
            return Err(InvalidInput::EmptyBatch.into());
        }
        if vectors.len() != ids.len() {
            return Err(InvalidInput::LengthMismatch {
                vectors: vectors.len(),
                ids: ids.len(),
            }
            .into());
        }
        for (index, vector) in vectors.iter().enumerate() {
            self.dimension
                .validate_vector(vector)
                .map_err(|source| InvalidInput::BatchVector { index, source })?;
        }

        let _writer = self.writer.lock();

        let index = FlatIndex::from_rows(self.dimension, vectors).map_err(InvalidInput::from)?;
        let snapshot = Arc::new(IndexSnapshot::new(index, ids.to_vec()));
        *self.current.write() = Some(snapshot);

        info!(
            count = vectors.len(),
            dimension = self.dimension.get(),
            "Built product index"
        );
        Ok(())
    }

    /// Writes the index, embeddings and metadata artifacts.
    ///
    /// All three are staged in full before any of them replaces the
    /// previous version on disk.
    pub fn save(&self) -> IndexResult<()> {
        let _writer = self.writer.lock();
        let snapshot = self.current.read().clone().ok_or(IndexError::NotBuilt)?;

        let dimension = snapshot.dimension();
        let data = snapshot.index().as_slice();

        let (embeddings, _) = StagedFile::write_vectors(
            &self.paths.embeddings_path,
            VectorFileKind::Embeddings,
            dimension,
            data,
        )?;
        let (index, checksum) = StagedFile::write_vectors(
            &self.paths.index_path,
            VectorFileKind::Index,
            dimension,
            data,
        )?;

        let metadata =
            IndexMetadata::new(snapshot.product_ids().to_vec(), dimension.get(), checksum);
        let json = metadata.to_json().map_err(|e| IndexError::FileWrite {
            path: self.paths.metadata_path.clone(),
            source: std::io::Error::other(e),
        })?;
        let metadata_file = StagedFile::write(&self.paths.metadata_path, json.as_bytes())?;

        embeddings.commit()?;
        index.commit()?;
        metadata_file.commit()?;

        info!(
            count = snapshot.len(),
            path = %self.paths.index_path.display(),
            "Saved product index"
        );
        Ok(())
    }

    /// Loads persisted artifacts, replacing the in-memory index.
    ///
    /// Returns `Ok(false)` when the index or metadata file is missing, or
    /// when the stored index is empty. Inconsistent artifacts fail with
    /// `CorruptIndex` and leave the current index untouched.
    pub fn load(&self) -> IndexResult<bool> {
        let _writer = self.writer.lock();

        if !self.index_exists() {
            warn!(
                index = %self.paths.index_path.display(),
                metadata = %self.paths.metadata_path.display(),
                "Index artifacts not found"
            );
            return Ok(false);
        }

        let index_path = &self.paths.index_path;
        let metadata = IndexMetadata::load(&self.paths.metadata_path)?;
        let stored = read_vector_file(index_path, VectorFileKind::Index)?;

        if metadata.embedding_dim != stored.dimension.get() {
            return Err(IndexError::corrupt(
                &self.paths.metadata_path,
                Corruption::DimensionMismatch {
                    metadata: metadata.embedding_dim,
                    index: stored.dimension.get(),
                },
            ));
        }
        if metadata.num_products != stored.count {
            return Err(IndexError::corrupt(
                &self.paths.metadata_path,
                Corruption::CountMismatch {
                    metadata: metadata.num_products,
                    index: stored.count,
                },
            ));
        }
        if stored.dimension != self.dimension {
            return Err(IndexError::corrupt(
                index_path,
                Corruption::ConfiguredDimension {
                    configured: self.dimension.get(),
                    stored: stored.dimension.get(),
                },
            ));
        }
        if let Some(expected) = &metadata.index_checksum
            && *expected != stored.checksum
        {
            return Err(IndexError::corrupt(index_path, Corruption::ChecksumMismatch));
        }

        self.check_embeddings(stored.dimension, stored.count)?;

        if stored.count == 0 {
            warn!(path = %index_path.display(), "Stored index is empty");
            return Ok(false);
        }

        let count = stored.count;
        let index = FlatIndex::from_normalized(stored.dimension, stored.data);
        *self.current.write() = Some(Arc::new(IndexSnapshot::new(index, metadata.product_ids)));

        info!(count, path = %index_path.display(), "Loaded product index");
        Ok(true)
    }

    /// The embeddings file is optional, but when present it must describe the
    /// same rows as the index.
    fn check_embeddings(&self, dimension: VectorDimension, count: usize) -> IndexResult<()> {
        let path: &Path = &self.paths.embeddings_path;
        if !path.exists() {
            debug!(path = %path.display(), "No embeddings file next to index");
            return Ok(());
        }

        let embeddings = read_vector_file(path, VectorFileKind::Embeddings)?;
        if embeddings.dimension != dimension || embeddings.count != count {
            return Err(IndexError::corrupt(
                path,
                Corruption::EmbeddingsMismatch {
                    embeddings: embeddings.count,
                    dimension: embeddings.dimension.get(),
                    count,
                    expected: dimension.get(),
                },
            ));
        }
        Ok(())
    }

    /// True when both the index file and its metadata exist on disk.
    #[must_use]
    pub fn index_exists(&self) -> bool {
        self.paths.index_path.exists() && self.paths.metadata_path.exists()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    /// The current index and id mapping as one consistent unit.
    pub fn snapshot(&self) -> IndexResult<Arc<IndexSnapshot>> {
        self.current.read().clone().ok_or(IndexError::NotLoaded)
    }

    /// Up to `top_n` `(slot, squared_distance)` pairs nearest to `vector`.
    pub fn query(&self, vector: &[f32], top_n: usize) -> IndexResult<Vec<Neighbor>> {
        self.snapshot()?.query(vector, top_n)
    }

    #[must_use]
    pub fn stats(&self) -> IndexStats {
        match self.current.read().as_ref() {
            Some(snapshot) => IndexStats {
                status: IndexStatus::Loaded,
                count: Some(snapshot.len()),
                dimension: Some(snapshot.dimension().get()),
                index_type: Some(INDEX_TYPE_FLAT),
            },
            None => IndexStats {
                status: IndexStatus::NotLoaded,
                count: None,
                dimension: None,
                index_type: None,
            },
        }
    }
}
