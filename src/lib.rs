//! Visual similarity search over a product catalog.
//!
//! Given an image embedding, find the most visually similar products. The
//! [`vector`] module owns the exact index and its persistence; [`search`]
//! applies the similarity threshold and ranking policy on top.

pub mod catalog;
pub mod config;
pub mod display;
pub mod embedding;
pub mod error;
pub mod io;
pub mod search;
pub mod types;
pub mod vector;

// Explicit exports for better API clarity
pub use catalog::{CatalogIndexer, CatalogReport};
pub use config::Settings;
pub use embedding::{EmbeddingError, ImageEmbedder};
pub use error::{Corruption, IndexError, IndexResult, InvalidInput};
pub use search::{
    InMemoryProductStore, ProductRecord, ProductStore, SearchHit, SearchRequest, SearchService,
    resolve_hits,
};
pub use types::ProductId;
pub use vector::{IndexStats, IndexStatus, Similarity, VectorDimension, VectorIndexManager};
