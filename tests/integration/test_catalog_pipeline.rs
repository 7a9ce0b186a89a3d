//! Catalog indexing end to end: embed, build, save, reload, search, resolve.

use crate::common::temp_manager;
use lookalike::config::SearchConfig;
use lookalike::vector::VectorIndexManager;
use lookalike::{
    CatalogIndexer, EmbeddingError, ImageEmbedder, InMemoryProductStore, ProductId, ProductRecord,
    SearchService, VectorDimension, resolve_hits,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Embeds images named `<color>_<n>.jpg` as one-hot color directions with a
/// small per-item offset, so same-color items cluster together.
struct ColorEmbedder;

const COLORS: [&str; 4] = ["red", "green", "blue", "black"];

impl ImageEmbedder for ColorEmbedder {
    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(8).unwrap()
    }

    fn embed_one(&self, image: &Path) -> Result<Vec<f32>, EmbeddingError> {
        let stem = image.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        let (color, n) = stem
            .split_once('_')
            .ok_or_else(|| EmbeddingError::Model(format!("unexpected name {stem}")))?;
        let axis = COLORS
            .iter()
            .position(|c| *c == color)
            .ok_or_else(|| EmbeddingError::Model(format!("unknown color {color}")))?;
        let n: f32 = n
            .parse()
            .map_err(|_| EmbeddingError::Model(format!("bad index in {stem}")))?;

        let mut v = vec![0.0; 8];
        v[axis] = 1.0;
        v[4 + axis] = 0.05 * n;
        Ok(v)
    }
}

fn catalog() -> Vec<(ProductId, PathBuf)> {
    let names = [
        "red_1", "red_2", "green_1", "blue_1", "blue_2", "purple_1", "black_1",
    ];
    names
        .iter()
        .enumerate()
        .map(|(i, n)| (ProductId::new(i as i64 + 1), PathBuf::from(format!("img/{n}.jpg"))))
        .collect()
}

fn record(id: i64, name: &str) -> ProductRecord {
    ProductRecord {
        id: ProductId::new(id),
        name: name.to_string(),
        image_path: format!("img/{name}.jpg"),
        category: Some("shirts".to_string()),
        image_url: None,
        width: None,
        height: None,
    }
}

#[test]
fn test_catalog_index_then_search_from_fresh_process() {
    let (manager, temp_dir) = temp_manager(8);
    let embedder: Arc<dyn ImageEmbedder> = Arc::new(ColorEmbedder);
    let indexer = CatalogIndexer::new(manager, embedder.clone(), 3).unwrap();

    let report = indexer.index(&catalog()).unwrap();
    assert_eq!(report.indexed, 7);
    assert_eq!(report.degraded, 1); // purple is unknown
    assert_eq!(report.batches, 3);

    // A new manager stands in for a restarted service
    let restored = Arc::new(crate::common::manager_in(&temp_dir, 8));
    assert!(restored.load().unwrap());
    let service = SearchService::new(restored, SearchConfig::default());

    let query = embedder.embed_one(Path::new("red_1.jpg")).unwrap();
    let hits = service.search(&query, 3, 0.9).unwrap();
    let ids: Vec<i64> = hits.iter().map(|h| h.product_id.value()).collect();
    assert_eq!(ids, vec![1, 2]);

    // Product 2 was removed from the catalog after indexing
    let store = InMemoryProductStore::new([record(1, "red_1"), record(3, "green_1")]);
    let resolved = resolve_hits(&store, &hits);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].product.name, "red_1");
}

#[test]
fn test_indexer_rejects_mismatched_embedder() {
    let (manager, _dir): (Arc<VectorIndexManager>, _) = temp_manager(16);
    let result = CatalogIndexer::new(manager, Arc::new(ColorEmbedder), 4);
    assert!(result.is_err());
}
