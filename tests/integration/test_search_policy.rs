//! Ranking and threshold behavior through the public search API.

use crate::common::{DIM, product_ids, random_vectors, temp_manager};
use lookalike::config::SearchConfig;
use lookalike::{IndexError, InvalidInput, ProductId, SearchRequest, SearchService};
use std::collections::HashSet;

fn ten_product_service() -> (SearchService, Vec<Vec<f32>>, tempfile::TempDir) {
    let (manager, temp_dir) = temp_manager(DIM);
    let vectors = random_vectors(10, DIM, 2024);
    manager.build(&vectors, &product_ids(1, 10)).unwrap();
    (
        SearchService::new(manager, SearchConfig::default()),
        vectors,
        temp_dir,
    )
}

#[test]
fn test_query_with_indexed_vector_finds_itself_first() {
    let (service, vectors, _dir) = ten_product_service();

    let hits = service.search(&vectors[4], 10, 0.0).unwrap();
    assert_eq!(hits[0].product_id, ProductId::new(5));
    assert!((hits[0].similarity.get() - 1.0).abs() < 1e-5);
}

#[test]
fn test_k_three_threshold_zero_returns_three_descending() {
    let (service, vectors, _dir) = ten_product_service();

    let hits = service.search(&vectors[0], 3, 0.0).unwrap();
    assert_eq!(hits.len(), 3);
    assert!(
        hits.windows(2)
            .all(|w| w[0].similarity.get() >= w[1].similarity.get())
    );
}

#[test]
fn test_similarities_stay_in_unit_range() {
    let (service, _, _dir) = ten_product_service();

    for query in random_vectors(20, DIM, 5) {
        for hit in service.search(&query, 10, 0.0).unwrap() {
            let s = hit.similarity.get();
            assert!((-1e-5..=1.0 + 1e-5).contains(&s), "similarity {s} out of range");
        }
    }
}

#[test]
fn test_raising_threshold_only_removes_results() {
    let (service, _, _dir) = ten_product_service();
    let query = random_vectors(1, DIM, 77).remove(0);

    let mut previous: Option<HashSet<ProductId>> = None;
    for threshold in [0.0, 0.02, 0.05, 0.1, 0.3, 0.9] {
        let hits = service.search(&query, 10, threshold).unwrap();
        assert!(hits.iter().all(|h| h.similarity.get() >= threshold));

        let ids: HashSet<ProductId> = hits.iter().map(|h| h.product_id).collect();
        if let Some(looser) = &previous {
            assert!(ids.is_subset(looser));
        }
        previous = Some(ids);
    }
}

#[test]
fn test_result_count_never_exceeds_k() {
    let (service, vectors, _dir) = ten_product_service();

    for k in 1..=12 {
        let hits = service.search(&vectors[2], k, 0.0).unwrap();
        assert!(hits.len() <= k);
        assert_eq!(hits.len(), k.min(10));
    }
}

#[test]
fn test_huge_k_does_not_overflow() {
    let (service, vectors, _dir) = ten_product_service();
    let hits = service.search(&vectors[0], usize::MAX, 0.0).unwrap();
    assert_eq!(hits.len(), 10);
}

#[test]
fn test_search_before_build_is_not_loaded() {
    let (manager, _dir) = temp_manager(DIM);
    let service = SearchService::new(manager, SearchConfig::default());

    let query = random_vectors(1, DIM, 1).remove(0);
    assert!(matches!(
        service.search(&query, 5, 0.3),
        Err(IndexError::NotLoaded)
    ));
}

#[test]
fn test_empty_and_mismatched_builds_are_rejected() {
    let (manager, _dir) = temp_manager(DIM);

    assert!(matches!(
        manager.build(&[], &[]),
        Err(IndexError::InvalidInput(InvalidInput::EmptyBatch))
    ));
    assert!(matches!(
        manager.build(&random_vectors(3, DIM, 1), &product_ids(1, 2)),
        Err(IndexError::InvalidInput(InvalidInput::LengthMismatch { .. }))
    ));
    assert!(!manager.is_loaded());
}

#[test]
fn test_zero_placeholder_vectors_are_searchable() {
    let (manager, _dir) = temp_manager(4);
    manager
        .build(
            &[vec![1.0, 0.0, 0.0, 0.0], vec![0.0; 4], vec![0.0, 1.0, 0.0, 0.0]],
            &product_ids(1, 3),
        )
        .unwrap();
    let service = SearchService::new(manager, SearchConfig::default());

    // A zero vector sits at distance 1 from every unit vector: similarity 0.5
    let hits = service.search(&[0.0, 0.0, 1.0, 0.0], 3, 0.0).unwrap();
    let placeholder = hits
        .iter()
        .find(|h| h.product_id == ProductId::new(2))
        .unwrap();
    assert!((placeholder.similarity.get() - 0.5).abs() < 1e-6);
}

#[test]
fn test_request_bounds_apply_at_the_boundary() {
    let (service, vectors, _dir) = ten_product_service();

    let err = service
        .search_request(&vectors[0], &SearchRequest::new().with_k(500))
        .unwrap_err();
    assert_eq!(err.status_code(), "INVALID_INPUT");

    let hits = service
        .search_request(
            &vectors[0],
            &SearchRequest::new().with_k(3).with_threshold(0.0),
        )
        .unwrap();
    assert_eq!(hits.len(), 3);
}
