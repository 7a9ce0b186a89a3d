//! Searches running while the index is rebuilt see one consistent index.

use crate::common::{product_ids, random_vectors, temp_manager};
use lookalike::config::SearchConfig;
use lookalike::{ProductId, SearchService};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const DIM: usize = 64;

#[test]
fn test_searches_during_rebuild_see_old_or_new_index() {
    let (manager, _dir) = temp_manager(DIM);
    let old_vectors = random_vectors(300, DIM, 1);
    let new_vectors = random_vectors(300, DIM, 2);
    manager.build(&old_vectors, &product_ids(1, 300)).unwrap();

    let service = Arc::new(SearchService::new(manager.clone(), SearchConfig::default()));
    let done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let service = service.clone();
            let done = &done;
            let queries = random_vectors(20, DIM, 100 + worker);
            scope.spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    for query in &queries {
                        let hits = service.search(query, 10, 0.0).unwrap();
                        assert_eq!(hits.len(), 10);

                        // Every hit comes from the same generation
                        let old = hits.iter().all(|h| (1..=300).contains(&h.product_id.value()));
                        let new = hits
                            .iter()
                            .all(|h| (1001..=1300).contains(&h.product_id.value()));
                        assert!(old || new, "mixed generations in {hits:?}");
                    }
                }
            });
        }

        for round in 0..10 {
            let (vectors, first) = if round % 2 == 0 {
                (&new_vectors, 1001)
            } else {
                (&old_vectors, 1)
            };
            manager.build(vectors, &product_ids(first, 300)).unwrap();
        }
        done.store(true, Ordering::Relaxed);
    });

    assert_eq!(manager.stats().count, Some(300));
    // Round 9 rebuilt the original generation
    let snapshot = manager.snapshot().unwrap();
    assert_eq!(snapshot.product_ids()[0], ProductId::new(1));
}

#[test]
fn test_parallel_scan_matches_small_index_results() {
    // Large enough to take the parallel path
    let (large, _dir) = temp_manager(8);
    let vectors = random_vectors(40_000, 8, 9);
    large.build(&vectors, &product_ids(0, 40_000)).unwrap();

    let query = random_vectors(1, 8, 10).remove(0);
    let neighbors = large.query(&query, 50).unwrap();
    assert_eq!(neighbors.len(), 50);

    // Brute-force reference over the normalized copies
    let snapshot = large.snapshot().unwrap();
    let q = lookalike::vector::normalized(&query);
    let mut reference: Vec<(f32, usize)> = (0..snapshot.len())
        .map(|slot| {
            let row = snapshot
                .index()
                .vector(lookalike::vector::Slot::new(slot))
                .unwrap();
            (lookalike::vector::squared_euclidean(&q, row), slot)
        })
        .collect();
    reference.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let got: Vec<usize> = neighbors.iter().map(|n| n.slot.get()).collect();
    let want: Vec<usize> = reference.iter().take(50).map(|r| r.1).collect();
    assert_eq!(got, want);
}
