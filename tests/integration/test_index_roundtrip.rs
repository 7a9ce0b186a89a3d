//! Persistence round trips and on-disk corruption handling.

use crate::common::{DIM, manager_in, product_ids, random_vectors};
use lookalike::vector::IndexMetadata;
use lookalike::{Corruption, IndexError, IndexStatus};
use std::fs;
use tempfile::TempDir;

fn saved_index(count: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager_in(&temp_dir, DIM);
    manager
        .build(&random_vectors(count, DIM, 7), &product_ids(1, count))
        .unwrap();
    manager.save().unwrap();
    temp_dir
}

#[test]
fn test_roundtrip_preserves_every_query() {
    let temp_dir = TempDir::new().unwrap();
    let original = manager_in(&temp_dir, DIM);
    let vectors = random_vectors(200, DIM, 42);
    original.build(&vectors, &product_ids(1000, 200)).unwrap();
    original.save().unwrap();

    let restored = manager_in(&temp_dir, DIM);
    assert!(restored.index_exists());
    assert!(restored.load().unwrap());

    for query in random_vectors(10, DIM, 43) {
        assert_eq!(
            original.query(&query, 25).unwrap(),
            restored.query(&query, 25).unwrap()
        );
    }

    let before = original.snapshot().unwrap();
    let after = restored.snapshot().unwrap();
    assert_eq!(before.product_ids(), after.product_ids());
    assert_eq!(before.index().as_slice(), after.index().as_slice());
}

#[test]
fn test_metadata_records_mapping() {
    let temp_dir = saved_index(10);
    let manager = manager_in(&temp_dir, DIM);

    let metadata = IndexMetadata::load(&manager.paths().metadata_path).unwrap();
    assert_eq!(metadata.product_ids, product_ids(1, 10));
    assert_eq!(metadata.embedding_dim, DIM);
    assert_eq!(metadata.num_products, 10);
    assert!(metadata.index_checksum.is_some());
}

#[test]
fn test_stats_before_and_after_build() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager_in(&temp_dir, DIM);

    let stats = manager.stats();
    assert_eq!(stats.status, IndexStatus::NotLoaded);

    manager
        .build(&random_vectors(10, DIM, 1), &product_ids(1, 10))
        .unwrap();
    let stats = manager.stats();
    assert_eq!(stats.status, IndexStatus::Loaded);
    assert_eq!(stats.count, Some(10));
    assert_eq!(stats.dimension, Some(512));
}

#[test]
fn test_missing_metadata_means_no_index() {
    let temp_dir = saved_index(5);
    let manager = manager_in(&temp_dir, DIM);
    fs::remove_file(&manager.paths().metadata_path).unwrap();

    assert!(!manager.index_exists());
    assert!(!manager.load().unwrap());
    assert!(!manager.is_loaded());
}

#[test]
fn test_truncated_index_is_corrupt() {
    let temp_dir = saved_index(5);
    let manager = manager_in(&temp_dir, DIM);
    let path = &manager.paths().index_path;
    let bytes = fs::read(path).unwrap();
    fs::write(path, &bytes[..bytes.len() / 2]).unwrap();

    assert!(matches!(
        manager.load(),
        Err(IndexError::CorruptIndex {
            check: Corruption::Truncated { .. },
            ..
        })
    ));
}

#[test]
fn test_header_overflowing_sizes_is_corrupt() {
    let temp_dir = saved_index(5);
    let manager = manager_in(&temp_dir, DIM);
    let path = &manager.paths().index_path;
    let mut bytes = fs::read(path).unwrap();
    bytes[8..12].copy_from_slice(&u32::MAX.to_le_bytes());
    bytes[12..16].copy_from_slice(&u32::MAX.to_le_bytes());
    bytes.truncate(16);
    fs::write(path, &bytes).unwrap();

    assert!(matches!(
        manager.load(),
        Err(IndexError::CorruptIndex {
            check: Corruption::OversizedHeader { .. },
            ..
        })
    ));
    assert!(!manager.is_loaded());
}

#[test]
fn test_flipped_byte_is_corrupt() {
    let temp_dir = saved_index(5);
    let manager = manager_in(&temp_dir, DIM);
    let path = &manager.paths().index_path;
    let mut bytes = fs::read(path).unwrap();
    bytes[100] ^= 0x40;
    fs::write(path, &bytes).unwrap();

    let err = manager.load().unwrap_err();
    assert_eq!(err.status_code(), "INDEX_CORRUPTED");
}

#[test]
fn test_metadata_count_disagreeing_with_index_is_corrupt() {
    let temp_dir = saved_index(5);
    let manager = manager_in(&temp_dir, DIM);

    let metadata = IndexMetadata::load(&manager.paths().metadata_path).unwrap();
    let mut ids = metadata.product_ids.clone();
    ids.push(lookalike::ProductId::new(99));
    let tampered = IndexMetadata {
        num_products: ids.len(),
        product_ids: ids,
        ..metadata
    };
    fs::write(&manager.paths().metadata_path, tampered.to_json().unwrap()).unwrap();

    assert!(matches!(
        manager.load(),
        Err(IndexError::CorruptIndex {
            check: Corruption::CountMismatch {
                metadata: 6,
                index: 5
            },
            ..
        })
    ));
}

#[test]
fn test_stale_embeddings_file_is_corrupt() {
    let fresh = saved_index(5);
    let stale = saved_index(3);
    let manager = manager_in(&fresh, DIM);
    let other = manager_in(&stale, DIM);
    fs::copy(
        &other.paths().embeddings_path,
        &manager.paths().embeddings_path,
    )
    .unwrap();

    assert!(matches!(
        manager.load(),
        Err(IndexError::CorruptIndex {
            check: Corruption::EmbeddingsMismatch { .. },
            ..
        })
    ));
}

#[test]
fn test_failed_load_keeps_current_index() {
    let temp_dir = saved_index(5);
    let manager = manager_in(&temp_dir, DIM);
    assert!(manager.load().unwrap());

    fs::write(&manager.paths().index_path, b"garbage").unwrap();
    assert!(manager.load().is_err());
    assert_eq!(manager.stats().count, Some(5));
}

#[test]
fn test_resave_replaces_artifacts() {
    let temp_dir = saved_index(5);
    let manager = manager_in(&temp_dir, DIM);
    manager
        .build(&random_vectors(8, DIM, 99), &product_ids(50, 8))
        .unwrap();
    manager.save().unwrap();

    let reader = manager_in(&temp_dir, DIM);
    assert!(reader.load().unwrap());
    assert_eq!(reader.stats().count, Some(8));
    assert_eq!(
        reader.snapshot().unwrap().product_ids(),
        product_ids(50, 8).as_slice()
    );

    // Only the three artifacts remain; no temp files are left behind
    let entries = fs::read_dir(temp_dir.path().join("index")).unwrap().count();
    assert_eq!(entries, 3);
}
