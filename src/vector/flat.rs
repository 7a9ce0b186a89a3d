//! Exact (flat) nearest-neighbor index over unit-normalized vectors.
//!
//! Every query is compared against every stored row, so results are exact.
//! Rows live in one contiguous `Vec<f32>` (row `i` is slot `i`). Large
//! indexes are scanned in parallel chunks with per-chunk bounded heaps that
//! are merged afterwards; the outcome is identical to a sequential scan
//! because candidates are totally ordered by `(distance, slot)`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rayon::prelude::*;
use serde::Serialize;

use crate::vector::distance::{normalize_l2, squared_euclidean};
use crate::vector::types::{Slot, VectorDimension, VectorError};

/// Indexes smaller than this are scanned on the calling thread.
const PARALLEL_THRESHOLD: usize = 16_384;

/// Rows per parallel work unit.
const CHUNK_ROWS: usize = 2_048;

/// A single query result: an index slot and its squared Euclidean distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub slot: Slot,
    pub distance: f32,
}

impl Neighbor {
    /// Ascending distance, ties broken by ascending slot.
    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.slot.cmp(&other.slot))
    }
}

/// Heap entry; the max-heap keeps the worst retained candidate on top.
#[derive(Debug, Clone, Copy)]
struct Ranked(Neighbor);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.rank_cmp(&other.0)
    }
}

/// Brute-force exact index.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: VectorDimension,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Builds an index from raw rows, normalizing a private copy of each.
    ///
    /// Every row must have exactly `dimension` finite components.
    pub fn from_rows(dimension: VectorDimension, rows: &[Vec<f32>]) -> Result<Self, VectorError> {
        let dim = dimension.get();
        let mut data = Vec::with_capacity(rows.len() * dim);

        for row in rows {
            dimension.validate_vector(row)?;
            let start = data.len();
            data.extend_from_slice(row);
            normalize_l2(&mut data[start..]);
        }

        Ok(Self { dimension, data })
    }

    /// Wraps rows that were normalized before they were persisted.
    pub(crate) fn from_normalized(dimension: VectorDimension, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len() % dimension.get(), 0);
        Self { dimension, data }
    }

    /// Number of indexed vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension.get()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    /// Returns the normalized vector stored at `slot`.
    #[must_use]
    pub fn vector(&self, slot: Slot) -> Option<&[f32]> {
        let dim = self.dimension.get();
        let start = slot.get().checked_mul(dim)?;
        self.data.get(start..start + dim)
    }

    /// All rows as one contiguous slice, row-major.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns up to `top_n` nearest slots ordered by increasing distance.
    ///
    /// `query` must already be validated and normalized. `top_n` is clamped
    /// to the index size.
    #[must_use]
    pub fn search(&self, query: &[f32], top_n: usize) -> Vec<Neighbor> {
        debug_assert_eq!(query.len(), self.dimension.get());

        let top_n = top_n.min(self.len());
        if top_n == 0 {
            return Vec::new();
        }

        let dim = self.dimension.get();
        let heap = if self.len() < PARALLEL_THRESHOLD {
            scan_rows(&self.data, dim, 0, query, top_n)
        } else {
            self.data
                .par_chunks(CHUNK_ROWS * dim)
                .enumerate()
                .map(|(chunk, rows)| scan_rows(rows, dim, chunk * CHUNK_ROWS, query, top_n))
                .reduce(BinaryHeap::new, |mut merged, partial| {
                    for candidate in partial {
                        push_bounded(&mut merged, candidate, top_n);
                    }
                    merged
                })
        };

        heap.into_sorted_vec().into_iter().map(|r| r.0).collect()
    }
}

/// Scans contiguous rows starting at slot `first_slot`, keeping the best `k`.
fn scan_rows(
    rows: &[f32],
    dim: usize,
    first_slot: usize,
    query: &[f32],
    k: usize,
) -> BinaryHeap<Ranked> {
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (offset, row) in rows.chunks_exact(dim).enumerate() {
        let candidate = Ranked(Neighbor {
            slot: Slot::new(first_slot + offset),
            distance: squared_euclidean(query, row),
        });
        push_bounded(&mut heap, candidate, k);
    }

    heap
}

fn push_bounded(heap: &mut BinaryHeap<Ranked>, candidate: Ranked, k: usize) {
    if heap.len() < k {
        heap.push(candidate);
    } else if let Some(worst) = heap.peek()
        && candidate < *worst
    {
        heap.pop();
        heap.push(candidate);
    }
}
