//! Input readers for the CLI.
//!
//! Embeddings for `build` arrive as JSON Lines, one product per line:
//! `{"product_id": 17, "embedding": [0.12, -0.03, ...]}`. A query vector is a
//! plain JSON array of numbers.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;

use crate::error::{IndexError, IndexResult, InvalidInput};
use crate::types::ProductId;

#[derive(Debug, Deserialize)]
struct EmbeddingRecord {
    product_id: ProductId,
    embedding: Vec<f32>,
}

/// Product ids and their embeddings in file order.
#[derive(Debug, Default, PartialEq)]
pub struct EmbeddingBatch {
    pub ids: Vec<ProductId>,
    pub vectors: Vec<Vec<f32>>,
}

impl EmbeddingBatch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

fn read_err(path: &Path) -> impl Fn(std::io::Error) -> IndexError + '_ {
    move |source| IndexError::FileRead {
        path: path.to_path_buf(),
        source,
    }
}

/// Reads a JSON Lines embeddings file. Blank lines are skipped; line numbers
/// in errors are 1-based.
pub fn read_embeddings_jsonl(path: &Path) -> IndexResult<EmbeddingBatch> {
    let reader = BufReader::new(File::open(path).map_err(read_err(path))?);
    let mut batch = EmbeddingBatch::default();

    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(read_err(path))?;
        if line.trim().is_empty() {
            continue;
        }

        let record: EmbeddingRecord =
            serde_json::from_str(&line).map_err(|e| InvalidInput::MalformedRecord {
                line: number + 1,
                reason: e.to_string(),
            })?;
        batch.ids.push(record.product_id);
        batch.vectors.push(record.embedding);
    }

    Ok(batch)
}

/// Reads a query vector stored as a JSON array.
pub fn read_query_vector(path: &Path) -> IndexResult<Vec<f32>> {
    let json = std::fs::read_to_string(path).map_err(read_err(path))?;
    let vector = serde_json::from_str(&json).map_err(|e| InvalidInput::MalformedRecord {
        line: e.line(),
        reason: e.to_string(),
    })?;
    Ok(vector)
}
