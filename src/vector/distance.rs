//! Distance and normalization primitives for unit-normalized embeddings.
//!
//! All index vectors and queries pass through [`normalize_l2`] before any
//! distance is computed, which makes squared Euclidean distance rank results
//! exactly like cosine similarity.

/// Norms below this are treated as the zero vector and left untouched.
const EPSILON: f32 = 1e-10;

/// Scales a vector to unit L2 norm in place.
///
/// Zero vectors (the placeholder produced for failed embeddings) stay zero.
pub fn normalize_l2(vector: &mut [f32]) {
    let norm = l2_norm(vector);
    if norm > EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Returns a unit-normalized copy of a vector.
#[must_use]
pub fn normalized(vector: &[f32]) -> Vec<f32> {
    let mut copy = vector.to_vec();
    normalize_l2(&mut copy);
    copy
}

/// Euclidean norm of a vector.
#[must_use]
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Squared Euclidean distance between two vectors of equal length.
#[inline]
#[must_use]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

/// Cosine similarity between two vectors, 0.0 if either has zero norm.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
