//! Pooling and normalization of token embeddings.
//!
//! Query vectors are the mean of their token vectors scaled to unit length,
//! so the store's cosine similarity reduces to a dot product. The local
//! model's mean is taken by fastembed under the attention mask; both
//! providers normalize here.

/// Average token vectors component-wise.
///
/// Returns a zero vector of `dimensions` when there are no tokens.
pub fn mean_pool(token_vectors: &[Vec<f32>], dimensions: usize) -> Vec<f32> {
    let mut pooled = vec![0.0; dimensions];
    if token_vectors.is_empty() {
        return pooled;
    }

    for token in token_vectors {
        for (acc, value) in pooled.iter_mut().zip(token) {
            *acc += value;
        }
    }

    let count = token_vectors.len() as f32;
    for value in &mut pooled {
        *value /= count;
    }

    pooled
}

/// Scale a vector to unit L2 norm in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}
