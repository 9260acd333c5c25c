//! Vector similarity and candidate selection.

use std::cmp::Ordering;

use codebrief_core::BriefError;

/// Cosine similarity between two vectors of equal length.
///
/// A zero vector on either side scores `0.0`.
///
/// # Errors
///
/// Returns [`BriefError::DimensionMismatch`] when the lengths differ.
///
/// # Examples
///
/// ```
/// use codebrief_codelens::similarity::cosine_similarity;
///
/// let score = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap();
/// assert!((score - 1.0).abs() < 1e-9);
/// assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).is_err());
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, BriefError> {
    if a.len() != b.len() {
        return Err(BriefError::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / denom).clamp(-1.0, 1.0))
}

/// Score every candidate against `query`, failing on the first shape mismatch.
///
/// # Errors
///
/// Returns [`BriefError::DimensionMismatch`] if any candidate's length differs
/// from the query's.
pub fn score_all<V: AsRef<[f32]>>(query: &[f32], candidates: &[V]) -> Result<Vec<f64>, BriefError> {
    candidates
        .iter()
        .map(|candidate| cosine_similarity(query, candidate.as_ref()))
        .collect()
}

/// Indices of the `k` highest scores, best first. Ties keep input order.
///
/// # Examples
///
/// ```
/// use codebrief_codelens::similarity::top_k_indices;
///
/// assert_eq!(top_k_indices(&[0.1, 0.9, 0.5], 2), vec![1, 2]);
/// ```
pub fn top_k_indices(scores: &[f64], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
    });
    order.truncate(k);
    order
}
