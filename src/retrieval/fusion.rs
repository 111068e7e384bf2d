//! Reciprocal Rank Fusion for combining two index-aligned score lists

use std::cmp::Ordering;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FusionError {
    #[error("Score lists differ in length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Invalid RRF constant {0}: must be a positive number")]
    InvalidConstant(f32),
}

/// Convert scores to 1-indexed ranks (rank 1 = highest score)
///
/// Ties keep their original relative order. NaN ranks below every number.
pub fn rank_positions(scores: &[f32]) -> Vec<usize> {
    let key = |i: usize| {
        let s = scores[i];
        if s.is_nan() {
            f32::NEG_INFINITY
        } else {
            s
        }
    };

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0; scores.len()];
    for (position, idx) in order.into_iter().enumerate() {
        ranks[idx] = position + 1;
    }
    ranks
}

/// Apply Reciprocal Rank Fusion to two index-aligned score lists
///
/// RRF formula: score(i) = 1 / (k + rank_a(i)) + 1 / (k + rank_b(i))
///
/// Only ranks matter, so the lists may be on unrelated scales (unbounded
/// BM25 next to bounded cosine similarity).
///
/// # Returns
/// One fused score per item, in input order
pub fn reciprocal_rank_fusion(
    scores_a: &[f32],
    scores_b: &[f32],
    k: f32,
) -> Result<Vec<f32>, FusionError> {
    if scores_a.len() != scores_b.len() {
        return Err(FusionError::LengthMismatch {
            left: scores_a.len(),
            right: scores_b.len(),
        });
    }

    if !(k.is_finite() && k > 0.0) {
        return Err(FusionError::InvalidConstant(k));
    }

    let ranks_a = rank_positions(scores_a);
    let ranks_b = rank_positions(scores_b);

    Ok(ranks_a
        .iter()
        .zip(&ranks_b)
        .map(|(&ra, &rb)| 1.0 / (k + ra as f32) + 1.0 / (k + rb as f32))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_positions() {
        assert_eq!(rank_positions(&[0.2, 0.9, 0.5]), vec![3, 1, 2]);
        assert_eq!(rank_positions(&[]), Vec::<usize>::new());
    }

    #[test]
    fn test_ties_keep_input_order() {
        assert_eq!(rank_positions(&[0.0, 0.0, 0.0]), vec![1, 2, 3]);
        assert_eq!(rank_positions(&[0.5, 1.0, 0.5]), vec![2, 1, 3]);
    }

    #[test]
    fn test_nan_ranks_last() {
        assert_eq!(rank_positions(&[f32::NAN, 0.1, 0.3]), vec![3, 2, 1]);
    }

    #[test]
    fn test_rrf_top_in_both_wins() {
        let fused = reciprocal_rank_fusion(&[1.0, 0.5, 0.1], &[0.95, 0.4, 0.2], 60.0).unwrap();

        assert_eq!(fused.len(), 3);
        assert!(fused[0] > fused[1]);
        assert!(fused[0] > fused[2]);
        assert!((fused[0] - 2.0 / 61.0).abs() < 1e-7);
    }

    #[test]
    fn test_rrf_formula() {
        let fused = reciprocal_rank_fusion(&[3.0, 1.0, 2.0], &[0.1, 0.3, 0.2], 60.0).unwrap();

        assert_eq!(fused[0], 1.0 / 61.0 + 1.0 / 63.0);
        assert_eq!(fused[1], 1.0 / 63.0 + 1.0 / 61.0);
        assert_eq!(fused[2], 1.0 / 62.0 + 1.0 / 62.0);
    }

    #[test]
    fn test_rrf_ignores_scale() {
        let small = reciprocal_rank_fusion(&[0.3, 0.2, 0.1], &[0.9, 0.8, 0.7], 60.0).unwrap();
        let large = reciprocal_rank_fusion(&[300.0, 20.0, 1.0], &[0.9, 0.8, 0.7], 60.0).unwrap();
        assert_eq!(small, large);
    }

    #[test]
    fn test_rrf_rejects_bad_input() {
        assert_eq!(
            reciprocal_rank_fusion(&[1.0], &[1.0, 2.0], 60.0),
            Err(FusionError::LengthMismatch { left: 1, right: 2 })
        );
        assert_eq!(
            reciprocal_rank_fusion(&[1.0], &[1.0], 0.0),
            Err(FusionError::InvalidConstant(0.0))
        );
    }

    #[test]
    fn test_rrf_empty() {
        assert!(reciprocal_rank_fusion(&[], &[], 60.0).unwrap().is_empty());
    }
}
