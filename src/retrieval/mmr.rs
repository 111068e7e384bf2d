//! Maximal Marginal Relevance selection

use crate::retrieval::{cosine_similarity, ScoredDocument};

/// Anything MMR can select: an embedding plus a relevance score
pub trait MmrCandidate {
    fn embedding(&self) -> &[f32];
    fn relevance_score(&self) -> f32;
}

impl MmrCandidate for ScoredDocument {
    fn embedding(&self) -> &[f32] {
        &self.document.embedding
    }

    /// The fused hybrid score
    fn relevance_score(&self) -> f32 {
        self.hybrid_score
    }
}

/// Greedily select up to `top_k` candidates balancing relevance and novelty
///
/// Each step picks the remaining candidate maximizing
/// `lambda * relevance - (1 - lambda) * max_sim(candidate, selected)`.
/// The first pick is the most relevant candidate. Exact ties go to the
/// candidate that appears first in `candidates`.
///
/// When there are no more candidates than `top_k`, they are returned as-is.
/// A candidate with a non-finite relevance score is ranked by its similarity
/// to `query_embedding` instead.
///
/// # Returns
/// Selected candidates in selection order
pub fn apply_mmr<T: MmrCandidate + Clone>(
    candidates: &[T],
    query_embedding: &[f32],
    top_k: usize,
    lambda: f32,
) -> Vec<T> {
    if top_k == 0 || candidates.is_empty() {
        return Vec::new();
    }
    if candidates.len() <= top_k {
        return candidates.to_vec();
    }

    let lambda = if lambda.is_nan() {
        1.0
    } else {
        lambda.clamp(0.0, 1.0)
    };

    let relevance: Vec<f32> = candidates
        .iter()
        .map(|c| {
            let score = c.relevance_score();
            if score.is_finite() {
                score
            } else {
                cosine_similarity(query_embedding, c.embedding())
            }
        })
        .collect();

    // Indices not yet selected, kept in input order so strict `>` breaks ties
    // toward the earliest candidate
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut selected: Vec<usize> = Vec::with_capacity(top_k);

    let mut seed = 0;
    for pos in 1..remaining.len() {
        if relevance[remaining[pos]] > relevance[remaining[seed]] {
            seed = pos;
        }
    }
    selected.push(remaining.remove(seed));

    // Running max similarity of each candidate to the selected set
    let mut max_sim = vec![f32::NEG_INFINITY; candidates.len()];

    while selected.len() < top_k && !remaining.is_empty() {
        let last = candidates[selected[selected.len() - 1]].embedding();
        let mut best: Option<(usize, f32)> = None;

        for (pos, &idx) in remaining.iter().enumerate() {
            let sim = cosine_similarity(candidates[idx].embedding(), last);
            if sim > max_sim[idx] {
                max_sim[idx] = sim;
            }

            let score = lambda * relevance[idx] - (1.0 - lambda) * max_sim[idx];
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((pos, score));
            }
        }

        match best {
            Some((pos, _)) => selected.push(remaining.remove(pos)),
            None => break,
        }
    }

    selected
        .into_iter()
        .map(|idx| candidates[idx].clone())
        .collect()
}
