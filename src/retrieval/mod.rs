//! Hybrid retrieval over a project's prior content
//!
//! Ranks content by BM25 and embedding similarity, fuses the two rankings
//! with Reciprocal Rank Fusion, and picks a diverse final set with Maximal
//! Marginal Relevance. [`HybridRetriever`] drives the pipeline and falls back
//! to theme-only grounding when content or providers are unavailable.

mod bm25;
mod context;
mod deduplication;
mod document;
mod fusion;
mod hybrid;
mod mmr;
mod similarity;
mod tokenizer;

pub use bm25::compute_bm25_scores;
pub use context::{diversity_score, RetrievalContext, RetrievalMethod, RetrievalMetrics};
pub use deduplication::deduplicate_rows;
pub use document::{Document, ScoredDocument};
pub use fusion::{rank_positions, reciprocal_rank_fusion, FusionError};
pub use hybrid::{select, HybridRetriever, RetrievalError, RetrievalOutcome, Selection};
pub use mmr::{apply_mmr, MmrCandidate};
pub use similarity::{cosine_similarity, semantic_scores};
pub use tokenizer::{is_stop_word, tokenize};
