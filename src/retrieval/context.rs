//! Retrieval output handed to prompt enhancement

use crate::retrieval::{cosine_similarity, ScoredDocument};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which code path produced a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMethod {
    /// Lexical and semantic signals fused
    Hybrid,
    /// Only the semantic signal discriminated between documents
    Semantic,
    /// Only the lexical signal discriminated between documents
    Bm25,
    /// No documents; grounding comes from the theme alone
    ThemeOnly,
}

impl RetrievalMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMethod::Hybrid => "hybrid",
            RetrievalMethod::Semantic => "semantic",
            RetrievalMethod::Bm25 => "bm25",
            RetrievalMethod::ThemeOnly => "theme_only",
        }
    }
}

impl fmt::Display for RetrievalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary scores for observability
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RetrievalMetrics {
    pub top_bm25_score: f32,
    pub top_semantic_score: f32,
    pub top_hybrid_score: f32,
    /// Mean pairwise `1 - cosine` across the selected documents
    pub diversity_score: f32,
}

impl RetrievalMetrics {
    /// Top scores over every scored candidate, diversity over the selection
    pub fn compute(scored: &[ScoredDocument], selected: &[ScoredDocument]) -> Self {
        Self {
            top_bm25_score: top_score(scored, |d| d.bm25_score),
            top_semantic_score: top_score(scored, |d| d.semantic_score),
            top_hybrid_score: top_score(scored, |d| d.hybrid_score),
            diversity_score: diversity_score(selected),
        }
    }
}

fn top_score(documents: &[ScoredDocument], score: impl Fn(&ScoredDocument) -> f32) -> f32 {
    documents
        .iter()
        .map(|d| score(d))
        .fold(None, |best: Option<f32>, s| Some(best.map_or(s, |b| b.max(s))))
        .unwrap_or(0.0)
}

/// Mean pairwise dissimilarity; 0 with fewer than two documents
pub fn diversity_score(documents: &[ScoredDocument]) -> f32 {
    let mut total = 0.0f32;
    let mut pairs = 0usize;

    for (i, a) in documents.iter().enumerate() {
        for b in &documents[i + 1..] {
            total += 1.0 - cosine_similarity(&a.document.embedding, &b.document.embedding);
            pairs += 1;
        }
    }

    if pairs == 0 {
        0.0
    } else {
        total / pairs as f32
    }
}

/// Context assembled for one prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalContext {
    /// Selected documents, best first
    pub relevant_documents: Vec<ScoredDocument>,

    /// Texts of the selected documents, same order
    pub supporting_descriptions: Vec<String>,

    /// Synthesized description of the brand theme
    pub theme_description: String,

    /// Embedding of the theme description
    pub theme_embedding: Vec<f32>,

    /// Mean semantic score of the selected documents
    pub average_similarity: f32,

    pub method: RetrievalMethod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<RetrievalMetrics>,
}

impl RetrievalContext {
    /// The fully-empty context returned when retrieval itself failed
    pub fn empty() -> Self {
        Self {
            relevant_documents: Vec::new(),
            supporting_descriptions: Vec::new(),
            theme_description: String::new(),
            theme_embedding: Vec::new(),
            average_similarity: 0.0,
            method: RetrievalMethod::ThemeOnly,
            metrics: None,
        }
    }

    /// Theme-only grounding: no project documents were usable
    pub fn theme_only(theme_description: String, theme_embedding: Vec<f32>) -> Self {
        Self {
            theme_description,
            theme_embedding,
            average_similarity: 1.0,
            ..Self::empty()
        }
    }

    /// Context built from selected documents
    pub fn from_selection(
        method: RetrievalMethod,
        selected: Vec<ScoredDocument>,
        metrics: RetrievalMetrics,
        theme_description: String,
        theme_embedding: Vec<f32>,
    ) -> Self {
        let average_similarity = if selected.is_empty() {
            0.0
        } else {
            selected.iter().map(|d| d.semantic_score).sum::<f32>() / selected.len() as f32
        };
        let supporting_descriptions = selected.iter().map(|d| d.text().to_string()).collect();

        Self {
            relevant_documents: selected,
            supporting_descriptions,
            theme_description,
            theme_embedding,
            average_similarity,
            method,
            metrics: Some(metrics),
        }
    }

    /// Supporting descriptions followed by the theme description
    pub fn grounding_texts(&self) -> Vec<&str> {
        let mut texts: Vec<&str> = self
            .supporting_descriptions
            .iter()
            .map(String::as_str)
            .collect();
        if !self.theme_description.is_empty() {
            texts.push(&self.theme_description);
        }
        texts
    }

    pub fn is_empty(&self) -> bool {
        self.relevant_documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::Document;

    fn scored(id: &str, embedding: Vec<f32>, semantic: f32) -> ScoredDocument {
        let document = Document::new(id, format!("text {}", id), embedding).unwrap();
        ScoredDocument::new(document, 1.0, semantic, 0.03)
    }

    #[test]
    fn test_method_serialization() {
        assert_eq!(
            serde_json::to_string(&RetrievalMethod::ThemeOnly).unwrap(),
            "\"theme_only\""
        );
        assert_eq!(RetrievalMethod::Bm25.to_string(), "bm25");
    }

    #[test]
    fn test_diversity_score() {
        assert_eq!(diversity_score(&[]), 0.0);
        assert_eq!(diversity_score(&[scored("a", vec![1.0, 0.0], 0.5)]), 0.0);

        let same = [
            scored("a", vec![1.0, 0.0], 0.5),
            scored("b", vec![2.0, 0.0], 0.5),
        ];
        assert!(diversity_score(&same).abs() < 1e-6);

        let orthogonal = [
            scored("a", vec![1.0, 0.0], 0.5),
            scored("b", vec![0.0, 1.0], 0.5),
            scored("c", vec![-1.0, 0.0], 0.5),
        ];
        // pairs: 1.0, 2.0, 1.0
        assert!((diversity_score(&orthogonal) - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_selection() {
        let selected = vec![
            scored("a", vec![1.0, 0.0], 0.8),
            scored("b", vec![0.0, 1.0], 0.4),
        ];
        let metrics = RetrievalMetrics::compute(&selected, &selected);
        let context = RetrievalContext::from_selection(
            RetrievalMethod::Hybrid,
            selected,
            metrics,
            "Brand theme \"Acme\".".to_string(),
            vec![0.1, 0.2],
        );

        assert!((context.average_similarity - 0.6).abs() < 1e-6);
        assert_eq!(context.supporting_descriptions, vec!["text a", "text b"]);
        assert_eq!(
            context.grounding_texts(),
            vec!["text a", "text b", "Brand theme \"Acme\"."]
        );
        assert_eq!(context.metrics.unwrap().top_semantic_score, 0.8);
    }

    #[test]
    fn test_theme_only_and_empty() {
        let context = RetrievalContext::theme_only("Brand theme.".to_string(), vec![1.0]);
        assert!(context.is_empty());
        assert_eq!(context.method, RetrievalMethod::ThemeOnly);
        assert_eq!(context.average_similarity, 1.0);
        assert_eq!(context.grounding_texts(), vec!["Brand theme."]);

        let empty = RetrievalContext::empty();
        assert_eq!(empty.average_similarity, 0.0);
        assert!(empty.theme_embedding.is_empty());
        assert!(empty.grounding_texts().is_empty());
    }
}
