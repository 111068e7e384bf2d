//! Hybrid retrieval combining lexical and semantic signals

use crate::config::{Config, ConfigValidator, ProviderConfig, RetrievalConfig};
use crate::embedding::{EmbeddingError, EmbeddingProvider, EmbeddingResolver};
use crate::retrieval::{
    apply_mmr, compute_bm25_scores, deduplicate_rows, reciprocal_rank_fusion, semantic_scores,
    Document, FusionError, RetrievalContext, RetrievalMethod, RetrievalMetrics, ScoredDocument,
};
use crate::store::{ContentRow, ContentStore, StoreError};
use crate::theme::Theme;
use futures::FutureExt;
use std::cmp::Ordering;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Embedding generation failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Content store failed: {0}")]
    Store(#[from] StoreError),

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("{operation} panicked")]
    Panicked { operation: &'static str },

    #[error("Invalid retrieval config: {0}")]
    InvalidConfig(String),

    #[error("Rank fusion failed: {0}")]
    Fusion(#[from] FusionError),
}

/// Documents chosen by MMR together with the metrics of the run
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub documents: Vec<ScoredDocument>,
    pub metrics: RetrievalMetrics,
}

/// Result of one retrieval, before the theme is attached
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    /// Both signals ranked the candidates
    Hybrid(Selection),
    /// Every BM25 score was zero
    SemanticOnly(Selection),
    /// Every semantic score was zero
    Bm25Only(Selection),
    /// No usable content or a provider failed; the theme grounds the prompt
    ThemeOnly,
    /// Retrieval failed outright
    Empty,
}

impl RetrievalOutcome {
    pub fn method(&self) -> RetrievalMethod {
        match self {
            RetrievalOutcome::Hybrid(_) => RetrievalMethod::Hybrid,
            RetrievalOutcome::SemanticOnly(_) => RetrievalMethod::Semantic,
            RetrievalOutcome::Bm25Only(_) => RetrievalMethod::Bm25,
            RetrievalOutcome::ThemeOnly | RetrievalOutcome::Empty => RetrievalMethod::ThemeOnly,
        }
    }

    /// Build the context handed to prompt enhancement
    ///
    /// `Empty` discards the theme: an empty outcome means nothing about the
    /// call can be trusted.
    pub fn into_context(
        self,
        theme_description: String,
        theme_embedding: Vec<f32>,
    ) -> RetrievalContext {
        let method = self.method();
        match self {
            RetrievalOutcome::Hybrid(selection)
            | RetrievalOutcome::SemanticOnly(selection)
            | RetrievalOutcome::Bm25Only(selection) => RetrievalContext::from_selection(
                method,
                selection.documents,
                selection.metrics,
                theme_description,
                theme_embedding,
            ),
            RetrievalOutcome::ThemeOnly => {
                RetrievalContext::theme_only(theme_description, theme_embedding)
            }
            RetrievalOutcome::Empty => RetrievalContext::empty(),
        }
    }
}

/// Hybrid retriever over a project's prior content
///
/// Collaborators are injected at construction; the retriever itself holds no
/// mutable state and can serve concurrent calls through a shared reference.
pub struct HybridRetriever {
    store: Arc<dyn ContentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
    providers: ProviderConfig,
}

impl HybridRetriever {
    pub fn new(
        store: Arc<dyn ContentStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
            providers: ProviderConfig::default(),
        }
    }

    pub fn with_provider_config(mut self, providers: ProviderConfig) -> Self {
        self.providers = providers;
        self
    }

    /// Create a retriever from the loaded application config
    pub fn from_config(
        store: Arc<dyn ContentStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: &Config,
    ) -> Self {
        Self::new(store, embedder, config.retrieval.clone())
            .with_provider_config(config.providers.clone())
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Retrieve grounding context for one prompt
    ///
    /// Never fails. Provider failures degrade to a theme-only context and
    /// anything else to [`RetrievalContext::empty`]; `method` on the result
    /// tells which happened. A panicking collaborator counts as a failure.
    /// `config` overrides the retriever's default for this call only and is
    /// validated first.
    pub async fn retrieve(
        &self,
        project_id: &str,
        query: &str,
        theme: &Theme,
        config: Option<&RetrievalConfig>,
    ) -> RetrievalContext {
        let span = info_span!("retrieve", request_id = %Uuid::new_v4(), project_id);

        async move {
            let config = config.unwrap_or(&self.config);
            let started = Instant::now();

            let attempt = AssertUnwindSafe(self.try_retrieve(project_id, query, theme, config))
                .catch_unwind()
                .await;

            match attempt {
                Ok(Ok(context)) => {
                    info!(
                        "Retrieved {} documents via {} in {}ms",
                        context.relevant_documents.len(),
                        context.method,
                        started.elapsed().as_millis()
                    );
                    context
                }
                Ok(Err(e)) => {
                    warn!("Retrieval failed, returning empty context: {}", e);
                    RetrievalContext::empty()
                }
                Err(_) => {
                    warn!("Retrieval panicked, returning empty context");
                    RetrievalContext::empty()
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn try_retrieve(
        &self,
        project_id: &str,
        query: &str,
        theme: &Theme,
        config: &RetrievalConfig,
    ) -> Result<RetrievalContext, RetrievalError> {
        ConfigValidator::validate_retrieval(config)
            .map_err(|e| RetrievalError::InvalidConfig(e.to_string()))?;

        let theme_description = theme.describe();

        let (query_embedding, rows, theme_embedding) = tokio::join!(
            self.bounded("Query embedding", self.embedder.embed_query(query)),
            self.bounded("Content listing", self.store.list_by_project(project_id)),
            self.bounded(
                "Theme embedding",
                self.embedder.embed_document(&theme_description)
            ),
        );

        let theme_embedding = theme_embedding?;

        let outcome = match (query_embedding, rows) {
            (Ok(query_embedding), Ok(rows)) => {
                self.rank(query, &query_embedding, rows, config).await?
            }
            (Err(e), _) => {
                warn!("Query embedding unavailable, using theme only: {}", e);
                RetrievalOutcome::ThemeOnly
            }
            (_, Err(e)) => {
                warn!("Project content unavailable, using theme only: {}", e);
                RetrievalOutcome::ThemeOnly
            }
        };

        Ok(outcome.into_context(theme_description, theme_embedding))
    }

    /// Run a provider call under the provider timeout, catching panics
    async fn bounded<T, E>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, RetrievalError>
    where
        RetrievalError: From<E>,
    {
        let call = AssertUnwindSafe(call).catch_unwind();

        match tokio::time::timeout(self.providers.timeout(), call).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(_)) => Err(RetrievalError::Panicked { operation }),
            Err(_) => Err(RetrievalError::Timeout {
                operation,
                timeout_ms: self.providers.timeout_ms,
            }),
        }
    }

    async fn rank(
        &self,
        query: &str,
        query_embedding: &[f32],
        rows: Vec<ContentRow>,
        config: &RetrievalConfig,
    ) -> Result<RetrievalOutcome, RetrievalError> {
        let listed = rows.len();
        let rows = deduplicate_rows(rows);
        if rows.is_empty() {
            debug!("Project has no content");
            return Ok(RetrievalOutcome::ThemeOnly);
        }

        let resolver = EmbeddingResolver::new(
            Arc::clone(&self.store),
            self.providers.max_concurrent_lookups,
            self.providers.timeout(),
        );
        let (documents, stats) = resolver.resolve(rows).await;
        debug!(
            "Resolved {} of {} rows ({} bundled, {} fetched, {} excluded)",
            documents.len(),
            listed,
            stats.bundled,
            stats.fetched,
            stats.excluded
        );

        if documents.is_empty() {
            warn!("No project content has a usable embedding, using theme only");
            return Ok(RetrievalOutcome::ThemeOnly);
        }

        Ok(select(query, query_embedding, documents, config)?)
    }
}

/// Score, fuse and diversify documents that already carry embeddings
///
/// BM25 scores, semantic scores and documents stay index-aligned until fusion;
/// only then are candidates sorted by hybrid score (stable, so fused ties keep
/// store order) and cut to the candidate pool.
///
/// When one signal is all zeros it carries no ranking, and fusing it would
/// rank by store order. The informative list is then fused with itself, so
/// `hybrid_score` is `2 / (rrf_k + rank)` of that signal alone and the pool
/// cut and MMR follow it. The outcome is labelled with that signal.
pub fn select(
    query: &str,
    query_embedding: &[f32],
    documents: Vec<Document>,
    config: &RetrievalConfig,
) -> Result<RetrievalOutcome, FusionError> {
    if documents.is_empty() {
        return Ok(RetrievalOutcome::ThemeOnly);
    }

    let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
    let bm25 = compute_bm25_scores(query, &texts, config.bm25);
    let semantic = semantic_scores(
        query_embedding,
        documents.iter().map(|d| d.embedding.as_slice()),
    );

    let lexical_signal = bm25.iter().any(|&s| s != 0.0);
    let semantic_signal = semantic.iter().any(|&s| s != 0.0);

    let hybrid = match (lexical_signal, semantic_signal) {
        (false, true) => reciprocal_rank_fusion(&semantic, &semantic, config.rrf_k)?,
        (true, false) => reciprocal_rank_fusion(&bm25, &bm25, config.rrf_k)?,
        _ => reciprocal_rank_fusion(&bm25, &semantic, config.rrf_k)?,
    };

    let mut scored: Vec<ScoredDocument> = documents
        .into_iter()
        .zip(bm25)
        .zip(semantic)
        .zip(hybrid)
        .map(|(((document, bm25), semantic), hybrid)| {
            ScoredDocument::new(document, bm25, semantic, hybrid)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.hybrid_score
            .partial_cmp(&a.hybrid_score)
            .unwrap_or(Ordering::Equal)
    });

    let pool = config.candidate_pool_size.min(scored.len());
    let selected = apply_mmr(
        &scored[..pool],
        query_embedding,
        config.top_k,
        config.mmr_lambda,
    );
    debug!(
        "Selected {} of {} pooled candidates ({} scored)",
        selected.len(),
        pool,
        scored.len()
    );

    let selection = Selection {
        metrics: RetrievalMetrics::compute(&scored, &selected),
        documents: selected,
    };

    Ok(match (lexical_signal, semantic_signal) {
        (false, true) => RetrievalOutcome::SemanticOnly(selection),
        (true, false) => RetrievalOutcome::Bm25Only(selection),
        _ => RetrievalOutcome::Hybrid(selection),
    })
}
