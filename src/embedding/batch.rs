//! Concurrent resolution of embeddings the content store did not bundle
use crate::retrieval::Document;
use crate::store::{ContentRow, ContentStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Counts describing how a batch of rows was resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Rows whose embedding came with the listing
    pub bundled: usize,
    /// Rows whose embedding was looked up separately
    pub fetched: usize,
    /// Rows dropped for lacking a usable embedding
    pub excluded: usize,
}

/// Turns content rows into documents with embeddings attached
///
/// Missing embeddings are looked up through the store concurrently, at most
/// `max_concurrent` at a time, each lookup bounded by `timeout`. Output order
/// follows input order.
pub struct EmbeddingResolver {
    store: Arc<dyn ContentStore>,
    max_concurrent: usize,
    timeout: Duration,
}

impl EmbeddingResolver {
    pub fn new(store: Arc<dyn ContentStore>, max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            store,
            max_concurrent: max_concurrent.max(1),
            timeout,
        }
    }

    pub async fn resolve(&self, rows: Vec<ContentRow>) -> (Vec<Document>, ResolveStats) {
        let mut stats = ResolveStats::default();
        let mut slots: Vec<Option<Document>> = Vec::with_capacity(rows.len());
        let mut pending: Vec<(usize, String, String)> = Vec::new();

        for (idx, row) in rows.into_iter().enumerate() {
            match row.embedding {
                Some(embedding) => {
                    stats.bundled += 1;
                    slots.push(Document::new(row.id, row.text, embedding));
                }
                None => {
                    slots.push(None);
                    pending.push((idx, row.id, row.text));
                }
            }
        }

        if !pending.is_empty() {
            debug!("Looking up {} missing embeddings", pending.len());

            let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
            let mut lookups = JoinSet::new();

            for (idx, id, text) in pending {
                let store = Arc::clone(&self.store);
                let semaphore = Arc::clone(&semaphore);
                let timeout = self.timeout;

                lookups.spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok()?;
                    let embedding =
                        match tokio::time::timeout(timeout, store.fetch_embedding(&id)).await {
                            Ok(Ok(Some(embedding))) => embedding,
                            Ok(Ok(None)) => {
                                debug!("No embedding stored for content {}", id);
                                return None;
                            }
                            Ok(Err(e)) => {
                                warn!("Embedding lookup failed for content {}: {}", id, e);
                                return None;
                            }
                            Err(_) => {
                                warn!("Embedding lookup timed out for content {}", id);
                                return None;
                            }
                        };
                    Some((idx, Document::new(id, text, embedding)?))
                });
            }

            while let Some(joined) = lookups.join_next().await {
                match joined {
                    Ok(Some((idx, document))) => {
                        stats.fetched += 1;
                        slots[idx] = Some(document);
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Embedding lookup task failed: {}", e),
                }
            }
        }

        let total = slots.len();
        let documents: Vec<Document> = slots.into_iter().flatten().collect();
        stats.excluded = total - documents.len();

        (documents, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryContentStore, StoreError};
    use async_trait::async_trait;

    struct SlowStore;

    #[async_trait]
    impl ContentStore for SlowStore {
        async fn list_by_project(&self, _project_id: &str) -> Result<Vec<ContentRow>, StoreError> {
            Ok(Vec::new())
        }

        async fn fetch_embedding(&self, _content_id: &str) -> Result<Option<Vec<f32>>, StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Some(vec![1.0]))
        }
    }

    #[tokio::test]
    async fn test_resolves_in_input_order() {
        let store = Arc::new(InMemoryContentStore::new());
        store.insert_embedding("b", vec![0.0, 1.0]);
        store.insert_embedding("d", vec![1.0, 1.0]);

        let rows = vec![
            ContentRow::new("a", "first").with_embedding(vec![1.0, 0.0]),
            ContentRow::new("b", "second"),
            ContentRow::new("c", "third"),
            ContentRow::new("d", "fourth"),
            ContentRow::new("e", "fifth").with_embedding(vec![]),
        ];

        let resolver = EmbeddingResolver::new(store, 2, Duration::from_secs(1));
        let (documents, stats) = resolver.resolve(rows).await;

        let ids: Vec<&str> = documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "d"]);
        assert_eq!(documents[1].embedding, vec![0.0, 1.0]);
        assert_eq!(
            stats,
            ResolveStats {
                bundled: 2,
                fetched: 2,
                excluded: 2,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_timeout_excludes_row() {
        let resolver = EmbeddingResolver::new(Arc::new(SlowStore), 4, Duration::from_millis(50));
        let (documents, stats) = resolver
            .resolve(vec![ContentRow::new("slow", "never arrives")])
            .await;

        assert!(documents.is_empty());
        assert_eq!(stats.excluded, 1);
    }
}
