use super::{ContentRow, ContentStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-process content store
///
/// Rows are kept per project in insertion order. Embeddings can be attached
/// to the row itself or registered separately, in which case they are only
/// reachable through `fetch_embedding`.
#[derive(Default)]
pub struct InMemoryContentStore {
    rows: RwLock<HashMap<String, Vec<ContentRow>>>,
    embeddings: RwLock<HashMap<String, Vec<f32>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row to a project
    pub fn insert(&self, project_id: &str, row: ContentRow) {
        let mut rows = self.rows.write().unwrap_or_else(|e| e.into_inner());
        rows.entry(project_id.to_string()).or_default().push(row);
    }

    /// Register an embedding served by `fetch_embedding` only
    pub fn insert_embedding(&self, content_id: &str, embedding: Vec<f32>) {
        let mut embeddings = self.embeddings.write().unwrap_or_else(|e| e.into_inner());
        embeddings.insert(content_id.to_string(), embedding);
    }

    /// Number of rows stored for a project
    pub fn len(&self, project_id: &str) -> usize {
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        rows.get(project_id).map_or(0, Vec::len)
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn list_by_project(&self, project_id: &str) -> Result<Vec<ContentRow>, StoreError> {
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        Ok(rows.get(project_id).cloned().unwrap_or_default())
    }

    async fn fetch_embedding(&self, content_id: &str) -> Result<Option<Vec<f32>>, StoreError> {
        let embeddings = self.embeddings.read().unwrap_or_else(|e| e.into_inner());
        Ok(embeddings.get(content_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rows_are_scoped_by_project() {
        let store = InMemoryContentStore::new();
        store.insert("acme", ContentRow::new("1", "Launch post"));
        store.insert("acme", ContentRow::new("2", "Follow-up post"));
        store.insert("globex", ContentRow::new("3", "Other brand"));

        let rows = store.list_by_project("acme").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "1");
        assert_eq!(rows[1].id, "2");

        assert!(store.list_by_project("initech").await.unwrap().is_empty());
        assert_eq!(store.len("globex"), 1);
    }

    #[tokio::test]
    async fn test_side_table_embeddings() {
        let store = InMemoryContentStore::new();
        store.insert_embedding("1", vec![0.5, 0.5]);

        assert_eq!(
            store.fetch_embedding("1").await.unwrap(),
            Some(vec![0.5, 0.5])
        );
        assert_eq!(store.fetch_embedding("2").await.unwrap(), None);
    }
}
