//! Content store read contract
//!
//! The retriever only ever reads a snapshot of a project's content rows.
//! Writing is left to upstream authoring flows; the `insert` helpers on the
//! bundled stores exist for seeding and tests.

mod memory;
mod sqlite;

pub use memory::InMemoryContentStore;
pub use sqlite::{DbPool, SqliteContentStore};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed embedding for content {id}: {reason}")]
    MalformedEmbedding { id: String, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A content row as returned by the store
///
/// `embedding` is `None` when the store does not bundle vectors with the row;
/// the retriever then asks [`ContentStore::fetch_embedding`] for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRow {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl ContentRow {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// Read access to a project's prior content
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// List every content row belonging to a project
    async fn list_by_project(&self, project_id: &str) -> Result<Vec<ContentRow>, StoreError>;

    /// Look up the stored embedding for a single content row
    async fn fetch_embedding(&self, _content_id: &str) -> Result<Option<Vec<f32>>, StoreError> {
        Ok(None)
    }
}
