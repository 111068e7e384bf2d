//! Embedding collaborators
//!
//! - EmbeddingProvider trait for abstraction over embedding backends
//! - FastEmbedProvider for local embedding (all-MiniLM-L6-v2, 384-dim)
//! - EmbeddingResolver for concurrent lookup of embeddings missing from
//!   content listings

mod batch;
mod provider;

pub use batch::{EmbeddingResolver, ResolveStats};
pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
