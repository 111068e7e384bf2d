//! Brandrag - hybrid retrieval for brand-consistent content generation
//!
//! Given a project's prior content and a brand theme, brandrag selects the
//! documents that best ground a new generation prompt. Lexical (BM25) and
//! semantic (embedding) rankings are fused and diversified, and every call
//! degrades to theme-only grounding instead of failing.

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod retrieval;
pub mod store;
pub mod theme;

pub use error::{BrandragError, Result};
pub use retrieval::{HybridRetriever, RetrievalContext, RetrievalMethod};
pub use theme::Theme;
