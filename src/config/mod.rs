//! Configuration management for brandrag
//!
//! Loads the TOML configuration file, applies profile and environment
//! overrides, and validates the result before it reaches the retriever.

use crate::error::{BrandragError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub providers: ProviderConfig,
    pub embedding: EmbeddingConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Per-call retrieval configuration
///
/// Every field has a default so partial TOML/JSON documents deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Documents considered before diversity selection
    pub candidate_pool_size: usize,

    /// Final number of documents returned
    pub top_k: usize,

    /// Relevance/diversity trade-off for MMR (1.0 = pure relevance)
    pub mmr_lambda: f32,

    /// Reciprocal Rank Fusion damping constant
    pub rrf_k: f32,

    /// BM25 parameters
    pub bm25: Bm25Params,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            candidate_pool_size: 20,
            top_k: 5,
            mmr_lambda: 0.7,
            rrf_k: 60.0,
            bm25: Bm25Params::default(),
        }
    }
}

/// BM25 term-frequency saturation and length normalization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// Limits applied to collaborator calls (embedding provider, content store)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Timeout for a single provider call, in milliseconds
    pub timeout_ms: u64,

    /// Maximum concurrent per-document embedding lookups
    pub max_concurrent_lookups: usize,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_concurrent_lookups: 8,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
}

/// Content store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_pool_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mmr_lambda: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BrandragError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| BrandragError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| BrandragError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_profile(profile)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| BrandragError::Config(format!("Unknown profile: {}", profile)))?;

        if let Some(top_k) = overrides.top_k {
            self.retrieval.top_k = top_k;
        }
        if let Some(pool) = overrides.candidate_pool_size {
            self.retrieval.candidate_pool_size = pool;
        }
        if let Some(lambda) = overrides.mmr_lambda {
            self.retrieval.mmr_lambda = lambda;
        }
        if let Some(model) = overrides.embedding_model {
            self.embedding.model = model;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: BRANDRAG_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("BRANDRAG_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "RETRIEVAL__TOP_K" => self.retrieval.top_k = parse_value(path, value)?,
            "RETRIEVAL__CANDIDATE_POOL_SIZE" => {
                self.retrieval.candidate_pool_size = parse_value(path, value)?
            }
            "RETRIEVAL__MMR_LAMBDA" => self.retrieval.mmr_lambda = parse_value(path, value)?,
            "RETRIEVAL__RRF_K" => self.retrieval.rrf_k = parse_value(path, value)?,
            "RETRIEVAL__BM25__K1" => self.retrieval.bm25.k1 = parse_value(path, value)?,
            "RETRIEVAL__BM25__B" => self.retrieval.bm25.b = parse_value(path, value)?,
            "PROVIDERS__TIMEOUT_MS" => self.providers.timeout_ms = parse_value(path, value)?,
            "PROVIDERS__MAX_CONCURRENT_LOOKUPS" => {
                self.providers.max_concurrent_lookups = parse_value(path, value)?
            }
            "EMBEDDING__MODEL" => {
                self.embedding.model = value.to_string();
            }
            "STORAGE__DATABASE_PATH" => {
                self.storage.database_path = PathBuf::from(value);
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            BrandragError::Config("Cannot determine config directory".to_string())
        })?;

        Ok(config_dir.join("brandrag").join("config.toml"))
    }
}

fn parse_value<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| BrandragError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Cannot parse '{}'", value),
        })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            retrieval: RetrievalConfig::default(),
            providers: ProviderConfig::default(),
            embedding: EmbeddingConfig {
                model: "all-MiniLM-L6-v2".to_string(),
            },
            storage: StorageConfig {
                database_path: PathBuf::from("~/.brandrag/content.sqlite"),
            },
            profiles: HashMap::new(),
        }
    }
}
