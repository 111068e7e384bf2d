use crate::config::{Config, RetrievalConfig};
use crate::error::{BrandragError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_retrieval_into(&config.retrieval, "retrieval", &mut errors);
        Self::validate_providers(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_storage(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(BrandragError::ConfigValidation { errors })
        }
    }

    /// Validate a standalone per-call retrieval configuration
    pub fn validate_retrieval(retrieval: &RetrievalConfig) -> Result<()> {
        let mut errors = Vec::new();
        Self::validate_retrieval_into(retrieval, "retrieval", &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(BrandragError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_retrieval_into(
        retrieval: &RetrievalConfig,
        prefix: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let lambda = retrieval.mmr_lambda;
        if !(0.0..=1.0).contains(&lambda) {
            errors.push(ValidationError::new(
                format!("{}.mmr_lambda", prefix),
                format!("MMR lambda must be between 0.0 and 1.0, got {}", lambda),
            ));
        }

        if !(retrieval.rrf_k.is_finite() && retrieval.rrf_k > 0.0) {
            errors.push(ValidationError::new(
                format!("{}.rrf_k", prefix),
                format!("RRF k must be a positive number, got {}", retrieval.rrf_k),
            ));
        }

        let k1 = retrieval.bm25.k1;
        if !(k1.is_finite() && k1 >= 0.0) {
            errors.push(ValidationError::new(
                format!("{}.bm25.k1", prefix),
                format!("BM25 k1 must be non-negative, got {}", k1),
            ));
        }

        let b = retrieval.bm25.b;
        if !(0.0..=1.0).contains(&b) {
            errors.push(ValidationError::new(
                format!("{}.bm25.b", prefix),
                format!("BM25 b must be between 0.0 and 1.0, got {}", b),
            ));
        }

        if retrieval.candidate_pool_size < retrieval.top_k {
            tracing::debug!(
                "candidate_pool_size ({}) is smaller than top_k ({}); results are capped by the pool",
                retrieval.candidate_pool_size,
                retrieval.top_k
            );
        }
    }

    fn validate_providers(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.providers.timeout_ms == 0 {
            errors.push(ValidationError::new(
                "providers.timeout_ms",
                "Provider timeout must be greater than 0",
            ));
        }

        if config.providers.max_concurrent_lookups == 0 {
            errors.push(ValidationError::new(
                "providers.max_concurrent_lookups",
                "Concurrent lookup limit must be greater than 0",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }
    }

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.storage.database_path.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.database_path",
                "Database path cannot be empty",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_lambda_out_of_range() {
        let mut config = Config::default();
        config.retrieval.mmr_lambda = 1.5;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = Config::default();
        config.retrieval.rrf_k = 0.0;
        config.retrieval.bm25.b = -0.1;
        config.providers.timeout_ms = 0;
        config.storage.database_path = PathBuf::new();

        match ConfigValidator::validate(&config) {
            Err(BrandragError::ConfigValidation { errors }) => {
                let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
                assert_eq!(
                    paths,
                    vec![
                        "retrieval.rrf_k",
                        "retrieval.bm25.b",
                        "providers.timeout_ms",
                        "storage.database_path"
                    ]
                );
            }
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_sizes_are_valid() {
        let retrieval = RetrievalConfig {
            top_k: 0,
            candidate_pool_size: 0,
            ..Default::default()
        };
        assert!(ConfigValidator::validate_retrieval(&retrieval).is_ok());
    }
}
