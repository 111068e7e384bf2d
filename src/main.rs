use anyhow::Context;
use brandrag::cli::{Cli, Commands, ConfigAction};
use brandrag::config::{Config, ConfigValidator, RetrievalConfig};
use brandrag::embedding::{EmbeddingProvider, FastEmbedProvider};
use brandrag::error::{BrandragError, Result};
use brandrag::retrieval::{HybridRetriever, RetrievalContext};
use brandrag::store::{ContentRow, SqliteContentStore};
use brandrag::theme::Theme;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Retrieve {
            query,
            project,
            theme,
            theme_name,
            top_k,
            pool,
            lambda,
            profile,
            json,
        } => {
            let overrides = RetrievalOverrides { top_k, pool, lambda };
            let theme = resolve_theme(theme, theme_name, &project)?;
            cmd_retrieve(cli.config, profile, &project, &query, &theme, overrides, json)?;
        }
        Commands::Ingest { text, project, id } => {
            cmd_ingest(cli.config, &project, id, &text)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "brandrag=debug" } else { "brandrag=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Per-invocation overrides of the retrieval config
struct RetrievalOverrides {
    top_k: Option<usize>,
    pool: Option<usize>,
    lambda: Option<f32>,
}

impl RetrievalOverrides {
    fn apply(&self, config: &mut RetrievalConfig) {
        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
        if let Some(pool) = self.pool {
            config.candidate_pool_size = pool;
        }
        if let Some(lambda) = self.lambda {
            config.mmr_lambda = lambda;
        }
    }
}

fn cmd_retrieve(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    project: &str,
    query: &str,
    theme: &Theme,
    overrides: RetrievalOverrides,
    json: bool,
) -> Result<()> {
    let mut config = load_config(config_path, profile)?;
    overrides.apply(&mut config.retrieval);
    ConfigValidator::validate_retrieval(&config.retrieval)?;

    let store = open_store(&config)?;
    let embedder = FastEmbedProvider::new(&config.embedding.model)?;
    let retriever = HybridRetriever::from_config(Arc::new(store), Arc::new(embedder), &config);

    let rt = runtime()?;
    let context = rt.block_on(retriever.retrieve(project, query, theme, None));

    if json {
        let output = serde_json::to_string_pretty(&context).map_err(|e| BrandragError::Json {
            source: e,
            context: "Failed to serialize retrieval context".to_string(),
        })?;
        println!("{}", output);
    } else {
        print_context(&context);
    }

    Ok(())
}

fn print_context(context: &RetrievalContext) {
    println!(
        "Method: {} ({} documents, average similarity {:.3})",
        context.method,
        context.relevant_documents.len(),
        context.average_similarity
    );

    for (i, doc) in context.relevant_documents.iter().enumerate() {
        println!(
            "{:>2}. [{}] {}",
            i + 1,
            doc.id(),
            doc.document.preview(80)
        );
        println!(
            "    bm25 {:.3}  semantic {:.3}  hybrid {:.4}",
            doc.bm25_score, doc.semantic_score, doc.hybrid_score
        );
    }

    if let Some(metrics) = &context.metrics {
        println!("Diversity: {:.3}", metrics.diversity_score);
    }

    if !context.theme_description.is_empty() {
        println!("Theme: {}", context.theme_description);
    }
}

fn cmd_ingest(
    config_path: Option<PathBuf>,
    project: &str,
    id: Option<String>,
    text: &str,
) -> Result<()> {
    if text.trim().is_empty() {
        return Err(BrandragError::Config("Content text cannot be empty".to_string()));
    }

    let config = load_config(config_path, None)?;
    let store = open_store(&config)?;
    let embedder = FastEmbedProvider::new(&config.embedding.model)?;

    let rt = runtime()?;
    let embedding = rt
        .block_on(embedder.embed_document(text))
        .with_context(|| format!("Failed to embed content for project {}", project))?;

    let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let row = ContentRow::new(id.clone(), text).with_embedding(embedding);
    store
        .insert(project, &row, embedder.model_name())
        .with_context(|| format!("Failed to store content {}", id))?;

    println!("✓ Stored content {} in project {}", id, project);
    println!("  Project now holds {} items", store.count(project)?);

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show { profile } => {
            let config = load_config(config_path, profile)?;
            let json = serde_json::to_string_pretty(&config).map_err(|e| BrandragError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;
            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            for name in config.profiles.keys() {
                let mut profiled = config.clone();
                profiled.apply_profile(name)?;
                ConfigValidator::validate(&profiled)?;
            }
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!("  Profiles: {}", config.profiles.len());
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            // Create parent directory
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| BrandragError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'brandrag config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        if let Some(profile) = profile {
            config.apply_profile(&profile)?;
        }
        ConfigValidator::validate(&config)?;
        return Ok(config);
    }

    if let Some(profile) = profile {
        Config::load_with_profile(&path, &profile)
    } else {
        Config::load(&path)
    }
}

fn resolve_theme(file: Option<PathBuf>, name: Option<String>, project: &str) -> Result<Theme> {
    match (file, name) {
        (Some(path), _) => Theme::load(&expand_path(&path)?),
        (None, Some(name)) => Ok(Theme::new(name)),
        (None, None) => Ok(Theme::new(project)),
    }
}

fn open_store(config: &Config) -> Result<SqliteContentStore> {
    let db_path = expand_path(&config.storage.database_path)?;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| BrandragError::Io {
            source: e,
            context: format!("Failed to create data directory: {:?}", parent),
        })?;
    }

    Ok(SqliteContentStore::open(&db_path)?)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| BrandragError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| BrandragError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| BrandragError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
