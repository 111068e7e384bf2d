//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "brandrag",
    version,
    author = "neur0map",
    about = "Hybrid retrieval of brand-consistent grounding for content generation",
    long_about = "Brandrag ranks a project's prior content against a generation prompt with BM25 \
                  and embedding similarity, fuses both rankings, and selects a diverse set of \
                  documents to ground the prompt in the brand's existing voice."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/brandrag/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retrieve grounding context for a prompt
    Retrieve {
        /// Prompt text to ground
        query: String,

        /// Project whose content is searched
        #[arg(short, long)]
        project: String,

        /// Brand theme file (TOML)
        #[arg(short, long, value_name = "FILE", conflicts_with = "theme_name")]
        theme: Option<PathBuf>,

        /// Brand name, when no theme file is given
        #[arg(long)]
        theme_name: Option<String>,

        /// Number of documents to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Candidates considered before diversity selection
        #[arg(long)]
        pool: Option<usize>,

        /// Relevance/diversity trade-off in [0, 1]
        #[arg(short, long)]
        lambda: Option<f32>,

        /// Profile to use (e.g., "precise", "diverse")
        #[arg(long)]
        profile: Option<String>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Embed a piece of content and add it to a project
    Ingest {
        /// Content text (caption or prompt for image content)
        text: String,

        /// Project the content belongs to
        #[arg(short, long)]
        project: String,

        /// Content ID (defaults to a new UUID)
        #[arg(long)]
        id: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Profile to apply before showing
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_retrieve() {
        let cli = Cli::try_parse_from([
            "brandrag",
            "retrieve",
            "autumn coffee launch",
            "--project",
            "p1",
            "--theme-name",
            "Acme",
            "-k",
            "3",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Retrieve {
                query,
                project,
                theme_name,
                top_k,
                json,
                ..
            } => {
                assert_eq!(query, "autumn coffee launch");
                assert_eq!(project, "p1");
                assert_eq!(theme_name.as_deref(), Some("Acme"));
                assert_eq!(top_k, Some(3));
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_theme_file_and_name_conflict() {
        let result = Cli::try_parse_from([
            "brandrag",
            "retrieve",
            "q",
            "--project",
            "p1",
            "--theme",
            "theme.toml",
            "--theme-name",
            "Acme",
        ]);
        assert!(result.is_err());
    }
}
