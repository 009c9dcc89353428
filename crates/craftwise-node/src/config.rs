//! Configuration for the Craftwise node.
//!
//! CLI arguments with environment variable fallbacks. A `.env` file is read
//! by `main` before parsing.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use craftwise_core::{Recipe, RecipeDraft};
use craftwise_resolver::ResolverConfig;
use thiserror::Error;

/// Craftwise node - recipe resolution and crafting progress service
#[derive(Parser, Debug, Clone)]
#[command(name = "craftwise-node")]
#[command(about = "Recipe dependency resolution and crafting progress service")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "CRAFTWISE_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Log level for craftwise crates (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Depth bound for previews that do not name one; 0 means unbounded
    #[arg(long, env = "DEFAULT_MAX_DEPTH", default_value = "10")]
    pub default_max_depth: u32,

    /// Maximum number of nodes in a single craft tree
    #[arg(long, env = "MAX_TREE_NODES", default_value = "100000")]
    pub max_tree_nodes: usize,

    /// Allow any origin, method and header (browser clients on other hosts)
    #[arg(long, env = "CORS_PERMISSIVE", default_value_t = true, action = clap::ArgAction::Set)]
    pub cors_permissive: bool,

    /// JSON file with an array of recipes to load at startup
    #[arg(long, env = "SEED_FILE")]
    pub seed_file: Option<PathBuf>,
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("MAX_TREE_NODES must be greater than zero")]
    ZeroNodeLimit,

    #[error("Unknown log level: {0}")]
    LogLevel(String),

    #[error("Failed to read seed file {path}: {source}")]
    SeedRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse seed file {path}: {source}")]
    SeedParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Args {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tree_nodes == 0 {
            return Err(ConfigError::ZeroNodeLimit);
        }

        match self.log_level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(ConfigError::LogLevel(other.to_string())),
        }

        Ok(())
    }

    /// Resolver settings derived from the arguments.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            default_max_depth: (self.default_max_depth > 0).then_some(self.default_max_depth),
            max_nodes: self.max_tree_nodes,
        }
    }

    /// Recipes from the seed file, if one is configured.
    pub fn seed_recipes(&self) -> Result<Vec<Recipe>, ConfigError> {
        match &self.seed_file {
            Some(path) => load_seed(path),
            None => Ok(Vec::new()),
        }
    }
}

/// Read a JSON array of recipe drafts.
pub fn load_seed(path: &Path) -> Result<Vec<Recipe>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::SeedRead {
        path: path.to_path_buf(),
        source,
    })?;
    let drafts: Vec<RecipeDraft> =
        serde_json::from_str(&raw).map_err(|source| ConfigError::SeedParse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(drafts.into_iter().map(RecipeDraft::into_recipe).collect())
}
