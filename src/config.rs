//! Configuration module for the similarity search service.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `LOOKALIKE_` and use double
//! underscores to separate nested levels:
//! - `LOOKALIKE_MODEL__EMBEDDING_DIMENSION=768` sets `model.embedding_dimension`
//! - `LOOKALIKE_SEARCH__DEFAULT_K=20` sets `search.default_k`
//! - `LOOKALIKE_INDEX__INDEX_PATH=/data/products.index` sets `index.index_path`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{IndexError, IndexResult};
use crate::vector::VectorDimension;

/// Directory holding the settings file, searched upward from the current directory.
pub const CONFIG_DIR: &str = ".lookalike";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "LOOKALIKE_";

/// Commented settings file written by `init`.
const SETTINGS_TEMPLATE: &str = r#"# Lookalike Configuration File

# Version of the configuration schema
version = 1

[index]
# Index structure file
index_path = ".lookalike/index/products.index"

# Raw normalized embeddings, row i belongs to product_ids[i]
embeddings_path = ".lookalike/index/embeddings.bin"

# Product id mapping, dimension and count
metadata_path = ".lookalike/index/metadata.json"

[model]
# Length of every embedding vector (512 for CLIP ViT-B/32)
embedding_dimension = 512

# Images embedded per batch when indexing the catalog
batch_size = 32

[search]
# Results returned when a request does not specify k
default_k = 10

# Largest k a request may ask for
max_k = 100

# Minimum similarity (0.0 to 1.0) when a request does not specify one
default_threshold = 0.3

[logging]
# error, warn, info, debug or trace
level = "info"
"#;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Locations of the persisted index artifacts
    #[serde(default)]
    pub index: IndexConfig,

    /// Embedding model settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Search defaults and bounds
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Index structure file
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Raw normalized embeddings file
    #[serde(default = "default_embeddings_path")]
    pub embeddings_path: PathBuf,

    /// Metadata JSON (product ids, dimension, count)
    #[serde(default = "default_metadata_path")]
    pub metadata_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Length of every embedding vector
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Images embedded per batch when indexing the catalog
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Results returned when the caller does not ask for a count
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Largest result count a caller may request
    #[serde(default = "default_max_k")]
    pub max_k: usize,

    /// Minimum similarity when the caller does not supply one
    #[serde(default = "default_similarity_threshold")]
    pub default_threshold: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    PathBuf::from(".lookalike/index/products.index")
}
fn default_embeddings_path() -> PathBuf {
    PathBuf::from(".lookalike/index/embeddings.bin")
}
fn default_metadata_path() -> PathBuf {
    PathBuf::from(".lookalike/index/metadata.json")
}
fn default_embedding_dimension() -> usize {
    crate::vector::VECTOR_DIMENSION_512
}
fn default_batch_size() -> usize {
    32
}
fn default_k() -> usize {
    10
}
fn default_max_k() -> usize {
    100
}
fn default_similarity_threshold() -> f32 {
    0.3
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index: IndexConfig::default(),
            model: ModelConfig::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            embeddings_path: default_embeddings_path(),
            metadata_path: default_metadata_path(),
        }
    }
}

impl IndexConfig {
    /// Places all three artifacts in `dir` under their default file names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            index_path: dir.join("products.index"),
            embeddings_path: dir.join("embeddings.bin"),
            metadata_path: dir.join("metadata.json"),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embedding_dimension: default_embedding_dimension(),
            batch_size: default_batch_size(),
        }
    }
}

impl ModelConfig {
    /// The configured dimension as a validated newtype.
    pub fn dimension(&self) -> IndexResult<VectorDimension> {
        VectorDimension::new(self.embedding_dimension).map_err(|e| IndexError::ConfigError {
            reason: format!("model.embedding_dimension: {e}"),
        })
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            max_k: default_max_k(),
            default_threshold: default_similarity_threshold(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Parses the configured level.
    pub fn level_filter(&self) -> IndexResult<tracing::Level> {
        self.level
            .parse::<tracing::Level>()
            .map_err(|_| IndexError::ConfigError {
                reason: format!(
                    "logging.level must be one of error, warn, info, debug, trace (got '{}')",
                    self.level
                ),
            })
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore (__) separates nested levels
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by looking for the config directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Reject values that would silently misbehave at runtime.
    pub fn validate(&self) -> IndexResult<()> {
        let fail = |reason: String| Err(IndexError::ConfigError { reason });

        self.model.dimension()?;

        if self.model.batch_size == 0 {
            return fail("model.batch_size must be at least 1".to_string());
        }
        if self.search.max_k == 0 {
            return fail("search.max_k must be at least 1".to_string());
        }
        if !(1..=self.search.max_k).contains(&self.search.default_k) {
            return fail(format!(
                "search.default_k must be between 1 and search.max_k ({}), got {}",
                self.search.max_k, self.search.default_k
            ));
        }
        let threshold = self.search.default_threshold;
        if threshold.is_nan() || !(0.0..=1.0).contains(&threshold) {
            return fail(format!(
                "search.default_threshold must be between 0 and 1, got {threshold}"
            ));
        }

        self.logging.level_filter()?;

        let paths = [
            &self.index.index_path,
            &self.index.embeddings_path,
            &self.index.metadata_path,
        ];
        for (i, a) in paths.iter().enumerate() {
            if paths[i + 1..].contains(a) {
                return fail(format!(
                    "index artifact paths must be distinct ('{}' is used twice)",
                    a.display()
                ));
            }
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }


        std::fs::write(&config_path, SETTINGS_TEMPLATE)?;

        Ok(config_path)
    }
}
