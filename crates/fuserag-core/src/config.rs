use crate::error::{FuseragError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided by the caller
    Caller,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Caller => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Parent/child chunking parameters, in characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target parent unit size
    pub parent_size: usize,

    /// Overlap carried from the previous parent's tail
    pub parent_overlap: usize,

    /// Target child unit size
    pub child_size: usize,

    /// Overlap carried from the previous child's tail
    pub child_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            parent_size: 2000,
            parent_overlap: 200,
            child_size: 400,
            child_overlap: 50,
        }
    }
}

/// Retrieval depths, fusion weights, and the candidate ceiling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Child hits requested from the dense index
    pub dense_k: usize,

    /// Parent hits requested from the sparse index; smaller than `dense_k`
    /// because sparse results already cover whole parents
    pub sparse_k: usize,

    /// Rank-score weight for dense hits
    pub dense_weight: f32,

    /// Rank-score weight for sparse hits
    pub sparse_weight: f32,

    /// Maximum candidates handed to the reranker
    pub ceiling: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            dense_k: 60,
            sparse_k: 30,
            dense_weight: 0.6,
            sparse_weight: 0.4,
            ceiling: 15,
        }
    }
}

/// Reranker settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    /// Whether the rerank pass runs at all; with this off (or no scorer
    /// configured) candidates pass through in fused order
    pub enabled: bool,

    /// Final evidence count
    pub top_k: usize,

    /// Cross-encoder model identifier
    pub model: Option<String>,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self { enabled: true, top_k: 5, model: None }
    }
}

/// Query router settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Bounded memo-cache capacity, keyed by the exact query string
    pub cache_capacity: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { cache_capacity: 100 }
    }
}

/// Layered configuration for the retrieval engine
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Embedding model identifier; required, no usable default
    pub embedder: ConfigValue<String>,

    /// Embedding dimension for the configured model
    pub embedder_dimensions: ConfigValue<usize>,

    /// Classification model identifier; when absent the router always
    /// falls back to the conservative intent
    pub classifier: ConfigValue<Option<String>>,

    pub chunking: ChunkingConfig,
    pub fusion: FusionConfig,
    pub rerank: RerankConfig,
    pub router: RouterConfig,
}

impl RetrievalConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            embedder: ConfigValue::new(String::new(), ConfigSource::Default),
            embedder_dimensions: ConfigValue::new(768, ConfigSource::Default),
            classifier: ConfigValue::new(None, ConfigSource::Default),
            chunking: ChunkingConfig::default(),
            fusion: FusionConfig::default(),
            rerank: RerankConfig::default(),
            router: RouterConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| FuseragError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| FuseragError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(embedder) = file_config.embedder {
            self.embedder.update(embedder, ConfigSource::File);
        }

        if let Some(dimensions) = file_config.embedder_dimensions {
            self.embedder_dimensions.update(dimensions, ConfigSource::File);
        }

        if let Some(classifier) = file_config.classifier {
            self.classifier.update(Some(classifier), ConfigSource::File);
        }

        if let Some(chunking) = file_config.chunking {
            self.chunking = chunking;
        }

        if let Some(fusion) = file_config.fusion {
            self.fusion = fusion;
        }

        if let Some(rerank) = file_config.rerank {
            self.rerank = rerank;
        }

        if let Some(router) = file_config.router {
            self.router = router;
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // FUSERAG_EMBEDDER
        if let Ok(embedder) = env::var("FUSERAG_EMBEDDER") {
            self.embedder.update(embedder, ConfigSource::Environment);
        }

        // FUSERAG_EMBEDDER_DIM
        if let Ok(dim_str) = env::var("FUSERAG_EMBEDDER_DIM") {
            match dim_str.parse::<usize>() {
                Ok(dim) => self.embedder_dimensions.update(dim, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FUSERAG_EMBEDDER_DIM value '{}': expected integer",
                    dim_str
                ),
            }
        }

        // FUSERAG_CLASSIFIER
        if let Ok(classifier) = env::var("FUSERAG_CLASSIFIER") {
            self.classifier.update(Some(classifier), ConfigSource::Environment);
        }

        // FUSERAG_RERANK
        if let Ok(flag_str) = env::var("FUSERAG_RERANK") {
            match flag_str.parse::<bool>() {
                Ok(flag) => self.rerank.enabled = flag,
                Err(_) => tracing::warn!(
                    "Invalid FUSERAG_RERANK value '{}': expected true or false",
                    flag_str
                ),
            }
        }

        self
    }

    /// Validate the configuration, rejecting values that would make the
    /// engine misbehave. Must be called before building an engine.
    pub fn validate(&self) -> Result<()> {
        if self.embedder.value.trim().is_empty() {
            return Err(FuseragError::ConfigMissing { key: "embedder".to_string() });
        }

        if self.embedder_dimensions.value == 0 {
            return Err(FuseragError::ConfigInvalid {
                key: "embedder_dimensions".to_string(),
                reason: "dimension must be non-zero".to_string(),
            });
        }

        validate_splitter("parent", self.chunking.parent_size, self.chunking.parent_overlap)?;
        validate_splitter("child", self.chunking.child_size, self.chunking.child_overlap)?;

        if self.chunking.child_size > self.chunking.parent_size {
            return Err(FuseragError::ConfigInvalid {
                key: "chunking.child_size".to_string(),
                reason: format!(
                    "child_size ({}) must not exceed parent_size ({})",
                    self.chunking.child_size, self.chunking.parent_size
                ),
            });
        }

        if self.fusion.dense_weight < 0.0 || self.fusion.sparse_weight < 0.0 {
            return Err(FuseragError::ConfigInvalid {
                key: "fusion.weights".to_string(),
                reason: "weights must be non-negative".to_string(),
            });
        }

        if self.fusion.ceiling == 0 || self.rerank.top_k == 0 {
            return Err(FuseragError::ConfigInvalid {
                key: "fusion.ceiling".to_string(),
                reason: "candidate ceiling and rerank top_k must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}

fn validate_splitter(kind: &str, size: usize, overlap: usize) -> Result<()> {
    if size == 0 {
        return Err(FuseragError::ConfigInvalid {
            key: format!("chunking.{}_size", kind),
            reason: "size must be non-zero".to_string(),
        });
    }

    // Overlap below half the size guarantees forward progress of the splitter.
    if overlap * 2 >= size {
        return Err(FuseragError::ConfigInvalid {
            key: format!("chunking.{}_overlap", kind),
            reason: format!("overlap ({}) must be less than half the unit size ({})", overlap, size),
        });
    }

    Ok(())
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    embedder: Option<String>,
    embedder_dimensions: Option<usize>,
    classifier: Option<String>,
    chunking: Option<ChunkingConfig>,
    fusion: Option<FusionConfig>,
    rerank: Option<RerankConfig>,
    router: Option<RouterConfig>,
}
