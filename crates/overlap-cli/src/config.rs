//! Configuration file handling.
//!
//! Settings come from an optional `overlap.toml`; every field has a default and
//! command-line flags override whatever the file says.

use anyhow::{Context, Result};
use overlap_engine::ingest::IngestPolicy;
use overlap_engine::names::{NameResolver, DEFAULT_PLACEHOLDER, MAX_LOOKUP_BATCH};
use overlap_engine::plan::DEFAULT_MIN_OVERLAP;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "overlap.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub names: NamesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Default minimum number of concurrently available participants.
    #[serde(default = "default_min_overlap")]
    pub min_overlap_count: usize,

    /// How malformed persisted slots are handled.
    #[serde(default)]
    pub validation: IngestPolicy,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            min_overlap_count: default_min_overlap(),
            validation: IngestPolicy::default(),
        }
    }
}

fn default_min_overlap() -> usize {
    DEFAULT_MIN_OVERLAP
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamesConfig {
    /// Shown for participants whose name cannot be resolved.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// Ids per directory request (clamped to the directory's hard limit).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
            batch_size: default_batch_size(),
        }
    }
}

impl NamesConfig {
    pub fn resolver(&self) -> NameResolver {
        NameResolver::new(self.placeholder.clone(), self.batch_size)
    }
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

fn default_batch_size() -> usize {
    MAX_LOOKUP_BATCH
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load `path` if given, else `overlap.toml` if present, else defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::load(default_path)
        } else {
            Ok(Self::default())
        }
    }
}
