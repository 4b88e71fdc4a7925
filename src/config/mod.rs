//! Configuration management for suitetrim
//!
//! Loads the analysis settings from TOML, applies `SUITETRIM_SECTION__KEY`
//! environment overrides and validates the result before a run starts.

use crate::error::{Result, SuiteTrimError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    #[serde(default)]
    pub vectorizer: VectorizerConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub redundancy: RedundancyConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            schema_version: "1.0.0".to_string(),
            created_at: current_timestamp(),
        }
    }
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Feature vectorization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Scale applied to the categorical subspace (priority, core flag, level)
    pub categorical_weight: f32,
    /// Terms appearing in fewer documents are dropped from the vocabulary
    pub min_document_frequency: usize,
    /// Keep only the most frequent terms; 0 = unbounded
    pub max_features: usize,
    /// Regex selecting tokens from the normalized text
    pub token_pattern: String,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            categorical_weight: 0.2,
            min_document_frequency: 1,
            max_features: 0,
            token_pattern: r"\b\w\w+\b".to_string(),
        }
    }
}

/// K-means settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Fixed cluster count; when absent K is derived from corpus size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_count: Option<usize>,
    pub min_clusters: usize,
    pub max_clusters: usize,
    pub max_iterations: usize,
    /// Seed for centroid initialization; identical input + seed = identical clusters
    pub seed: u64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            cluster_count: None,
            min_clusters: 1,
            max_clusters: 50,
            max_iterations: 100,
            seed: 42,
        }
    }
}

/// Redundancy decision settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedundancyConfig {
    /// Pairs strictly above this cosine similarity count as redundant
    pub similarity_threshold: f32,
}

impl Default for RedundancyConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.75,
        }
    }
}

/// Report rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// "json" or "table"
    pub format: String,
    /// Include the redundant pair listing in the report
    pub include_pairs: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            include_pairs: true,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SuiteTrimError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SuiteTrimError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| SuiteTrimError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: SUITETRIM_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        let overrides: Vec<(String, String)> = std::env::vars()
            .filter_map(|(key, value)| {
                key.strip_prefix("SUITETRIM_")
                    .map(|config_key| (config_key.to_string(), value))
            })
            .collect();

        for (key, value) in overrides {
            if let Err(e) = self.set_value_from_env(&key, &value) {
                tracing::warn!("Failed to apply env override SUITETRIM_{}: {}", key, e);
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "CLUSTERING__CLUSTER_COUNT" => {
                self.clustering.cluster_count = Some(parse_env(path, value)?);
            }
            "CLUSTERING__SEED" => {
                self.clustering.seed = parse_env(path, value)?;
            }
            "CLUSTERING__MAX_ITERATIONS" => {
                self.clustering.max_iterations = parse_env(path, value)?;
            }
            "REDUNDANCY__SIMILARITY_THRESHOLD" => {
                self.redundancy.similarity_threshold = parse_env(path, value)?;
            }
            "VECTORIZER__CATEGORICAL_WEIGHT" => {
                self.vectorizer.categorical_weight = parse_env(path, value)?;
            }
            "OUTPUT__FORMAT" => {
                self.output.format = value.to_string();
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
            SuiteTrimError::Config("Cannot determine config directory".to_string())
        })?;

        Ok(config_dir.join("suitetrim").join("config.toml"))
    }
}

fn parse_env<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SuiteTrimError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Cannot parse '{}'", value),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.meta.schema_version, "1.0.0");
        assert_eq!(config.redundancy.similarity_threshold, 0.75);
        assert_eq!(config.clustering.seed, 42);
        assert!(config.clustering.cluster_count.is_none());
        assert_eq!(config.output.format, "json");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_str = r#"
[_meta]
schema_version = "1.0.0"

[clustering]
cluster_count = 7
"#;
        let config: Config = toml::from_str(toml_str).unwrap();

        assert_eq!(config.clustering.cluster_count, Some(7));
        assert_eq!(config.clustering.max_iterations, 100);
        assert_eq!(config.vectorizer.categorical_weight, 0.2);
    }

    #[test]
    fn test_set_value_from_env() {
        let mut config = Config::default();

        config
            .set_value_from_env("CLUSTERING__CLUSTER_COUNT", "4")
            .unwrap();
        config
            .set_value_from_env("REDUNDANCY__SIMILARITY_THRESHOLD", "0.9")
            .unwrap();

        assert_eq!(config.clustering.cluster_count, Some(4));
        assert_eq!(config.redundancy.similarity_threshold, 0.9);
        assert!(config.set_value_from_env("CLUSTERING__SEED", "abc").is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.clustering.cluster_count = Some(3);
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.clustering.cluster_count, Some(3));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/suitetrim.toml"));
        assert!(matches!(result, Err(SuiteTrimError::ConfigNotFound { .. })));
    }
}
