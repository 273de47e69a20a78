//! Configuration management using the prefer crate for file discovery.
//!
//! Precedence, lowest first: defaults, config file, environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ner::{BackendKind, PatternConfig, TransformerConfig};

/// Name used for config file discovery (`scribo-ner.toml`, `.json`, ...).
pub const CONFIG_NAME: &str = "scribo-ner";

/// Environment variables read by [`NerConfig::with_env_overrides`].
pub const ENV_BACKEND: &str = "SCRIBO_NER_BACKEND";
pub const ENV_CNN_MODEL: &str = "SCRIBO_NER_CNN_MODEL";
pub const ENV_BERT_ENDPOINT: &str = "SCRIBO_NER_BERT_ENDPOINT";
pub const ENV_BERT_MODEL: &str = "SCRIBO_NER_BERT_MODEL";
pub const ENV_BERT_BATCH_SIZE: &str = "SCRIBO_NER_BERT_BATCH_SIZE";
pub const ENV_BERT_TOKEN: &str = "SCRIBO_NER_BERT_TOKEN";
pub const ENV_HF_TOKEN: &str = "HF_TOKEN";

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NerConfig {
    /// Backend used when a caller does not name one.
    #[serde(default)]
    pub default_backend: BackendKind,
    /// Pattern-based backend settings.
    #[serde(default, skip_serializing_if = "PatternConfig::is_default")]
    pub cnn: PatternConfig,
    /// Transformer-based backend settings.
    #[serde(default)]
    pub bert: TransformerConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl NerConfig {
    /// Load configuration using prefer crate for discovery, then apply
    /// environment overrides. Falls back to defaults when no file is found.
    pub async fn load() -> Self {
        // Use prefer for file discovery, then parse with serde
        let config = match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("{}; using defaults", e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(_) => Self::default(),
        };
        config.with_env_overrides()
    }

    /// Defaults with environment overrides, no config file.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: NerConfig = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        config.resolve_relative_paths();
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve the rule file path relative to the config file location.
    fn resolve_relative_paths(&mut self) {
        let Some(base_dir) = self.base_dir() else {
            return;
        };
        if let Some(ref path) = self.cnn.model_path {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            let expanded = PathBuf::from(expanded);
            if expanded.is_relative() {
                self.cnn.model_path = Some(base_dir.join(expanded));
            }
        }
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`. Empty values are ignored.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(name) = get(ENV_BACKEND) {
            match name.parse::<BackendKind>() {
                Ok(kind) => self.default_backend = kind,
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_BACKEND, e),
            }
        }
        if let Some(path) = get(ENV_CNN_MODEL) {
            self.cnn.model_path = Some(PathBuf::from(path));
        }
        if let Some(endpoint) = get(ENV_BERT_ENDPOINT) {
            self.bert.endpoint = endpoint;
        }
        if let Some(model) = get(ENV_BERT_MODEL) {
            self.bert.model = model;
        }
        if let Some(size) = get(ENV_BERT_BATCH_SIZE) {
            match size.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.bert.batch_size = n,
                _ => tracing::warn!("Ignoring {}: not a positive integer: {}", ENV_BERT_BATCH_SIZE, size),
            }
        }
        if let Some(token) = get(ENV_BERT_TOKEN).or_else(|| get(ENV_HF_TOKEN)) {
            self.bert.api_token = Some(token);
        }
        self
    }
}
