//! Pattern-based recognition backend ("cnn").
//!
//! The model is a rule set: each rule pairs a label with a regular expression.
//! A rule set tuned for Paris trade directories is built in; a rule file on
//! disk replaces it when configured or found in the standard model
//! directories.
//!
//! Rule file format (TOML):
//!
//! ```toml
//! name = "fr_directories"
//!
//! [[rules]]
//! label = "CARDINAL"
//! pattern = '''\b\d{1,4}(?:\s?(?:bis|ter))?\b'''
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::backend::{BackendKind, NerBackend, NerError};
use super::model_utils::{expand_path, ModelDirConfig};
use super::span::{OffsetMap, PatternSpan, RawSpans};

/// Built-in rule set.
const BUILTIN_RULES: &str = include_str!("../../models/fr_directories.toml");

/// Rule file looked up in the standard model directories.
pub const RULES_FILENAME: &str = "fr_directories.toml";

/// Capture group that narrows a match to the tagged part.
const ENTITY_GROUP: &str = "ent";

const MODEL_CONFIG: ModelDirConfig = ModelDirConfig {
    subdir: "scribo-ner",
    required_files: &[RULES_FILENAME],
};

/// Configuration for the pattern backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Rule file to load instead of the built-in rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
}

impl PatternConfig {
    pub fn is_default(&self) -> bool {
        self.model_path.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    rules: Vec<RuleSpec>,
}

#[derive(Debug, Deserialize)]
struct RuleSpec {
    label: String,
    pattern: String,
}

struct Rule {
    label: String,
    regex: Regex,
    group: Option<usize>,
}

/// Compiled rule set.
pub struct PatternModel {
    name: String,
    rules: Vec<Rule>,
}

impl PatternModel {
    /// The rule set shipped with the crate.
    pub fn builtin() -> Result<Self, String> {
        Self::from_toml(BUILTIN_RULES, "builtin")
    }

    /// Load a rule file.
    pub async fn load(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read rule file {}: {}", path.display(), e))?;
        Self::from_toml(&contents, &path.display().to_string())
    }

    /// Compile a rule set from TOML; `origin` names it in error messages.
    pub fn from_toml(contents: &str, origin: &str) -> Result<Self, String> {
        let file: RuleFile = toml::from_str(contents)
            .map_err(|e| format!("Failed to parse rule file {}: {}", origin, e))?;

        if file.rules.is_empty() {
            return Err(format!("Rule file {} defines no rules", origin));
        }

        let rules = file
            .rules
            .into_iter()
            .enumerate()
            .map(|(i, spec)| {
                let regex = Regex::new(&spec.pattern).map_err(|e| {
                    format!("Invalid pattern in rule #{} ({}) of {}: {}", i, spec.label, origin, e)
                })?;
                let group = regex
                    .capture_names()
                    .position(|name| name == Some(ENTITY_GROUP));
                Ok(Rule {
                    label: spec.label,
                    regex,
                    group,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(Self {
            name: file.name.unwrap_or_else(|| origin.to_string()),
            rules,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Tag one text. Spans are sorted by start and never overlap.
    pub fn recognize(&self, text: &str) -> Vec<PatternSpan> {
        let offsets = OffsetMap::new(text);

        // (start, end, rule index) in chars
        let mut candidates: Vec<(usize, usize, usize)> = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            for caps in rule.regex.captures_iter(text) {
                let Some(m) = rule.group.and_then(|g| caps.get(g)).or_else(|| caps.get(0)) else {
                    continue;
                };
                if m.is_empty() {
                    continue;
                }
                candidates.push((
                    offsets.byte_to_char(m.start()),
                    offsets.byte_to_char(m.end()),
                    index,
                ));
            }
        }

        // Longest first, then earliest; stable so rule order breaks exact ties.
        candidates.sort_by(|a, b| (b.1 - b.0).cmp(&(a.1 - a.0)).then(a.0.cmp(&b.0)));

        let mut kept: Vec<(usize, usize, usize)> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if kept
                .iter()
                .all(|k| candidate.1 <= k.0 || candidate.0 >= k.1)
            {
                kept.push(candidate);
            }
        }
        kept.sort_by_key(|k| k.0);

        kept.into_iter()
            .filter_map(|(start, end, index)| {
                let bytes = offsets.char_to_byte(start)?..offsets.char_to_byte(end)?;
                Some(PatternSpan {
                    label: self.rules[index].label.clone(),
                    start,
                    end,
                    text: text[bytes].to_string(),
                })
            })
            .collect()
    }
}

/// Pattern-based backend.
pub struct PatternBackend {
    config: PatternConfig,
    model: OnceCell<PatternModel>,
}

impl PatternBackend {
    pub fn new(config: PatternConfig) -> Self {
        Self {
            config,
            model: OnceCell::new(),
        }
    }

    /// Rule file to use, if any: configured path first, then standard locations.
    fn rules_path(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.config.model_path {
            return Some(expand_path(path));
        }
        MODEL_CONFIG
            .find()
            .map(|dir| dir.join(RULES_FILENAME))
    }

    async fn load_model(&self) -> Result<PatternModel, NerError> {
        let model = match self.rules_path() {
            Some(path) => PatternModel::load(&path).await,
            None => PatternModel::builtin(),
        }
        .map_err(|reason| NerError::BackendUnavailable {
            backend: BackendKind::Cnn,
            reason,
        })?;

        info!(
            "Loaded pattern model '{}' ({} rules)",
            model.name(),
            model.rule_count()
        );
        Ok(model)
    }

    /// Get or load the model; concurrent first callers share one load.
    async fn model(&self) -> Result<&PatternModel, NerError> {
        self.model.get_or_try_init(|| self.load_model()).await
    }
}

impl Default for PatternBackend {
    fn default() -> Self {
        Self::new(PatternConfig::default())
    }
}

#[async_trait]
impl NerBackend for PatternBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cnn
    }

    fn availability_hint(&self) -> String {
        match self.config.model_path {
            Some(ref path) => format!("Rule file must exist and parse: {}", path.display()),
            None => format!(
                "Built-in rules, or {} in {}",
                RULES_FILENAME,
                MODEL_CONFIG.default_dir().display()
            ),
        }
    }

    async fn ensure_loaded(&self) -> Result<(), NerError> {
        self.model().await.map(|_| ())
    }

    async fn recognize(&self, texts: &[String]) -> Result<Vec<RawSpans>, NerError> {
        let model = self.model().await?;
        let results: Vec<RawSpans> = texts
            .iter()
            .map(|text| RawSpans::Pattern(model.recognize(text)))
            .collect();
        debug!("Pattern model tagged {} texts", results.len());
        Ok(results)
    }
}
