//! Structuring facade: texts in, entities out.
//!
//! A [`Structurer`] owns one backend of each kind. Each backend loads its
//! model lazily and at most once; the process-wide instance returned by
//! [`Structurer::global`] keeps its models until the process exits, while
//! instances built with [`Structurer::new`] release them when dropped.

use std::sync::OnceLock;

use tracing::{debug, warn};

use super::backend::{BackendKind, NerBackend, NerError};
use super::entry::Entity;
use super::pattern_backend::PatternBackend;
use super::span::normalize;
use super::transformer_backend::TransformerBackend;
use crate::config::NerConfig;

static GLOBAL: OnceLock<Structurer> = OnceLock::new();

/// Outcome for one text of a batch.
pub type EntryResult = Result<Entity, NerError>;

pub struct Structurer {
    pattern: PatternBackend,
    transformer: TransformerBackend,
    default_backend: BackendKind,
}

impl Structurer {
    pub fn new(config: &NerConfig) -> Self {
        Self {
            pattern: PatternBackend::new(config.cnn.clone()),
            transformer: TransformerBackend::new(config.bert.clone()),
            default_backend: config.default_backend,
        }
    }

    /// Process-wide instance, configured from the environment on first use
    /// unless [`Structurer::init_global`] ran before.
    ///
    /// Config files are not read here; call
    /// `Structurer::init_global(&NerConfig::load().await)` first to honor a
    /// discovered `scribo-ner.toml`.
    pub fn global() -> &'static Structurer {
        GLOBAL.get_or_init(|| Structurer::new(&NerConfig::from_env()))
    }

    /// Configure the process-wide instance. Only the first call (or the first
    /// [`Structurer::global`]) decides the configuration; later calls return
    /// the existing instance.
    pub fn init_global(config: &NerConfig) -> &'static Structurer {
        GLOBAL.get_or_init(|| Structurer::new(config))
    }

    pub fn default_backend(&self) -> BackendKind {
        self.default_backend
    }

    pub fn backend(&self, kind: BackendKind) -> &dyn NerBackend {
        match kind {
            BackendKind::Cnn => &self.pattern,
            BackendKind::Bert => &self.transformer,
        }
    }

    /// Load a backend's model ahead of the first request.
    pub async fn ensure_loaded(&self, kind: BackendKind) -> Result<(), NerError> {
        self.backend(kind).ensure_loaded().await
    }

    /// Structure a batch of texts with one backend call.
    ///
    /// The outer error aborts the whole batch (backend unavailable or failed).
    /// Otherwise there is one result per text, in input order; a bad span
    /// only fails its own text.
    pub async fn structure(
        &self,
        texts: &[String],
        kind: BackendKind,
    ) -> Result<Vec<EntryResult>, NerError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let backend = self.backend(kind);
        let raw = backend.recognize(texts).await?;
        if raw.len() != texts.len() {
            return Err(NerError::RecognitionFailed {
                backend: kind,
                reason: format!("Expected {} span lists, got {}", texts.len(), raw.len()),
            });
        }

        let entities = texts
            .iter()
            .zip(raw)
            .enumerate()
            .map(|(index, (text, raw))| {
                let spans = normalize(raw);
                let result = Entity::from_spans(text, &spans).map_err(|e| e.at_text(index));
                match &result {
                    Ok(entity) => debug!("Detected entry #{}: {:?}", index, entity),
                    Err(e) => warn!("Skipping entry #{}: {}", index, e),
                }
                result
            })
            .collect();

        Ok(entities)
    }

    /// Like [`Structurer::structure`], but any failing text fails the batch.
    pub async fn structure_all(
        &self,
        texts: &[String],
        kind: BackendKind,
    ) -> Result<Vec<Entity>, NerError> {
        self.structure(texts, kind).await?.into_iter().collect()
    }
}

/// Detect and structure the entities of `texts` with the named backend
/// (`"cnn"` or `"bert"`), using the process-wide [`Structurer`].
///
/// Returns one entity per text, in input order. An unknown backend name is
/// rejected before any backend runs.
///
/// Unless [`Structurer::init_global`] ran earlier, the process-wide instance
/// is configured from defaults and `SCRIBO_NER_*` variables only, so a
/// `scribo-ner.toml` is ignored. Library callers wanting file configuration
/// should start with `Structurer::init_global(&NerConfig::load().await)`.
pub async fn detect_named_entities(
    texts: &[String],
    backend_kind: &str,
) -> Result<Vec<Entity>, NerError> {
    let kind: BackendKind = backend_kind.parse()?;
    Structurer::global().structure_all(texts, kind).await
}
