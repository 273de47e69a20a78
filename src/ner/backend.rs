//! Recognition backend abstraction.
//!
//! Two backends are supported:
//! - `cnn`: compact pattern-based local model (rule set of regular expressions)
//! - `bert`: transformer-based contextual model behind an inference endpoint
//!
//! Backends are selected through the closed [`BackendKind`] enum; a name that
//! does not parse is rejected before any backend runs.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::span::{RawSpans, Span};

/// Errors from recognition and structuring.
#[derive(Debug, Error)]
pub enum NerError {
    #[error("Unknown NER backend {0:?} (expected \"cnn\" or \"bert\")")]
    UnknownBackend(String),

    #[error("Bad span {span}{}: {reason}", text_position(.text_index))]
    BadSpan {
        text_index: Option<usize>,
        span: Span,
        reason: String,
    },

    #[error("Backend {backend} not available: {reason}")]
    BackendUnavailable { backend: BackendKind, reason: String },

    #[error("Recognition with {backend} failed: {reason}")]
    RecognitionFailed { backend: BackendKind, reason: String },
}

fn text_position(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" in text #{}", i),
        None => String::new(),
    }
}

impl NerError {
    pub(crate) fn bad_span(span: &Span, reason: impl Into<String>) -> Self {
        NerError::BadSpan {
            text_index: None,
            span: span.clone(),
            reason: reason.into(),
        }
    }

    /// Attach the position of the offending text within its batch.
    pub fn at_text(self, index: usize) -> Self {
        match self {
            NerError::BadSpan { span, reason, .. } => NerError::BadSpan {
                text_index: Some(index),
                span,
                reason,
            },
            other => other,
        }
    }

    /// Whether this error concerns a single text rather than the whole batch.
    pub fn is_per_text(&self) -> bool {
        matches!(self, NerError::BadSpan { .. })
    }
}

/// Available recognition backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Pattern-based local model.
    Cnn,
    /// Transformer-based contextual model.
    #[default]
    Bert,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::Cnn, BackendKind::Bert];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Cnn => "cnn",
            BackendKind::Bert => "bert",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BackendKind::Cnn => "pattern-based local model",
            BackendKind::Bert => "transformer-based contextual model",
        }
    }
}

impl FromStr for BackendKind {
    type Err = NerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cnn" | "pattern" => Ok(BackendKind::Cnn),
            "bert" | "transformer" => Ok(BackendKind::Bert),
            _ => Err(NerError::UnknownBackend(s.to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recognition backend: maps a batch of texts to labeled spans.
#[async_trait]
pub trait NerBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// What is needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Load the model if it is not loaded yet.
    ///
    /// Concurrent first callers share a single load. A failed load is
    /// reported as `BackendUnavailable` and retried on the next call.
    async fn ensure_loaded(&self) -> Result<(), NerError>;

    /// Recognize entities in a batch of texts.
    ///
    /// Returns one span list per text, in input order, each sorted by start.
    async fn recognize(&self, texts: &[String]) -> Result<Vec<RawSpans>, NerError>;
}
