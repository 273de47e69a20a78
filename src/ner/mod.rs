//! Named-entity structuring for directory entries.
//!
//! Texts go through a recognition backend, which reports labeled spans; the
//! spans are normalized, grouped into addresses and persons, and used to
//! annotate the text with inline tags.
//!
//! ## Backends
//!
//! - **cnn**: pattern-based local model, built-in rule set (default offline)
//! - **bert**: transformer-based model served by an inference endpoint
//!
//! Use [`detect_named_entities`] for the one-call surface, or a
//! [`Structurer`] for per-text error isolation and explicit model loading.

mod backend;
mod entry;
mod model_utils;
mod pattern_backend;
mod span;
mod structurer;
mod transformer_backend;
mod xml;

pub use backend::{BackendKind, NerBackend, NerError};
pub use entry::{build_entry, Address, Entity, EntryFields};
pub use pattern_backend::{PatternBackend, PatternConfig, PatternModel, RULES_FILENAME};
pub use span::{normalize, resolve_spans, Label, PatternSpan, RawSpans, Span, TransformerSpan};
pub use structurer::{detect_named_entities, EntryResult, Structurer};
pub use transformer_backend::{TransformerBackend, TransformerConfig, DEFAULT_MODEL};
pub use xml::{annotate, strip_annotations};
