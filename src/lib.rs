//! scribo-ner - named-entity structuring for historical trade directories.
//!
//! Turns directory entry texts into structured records (addresses, persons)
//! and an inline-annotated copy of the text, using a pluggable recognition
//! backend.

pub mod config;
pub mod ner;
pub mod utils;

pub use config::NerConfig;
pub use ner::{detect_named_entities, Address, BackendKind, Entity, NerError, Structurer};
