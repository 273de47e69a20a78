//! Structured directory entries.
//!
//! A directory entry names a person or business, usually a trade, and one or
//! more addresses. Addresses are introduced by a street name followed by zero
//! or more house numbers; the next street name, person or activity closes
//! the address being built. Labels outside that set never take part.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::backend::NerError;
use super::span::{resolve_spans, Label, Span};
use super::xml::annotate_resolved;

/// A street name with its house numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street_name: String,
    #[serde(default)]
    pub street_numbers: Vec<String>,
}

impl Address {
    fn is_open(&self) -> bool {
        !self.street_name.is_empty()
    }
}

/// Addresses and persons grouped out of one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFields {
    pub addresses: Vec<Address>,
    pub persons: Vec<String>,
}

/// Everything extracted from one entry text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub addresses: Vec<Address>,
    pub persons: Vec<String>,
    #[serde(alias = "ner_xml")]
    pub annotated_text: String,
}

impl Entity {
    /// Build the entity for `source` from its ordered, non-overlapping spans.
    pub fn from_spans(source: &str, spans: &[Span]) -> Result<Self, NerError> {
        let ranges = resolve_spans(source, spans)?;
        let EntryFields { addresses, persons } = group_resolved(source, spans, &ranges);
        let annotated_text = annotate_resolved(source, spans, &ranges);
        Ok(Entity {
            addresses,
            persons,
            annotated_text,
        })
    }
}

/// Group the spans of one entry into addresses and persons.
///
/// A house number is attached to the open address even when unlabeled text
/// separates them, however long that text is.
pub fn build_entry(source: &str, spans: &[Span]) -> Result<EntryFields, NerError> {
    let ranges = resolve_spans(source, spans)?;
    Ok(group_resolved(source, spans, &ranges))
}

/// `ranges` are the byte ranges of `spans`, as returned by `resolve_spans`.
pub(crate) fn group_resolved(source: &str, spans: &[Span], ranges: &[Range<usize>]) -> EntryFields {
    let mut fields = EntryFields::default();
    let mut address = Address::default();

    for (span, range) in spans.iter().zip(ranges) {
        let text = source[range.clone()].trim();

        // Labels outside the closed set are only annotated.
        if matches!(span.label, Label::Loc | Label::Act | Label::Per) && address.is_open() {
            fields.addresses.push(std::mem::take(&mut address));
        }

        match span.label {
            Label::Cardinal if address.is_open() => address.street_numbers.push(text.to_string()),
            Label::Loc => address.street_name = text.to_string(),
            Label::Per => fields.persons.push(text.to_string()),
            _ => {}
        }
    }

    if address.is_open() {
        fields.addresses.push(address);
    }

    fields
}
