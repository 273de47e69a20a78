//! Canonical span representation.
//!
//! Each recognition backend reports spans in its own shape. This module maps
//! both shapes onto one [`Span`] type and resolves character offsets to byte
//! ranges of the UTF-8 source text.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::backend::NerError;

/// Entity label reported by a backend.
///
/// Only the four directory labels take part in address and person grouping.
/// Anything else is kept verbatim so it can still be emitted as a tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Label {
    /// Street name.
    Loc,
    /// Trade or activity of the person listed.
    Act,
    /// House number.
    Cardinal,
    /// Person or business name.
    Per,
    /// Any other label, passed through untouched.
    Other(String),
}

impl Label {
    pub fn as_str(&self) -> &str {
        match self {
            Label::Loc => "LOC",
            Label::Act => "ACT",
            Label::Cardinal => "CARDINAL",
            Label::Per => "PER",
            Label::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unknown labels become `Other`; matching is case-sensitive.
impl From<&str> for Label {
    fn from(s: &str) -> Self {
        match s {
            "LOC" => Label::Loc,
            "ACT" => Label::Act,
            "CARDINAL" => Label::Cardinal,
            "PER" => Label::Per,
            other => Label::Other(other.to_string()),
        }
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        match Label::from(s.as_str()) {
            Label::Other(_) => Label::Other(s),
            known => known,
        }
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        match label {
            Label::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// A labeled character range within one source text.
///
/// `start` and `end` count characters, not bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub label: Label,
    pub start: usize,
    pub end: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Span {
    pub fn new(label: Label, start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            label,
            start,
            end,
            text: text.into(),
            score: None,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}, {}) {:?}",
            self.label, self.start, self.end, self.text
        )
    }
}

/// Span as produced by the pattern backend. No confidence score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpan {
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Span as returned by a token-classification pipeline with
/// `aggregation_strategy = "simple"`.
///
/// `word` comes out of the tokenizer and may have lost a leading separator
/// that `source[start..end]` still contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformerSpan {
    pub entity_group: String,
    pub score: f32,
    pub word: String,
    pub start: usize,
    pub end: usize,
}

/// Raw backend output for one text.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSpans {
    Pattern(Vec<PatternSpan>),
    Transformer(Vec<TransformerSpan>),
}

impl RawSpans {
    pub fn len(&self) -> usize {
        match self {
            RawSpans::Pattern(spans) => spans.len(),
            RawSpans::Transformer(spans) => spans.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<PatternSpan> for Span {
    fn from(raw: PatternSpan) -> Self {
        Span {
            label: Label::from(raw.label),
            start: raw.start,
            end: raw.end,
            text: raw.text,
            score: None,
        }
    }
}

impl From<TransformerSpan> for Span {
    fn from(raw: TransformerSpan) -> Self {
        Span {
            label: Label::from(raw.entity_group),
            start: raw.start,
            end: raw.end,
            text: raw.word,
            score: Some(raw.score),
        }
    }
}

/// Map raw backend spans onto canonical spans, keeping their order.
///
/// Offsets are not checked here; see [`resolve_spans`].
pub fn normalize(raw: RawSpans) -> Vec<Span> {
    match raw {
        RawSpans::Pattern(spans) => spans.into_iter().map(Span::from).collect(),
        RawSpans::Transformer(spans) => spans.into_iter().map(Span::from).collect(),
    }
}

/// Character/byte offset conversion for one text.
pub(crate) struct OffsetMap {
    /// Byte offset of every char, plus the text length as a sentinel.
    /// Empty for ASCII text, where both coordinate systems agree.
    boundaries: Vec<usize>,
    byte_len: usize,
}

impl OffsetMap {
    pub(crate) fn new(text: &str) -> Self {
        let boundaries = if text.is_ascii() {
            Vec::new()
        } else {
            text.char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(text.len()))
                .collect()
        };
        Self {
            boundaries,
            byte_len: text.len(),
        }
    }

    pub(crate) fn char_len(&self) -> usize {
        if self.boundaries.is_empty() {
            self.byte_len
        } else {
            self.boundaries.len() - 1
        }
    }

    pub(crate) fn char_to_byte(&self, char_offset: usize) -> Option<usize> {
        if char_offset > self.char_len() {
            return None;
        }
        if self.boundaries.is_empty() {
            Some(char_offset)
        } else {
            Some(self.boundaries[char_offset])
        }
    }

    /// `byte_offset` must fall on a char boundary.
    pub(crate) fn byte_to_char(&self, byte_offset: usize) -> usize {
        if self.boundaries.is_empty() {
            byte_offset
        } else {
            match self.boundaries.binary_search(&byte_offset) {
                Ok(i) | Err(i) => i,
            }
        }
    }
}

/// Check the spans of one text and convert them to byte ranges.
///
/// Spans must lie within the text, have `start <= end`, and be sorted by
/// start without overlapping. The first violation is reported.
pub fn resolve_spans(source: &str, spans: &[Span]) -> Result<Vec<Range<usize>>, NerError> {
    let offsets = OffsetMap::new(source);
    let char_len = offsets.char_len();
    let mut previous_end = 0;
    let mut ranges = Vec::with_capacity(spans.len());

    for span in spans {
        let reason = if span.start > span.end {
            Some("start is after end".to_string())
        } else if span.end > char_len {
            Some(format!("end is past the text length ({} chars)", char_len))
        } else if span.start < previous_end {
            Some(format!(
                "span overlaps or precedes the previous span ending at {}",
                previous_end
            ))
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(NerError::bad_span(span, reason));
        }

        // Both offsets are within bounds at this point.
        let (Some(start), Some(end)) = (
            offsets.char_to_byte(span.start),
            offsets.char_to_byte(span.end),
        ) else {
            return Err(NerError::bad_span(span, "offset out of bounds"));
        };
        ranges.push(start..end);
        previous_end = span.end;
    }

    Ok(ranges)
}
