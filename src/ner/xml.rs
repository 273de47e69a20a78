//! Inline XML annotation of entry texts.
//!
//! The annotated string reproduces the source text with every span wrapped
//! in a tag named after its label, e.g. `<PER>Beaumont</PER>, <ACT>fab.</ACT>`.
//! Text outside tags is escaped, so stripping the tags and unescaping gives
//! back the source exactly.

use std::ops::Range;

use super::backend::NerError;
use super::span::{resolve_spans, Span};
use crate::utils::html::{xml_escape, xml_unescape};

/// Annotate `source` with its ordered, non-overlapping spans.
pub fn annotate(source: &str, spans: &[Span]) -> Result<String, NerError> {
    let ranges = resolve_spans(source, spans)?;
    Ok(annotate_resolved(source, spans, &ranges))
}

/// `ranges` are the byte ranges of `spans`, as returned by `resolve_spans`.
pub(crate) fn annotate_resolved(source: &str, spans: &[Span], ranges: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(source.len() + spans.len() * 20);
    let mut cursor = 0;

    for (span, range) in spans.iter().zip(ranges) {
        let range = range.clone();
        if range.start > cursor {
            out.push_str(&xml_escape(&source[cursor..range.start]));
        }

        // Tokenizers may fold a leading separator into the span; keep it outside the tag.
        let mut content = &source[range.clone()];
        if let Some(lead) = content.chars().next().filter(|c| matches!(c, '\t' | ' ' | '\n')) {
            out.push(lead);
            content = &content[lead.len_utf8()..];
        }

        let tag = span.label.as_str();
        out.push('<');
        out.push_str(tag);
        out.push('>');
        out.push_str(&xml_escape(content));
        out.push_str("</");
        out.push_str(tag);
        out.push('>');

        cursor = range.end;
    }

    if cursor < source.len() {
        out.push_str(&xml_escape(&source[cursor..]));
    }

    out
}

/// Remove the tags added by [`annotate`] and unescape the remaining text.
pub fn strip_annotations(annotated: &str) -> String {
    let mut plain = String::with_capacity(annotated.len());
    let mut rest = annotated;
    while let Some(open) = rest.find('<') {
        plain.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                rest = &rest[open..];
                break;
            }
        }
    }
    plain.push_str(rest);
    xml_unescape(&plain)
}
