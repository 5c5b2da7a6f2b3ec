//! Link Activator - resolves a user activation at a text offset
//!
//! The target is always re-derived from the current text. The line holding
//! the offset is segmented with the same precedence as static rendering and
//! the link whose span contains the offset is classified.

use serde::{Deserialize, Serialize};

use super::segment::{segment_spans, Segment};
use crate::rules::{CompiledRule, RuleSet};

/// Where an activated link points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LinkTarget {
    /// Another note, by name (`[[name]]` or `[[name|alias]]`)
    Internal { name: String },
    /// Anything else, opened as a URL
    External { url: String },
}

/// Classify an expanded link target.
///
/// The whole string must be a wikilink for the target to be internal:
/// `[[` + name without `|` or `]` + optional `|alias` + `]]`.
pub fn classify(target: &str) -> LinkTarget {
    match parse_internal(target) {
        Some(name) => LinkTarget::Internal {
            name: name.to_string(),
        },
        None => LinkTarget::External {
            url: target.to_string(),
        },
    }
}

fn parse_internal(target: &str) -> Option<&str> {
    let inner = target.strip_prefix("[[")?.strip_suffix("]]")?;
    let (name, alias) = match inner.split_once('|') {
        Some((name, alias)) => (name, Some(alias)),
        None => (inner, None),
    };
    if name.is_empty() || name.contains(']') {
        return None;
    }
    if let Some(alias) = alias {
        if alias.is_empty() || alias.contains(']') {
            return None;
        }
    }
    Some(name)
}

/// A link found under an activation offset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivatedLink {
    /// Byte span of the link in the full text
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Expanded target before classification
    pub target: String,
    pub link_target: LinkTarget,
}

/// Find the link covering byte `offset` of `text`.
///
/// Offsets inside a multi-byte character are treated as that character's
/// start. `None` when the offset is outside every link span.
pub fn link_at(rules: &[CompiledRule], text: &str, offset: usize) -> Option<ActivatedLink> {
    if offset >= text.len() {
        return None;
    }
    let mut offset = offset;
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }

    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[offset..].find('\n').map_or(text.len(), |i| offset + i);
    let local = offset - line_start;

    segment_spans(rules, &text[line_start..line_end])
        .into_iter()
        .find(|s| s.segment.is_link() && s.span.contains(&local))
        .and_then(|s| match s.segment {
            Segment::Link { text, target, .. } => Some(ActivatedLink {
                start: line_start + s.span.start,
                end: line_start + s.span.end,
                text,
                link_target: classify(&target),
                target,
            }),
            Segment::Plain { .. } => None,
        })
}

/// Resolve the target of the link at `offset`, if any.
pub fn activate(rules: &[CompiledRule], text: &str, offset: usize) -> Option<LinkTarget> {
    link_at(rules, text, offset).map(|link| link.link_target)
}

impl RuleSet {
    /// [`activate`] over a snapshot of this set
    pub fn activate(&self, text: &str, offset: usize) -> Option<LinkTarget> {
        activate(&self.snapshot(), text, offset)
    }
}
