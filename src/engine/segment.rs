//! Static Segmenter - splits text into alternating plain and link segments
//!
//! Matches are consumed left to right: the matcher runs on the remaining
//! text, the text before the match becomes a plain segment, the match becomes
//! a link, and scanning continues after it. A zero-width match consumes one
//! code point which stays in the pending plain run, so every iteration makes
//! progress.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::matcher::match_rule;
use crate::rules::{CompiledRule, RuleSet};

/// One contiguous run of plain text or one link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment {
    Plain {
        text: String,
    },
    Link {
        text: String,
        target: String,
        #[serde(rename = "cssclass")]
        style_class: String,
    },
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Segment::Plain { text: text.into() }
    }

    pub fn link(
        text: impl Into<String>,
        target: impl Into<String>,
        style_class: impl Into<String>,
    ) -> Self {
        Segment::Link {
            text: text.into(),
            target: target.into(),
            style_class: style_class.into(),
        }
    }

    /// Display text (the original characters this segment covers)
    pub fn text(&self) -> &str {
        match self {
            Segment::Plain { text } | Segment::Link { text, .. } => text,
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Segment::Link { .. })
    }
}

/// A segment with its byte span in the segmented text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedSegment {
    pub span: Range<usize>,
    pub segment: Segment,
}

/// Segment `text` with the given rules.
///
/// Concatenating the segments' text reproduces `text`. Empty input yields a
/// single empty plain segment.
pub fn segment(rules: &[CompiledRule], text: &str) -> Vec<Segment> {
    segment_spans(rules, text)
        .into_iter()
        .map(|s| s.segment)
        .collect()
}

/// Like [`segment`], keeping each segment's byte span.
pub fn segment_spans(rules: &[CompiledRule], text: &str) -> Vec<SpannedSegment> {
    let mut out = Vec::new();
    // Start of the plain run not yet emitted
    let mut plain_start = 0;
    // Where the next matcher call looks from
    let mut cursor = 0;

    while let Some(m) = match_rule(rules, &text[cursor..]) {
        let start = cursor + m.start;
        let end = cursor + m.end;

        if m.is_empty() {
            match text[start..].chars().next() {
                Some(ch) => {
                    cursor = start + ch.len_utf8();
                    continue;
                }
                None => break,
            }
        }

        out.push(SpannedSegment {
            span: plain_start..start,
            segment: Segment::plain(&text[plain_start..start]),
        });
        out.push(SpannedSegment {
            span: start..end,
            segment: Segment::link(m.matched_text, m.link, m.style_class),
        });
        plain_start = end;
        cursor = end;
    }

    out.push(SpannedSegment {
        span: plain_start..text.len(),
        segment: Segment::plain(&text[plain_start..]),
    });
    out
}

impl RuleSet {
    /// [`segment`] over a snapshot of this set
    pub fn segment(&self, text: &str) -> Vec<Segment> {
        segment(&self.snapshot(), text)
    }
}

/// Concatenate segment texts back into one string
pub fn join_segments(segments: &[Segment]) -> String {
    segments.iter().map(Segment::text).collect()
}
