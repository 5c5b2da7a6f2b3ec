//! Line locality analysis for rule patterns
//!
//! A pattern is *line-local* when no match of it can ever contain a `\n`.
//! Matches of such a pattern are decided by the text of one line plus the
//! line breaks around it, so the live decoration engine can rescan only the
//! lines an edit touched. Anything else falls back to a full rescan.

use regex_syntax::hir::{Class, Hir, HirKind};
use regex_syntax::Parser;

/// True if no match of `pattern` can span a line break.
///
/// Unparseable patterns report `false`; they never reach the scanner anyway.
pub fn is_line_local(pattern: &str) -> bool {
    match Parser::new().parse(pattern) {
        Ok(hir) => !can_match_line_break(&hir),
        Err(_) => false,
    }
}

fn can_match_line_break(hir: &Hir) -> bool {
    match hir.kind() {
        // Assertions like `$` or `\b` look at a neighbour but never consume it
        HirKind::Empty | HirKind::Look(_) => false,
        HirKind::Literal(lit) => lit.0.contains(&b'\n'),
        HirKind::Class(Class::Unicode(cls)) => cls
            .ranges()
            .iter()
            .any(|r| r.start() <= '\n' && '\n' <= r.end()),
        HirKind::Class(Class::Bytes(cls)) => cls
            .ranges()
            .iter()
            .any(|r| r.start() <= b'\n' && b'\n' <= r.end()),
        HirKind::Repetition(rep) => can_match_line_break(&rep.sub),
        HirKind::Capture(cap) => can_match_line_break(&cap.sub),
        HirKind::Concat(subs) | HirKind::Alternation(subs) => {
            subs.iter().any(can_match_line_break)
        }
    }
}
