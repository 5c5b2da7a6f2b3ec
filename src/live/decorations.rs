//! Incremental Decoration Engine
//!
//! Keeps one [`DecorationSet`] per rule in sync with a live document.
//!
//! # Algorithm
//! - **Full scan**: all non-overlapping matches left to right; a zero-width
//!   match yields no decoration and moves the cursor one code point on.
//! - **Line-local rules**: an edit discards the decorations of the lines it
//!   touched, rescans only those lines, and shifts everything after them.
//!   The search itself ends one character past the touched lines.
//! - **Other rules**: a match may cross lines, so the document is rescanned.
//!
//! Either way a set always equals a full scan of the current text.
//! Decorations of different rules are independent and may overlap.

use fancy_regex::Regex;
use serde::{Deserialize, Serialize};

use super::edit::Edit;
use crate::rules::{CompiledRule, RuleId, RuleSet};

// =============================================================================
// Types
// =============================================================================

/// A highlighted byte range of the live document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoration {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "cssclass")]
    pub style_class: String,
}

/// Counters for incremental vs. full work
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Per-set updates that rescanned only the touched lines
    pub incremental_count: u64,
    /// Per-set full rescans (creation, multi-line rules, inconsistent edits)
    pub full_rescan_count: u64,
    /// Bytes handed to the regex as search text, summed over all scans
    pub scanned_bytes: u64,
}

impl EngineStats {
    fn record_full(&mut self, doc_len: usize) {
        self.full_rescan_count += 1;
        self.scanned_bytes += doc_len as u64;
    }
}

// =============================================================================
// Scanning
// =============================================================================

/// Search text end for a scan stopping at `limit`: one character past it,
/// so assertions at `limit` still see the real next character.
fn haystack_end(text: &str, limit: usize) -> usize {
    let limit = limit.min(text.len());
    text[limit..]
        .chars()
        .next()
        .map_or(limit, |ch| limit + ch.len_utf8())
}

/// Scan `text` from byte `from`, keeping matches that end at or before `limit`.
///
/// The regex never looks further than one character past `limit`. Patterns
/// that need more lookahead than that must be scanned to the end.
pub fn scan_range(regex: &Regex, text: &str, from: usize, limit: usize, style_class: &str) -> Vec<Decoration> {
    let haystack = &text[..haystack_end(text, limit)];
    let mut out = Vec::new();
    let mut cursor = from;

    while cursor <= haystack.len() {
        let found = match regex.find_from_pos(haystack, cursor) {
            Ok(found) => found,
            Err(err) => {
                log::warn!("scan of /{}/ stopped at byte {}: {}", regex.as_str(), cursor, err);
                break;
            }
        };
        let Some(m) = found else {
            break;
        };
        if m.end() > limit {
            break;
        }
        if m.start() == m.end() {
            match text[m.start()..].chars().next() {
                Some(ch) => cursor = m.start() + ch.len_utf8(),
                None => break,
            }
            continue;
        }
        out.push(Decoration {
            start: m.start(),
            end: m.end(),
            style_class: style_class.to_string(),
        });
        cursor = m.end();
    }
    out
}

/// All decorations of `regex` over the whole of `text`
pub fn scan_all(regex: &Regex, text: &str, style_class: &str) -> Vec<Decoration> {
    scan_range(regex, text, 0, text.len(), style_class)
}

/// Sorted, non-empty and non-overlapping
pub fn is_well_formed(decorations: &[Decoration]) -> bool {
    decorations.iter().all(|d| d.start < d.end)
        && decorations.windows(2).all(|w| w[0].end <= w[1].start)
}

// =============================================================================
// DecorationSet
// =============================================================================

/// The decorations of one rule over the current document
#[derive(Debug, Clone)]
pub struct DecorationSet {
    rule: CompiledRule,
    decorations: Vec<Decoration>,
}

impl DecorationSet {
    /// Full scan of `text` for a rule. `None` if the rule failed to compile.
    pub fn build(rule: CompiledRule, text: &str) -> Option<Self> {
        let regex = rule.regex()?;
        let decorations = scan_all(regex, text, rule.style_class());
        Some(Self { rule, decorations })
    }

    pub fn rule(&self) -> &CompiledRule {
        &self.rule
    }

    pub fn rule_id(&self) -> RuleId {
        self.rule.id()
    }

    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }

    pub fn is_well_formed(&self) -> bool {
        is_well_formed(&self.decorations)
    }

    fn rescan(&mut self, text: &str) {
        if let Some(regex) = self.rule.regex() {
            self.decorations = scan_all(regex, text, self.rule.style_class());
        }
    }

    /// Bring the set up to date with `text`, the document after `edit`.
    ///
    /// Returns the number of bytes searched if only the touched lines were
    /// rescanned, `None` after a full rescan. The caller must have checked
    /// that `edit` is consistent with `text`.
    fn apply_edit(&mut self, edit: &Edit, text: &str) -> Option<usize> {
        if !self.rule.is_line_local() {
            self.rescan(text);
            return None;
        }
        let regex = self.rule.regex()?;

        // Touched lines in the new text: from the line start before the
        // edit to the line break (or end) after the inserted text
        let window_start = text[..edit.old_start].rfind('\n').map_or(0, |i| i + 1);
        let new_end = edit.new_end();
        let window_end = text[new_end..].find('\n').map_or(text.len(), |i| new_end + i);
        let old_window_end = window_end - new_end + edit.old_end;

        let keep_before = self.decorations.partition_point(|d| d.end <= window_start);
        let keep_after = self.decorations.partition_point(|d| d.start <= old_window_end);

        for d in &mut self.decorations[keep_after..] {
            d.start = edit.shift(d.start);
            d.end = edit.shift(d.end);
        }

        let fresh = scan_range(regex, text, window_start, window_end, self.rule.style_class());
        self.decorations.splice(keep_before..keep_after, fresh);
        Some(haystack_end(text, window_end) - window_start)
    }
}

// =============================================================================
// DecorationEngine
// =============================================================================

/// Owns the decoration sets of every active rule for one live document.
///
/// Mutated only through [`sync_rules`](Self::sync_rules),
/// [`rebuild`](Self::rebuild) and [`apply_edit`](Self::apply_edit).
#[derive(Debug, Clone, Default)]
pub struct DecorationEngine {
    sets: Vec<DecorationSet>,
    doc_len: usize,
    stats: EngineStats,
}

impl DecorationEngine {
    /// Build sets for every valid rule with a full scan of `text`
    pub fn new(rules: &RuleSet, text: &str) -> Self {
        let mut engine = Self::default();
        engine.sync_rules(rules, text);
        engine
    }

    pub fn sets(&self) -> &[DecorationSet] {
        &self.sets
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Length of the document the sets describe
    pub fn doc_len(&self) -> usize {
        self.doc_len
    }

    pub fn decorations_for(&self, id: RuleId) -> Option<&[Decoration]> {
        self.sets
            .iter()
            .find(|s| s.rule_id() == id)
            .map(DecorationSet::decorations)
    }

    /// Every decoration of every rule, ordered by position
    pub fn all_decorations(&self) -> Vec<Decoration> {
        let mut all: Vec<Decoration> = self
            .sets
            .iter()
            .flat_map(|s| s.decorations().iter().cloned())
            .collect();
        all.sort_by_key(|d| (d.start, d.end));
        all
    }

    /// Follow a rule-set change.
    ///
    /// Sets whose rule is unchanged are kept, new or redefined rules get a
    /// fresh full scan, removed rules are dropped. Sets follow rule order.
    pub fn sync_rules(&mut self, rules: &RuleSet, text: &str) {
        if text.len() != self.doc_len && !self.sets.is_empty() {
            log::warn!(
                "document length {} differs from tracked {}, rebuilding decorations",
                text.len(),
                self.doc_len
            );
            self.sets.clear();
        }

        let mut previous = std::mem::take(&mut self.sets);
        for rule in rules {
            if let Some(pos) = previous.iter().position(|s| s.rule_id() == rule.id()) {
                self.sets.push(previous.swap_remove(pos));
            } else if let Some(set) = DecorationSet::build(rule.clone(), text) {
                log::debug!("built {} decorations for /{}/", set.len(), rule.pattern());
                self.stats.record_full(text.len());
                self.sets.push(set);
            }
        }
        self.doc_len = text.len();
    }

    /// Discard every set's state and rescan `text` from scratch
    pub fn rebuild(&mut self, text: &str) {
        for set in &mut self.sets {
            set.rescan(text);
            self.stats.record_full(text.len());
        }
        self.doc_len = text.len();
    }

    /// Apply one edit. `text` is the full document after the edit.
    ///
    /// An edit that does not fit the tracked document (out of bounds, not on
    /// character boundaries, or a length mismatch) triggers a full rebuild.
    pub fn apply_edit(&mut self, edit: Edit, text: &str) {
        if !self.edit_fits(&edit, text) {
            log::warn!("edit {:?} does not fit the document, rebuilding decorations", edit);
            self.rebuild(text);
            return;
        }

        for set in &mut self.sets {
            match set.apply_edit(&edit, text) {
                Some(scanned) => {
                    self.stats.incremental_count += 1;
                    self.stats.scanned_bytes += scanned as u64;
                }
                None => self.stats.record_full(text.len()),
            }
            debug_assert!(set.is_well_formed(), "overlapping decorations for /{}/", set.rule().pattern());
        }
        self.doc_len = text.len();
    }

    /// Apply all changes of one transaction, given in old-document offsets.
    pub fn apply_edits(&mut self, edits: &[Edit], text: &str) {
        match Edit::merge(edits) {
            Some(edit) => self.apply_edit(edit, text),
            None if edits.is_empty() && text.len() == self.doc_len => {}
            None => {
                log::warn!("inconsistent edit batch, rebuilding decorations");
                self.rebuild(text);
            }
        }
    }

    fn edit_fits(&self, edit: &Edit, text: &str) -> bool {
        edit.apply_len(self.doc_len) == Some(text.len())
            && text.is_char_boundary(edit.old_start)
            && text.is_char_boundary(edit.new_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    fn ranges(decorations: &[Decoration]) -> Vec<(usize, usize)> {
        decorations.iter().map(|d| (d.start, d.end)).collect()
    }

    fn search_rule() -> RuleSet {
        RuleSet::from_rules([Rule::new(r"g/([a-zA-Z.-]*)", "http://g/$1", "url")])
    }

    #[test]
    fn test_full_scan_finds_all_matches() {
        let regex = Regex::new(r"g/[a-z]+").unwrap();
        let found = scan_all(&regex, "g/a x g/bb\ng/c", "url");
        assert_eq!(ranges(&found), vec![(0, 3), (6, 10), (11, 14)]);
        assert!(found.iter().all(|d| d.style_class == "url"));
    }

    #[test]
    fn test_full_scan_skips_zero_width() {
        let regex = Regex::new("a*").unwrap();
        let found = scan_all(&regex, "baab a", "");
        assert_eq!(ranges(&found), vec![(1, 3), (5, 6)]);
    }

    #[test]
    fn test_full_scan_is_idempotent() {
        let rules = search_rule();
        let text = "g/x g/y.z g/";
        let a = DecorationEngine::new(&rules, text);
        let b = DecorationEngine::new(&rules, text);
        assert_eq!(a.sets()[0].decorations(), b.sets()[0].decorations());
    }

    #[test]
    fn test_edit_before_shifts_later_decorations() {
        let rules = search_rule();
        let mut text = String::from("line one\ng/cats here\n");
        let mut engine = DecorationEngine::new(&rules, &text);
        assert_eq!(ranges(engine.sets()[0].decorations()), vec![(9, 15)]);

        text.insert_str(0, "NEW ");
        engine.apply_edit(Edit::insert(0, 4), &text);
        assert_eq!(ranges(engine.sets()[0].decorations()), vec![(13, 19)]);
        assert_eq!(engine.stats().incremental_count, 1);
    }

    #[test]
    fn test_typing_extends_match() {
        let rules = search_rule();
        let mut text = String::from("a g/ca b");
        let mut engine = DecorationEngine::new(&rules, &text);
        assert_eq!(ranges(engine.sets()[0].decorations()), vec![(2, 6)]);

        text.insert(6, 't');
        engine.apply_edit(Edit::insert(6, 1), &text);
        assert_eq!(ranges(engine.sets()[0].decorations()), vec![(2, 7)]);
    }

    #[test]
    fn test_deleting_line_break_merges_lines() {
        let rules = RuleSet::from_rules([Rule::new(r"ab", "x", "")]);
        let mut text = String::from("xa\nbx ab");
        let mut engine = DecorationEngine::new(&rules, &text);
        assert_eq!(ranges(engine.sets()[0].decorations()), vec![(6, 8)]);

        text.replace_range(2..3, "");
        engine.apply_edit(Edit::delete(2, 3), &text);
        assert_eq!(ranges(engine.sets()[0].decorations()), vec![(1, 3), (5, 7)]);
    }

    #[test]
    fn test_multi_line_rule_falls_back_to_full_rescan() {
        let rules = RuleSet::from_rules([Rule::new(r"a[^x]*c", "x", "")]);
        let mut text = String::from("a\nb\nd");
        let mut engine = DecorationEngine::new(&rules, &text);
        assert!(engine.sets()[0].is_empty());

        text.push('c');
        engine.apply_edit(Edit::insert(5, 1), &text);
        assert_eq!(ranges(engine.sets()[0].decorations()), vec![(0, 6)]);
        assert_eq!(engine.stats().incremental_count, 0);
        // Initial scan of 5 bytes, then the whole 6-byte document again
        assert_eq!(engine.stats().scanned_bytes, 11);
    }

    #[test]
    fn test_line_edit_searches_only_touched_line() {
        let rules = search_rule();
        let mut text = String::from("first line\n");
        text.push_str(&"no links on this line\n".repeat(10_000));
        let mut engine = DecorationEngine::new(&rules, &text);
        let before = engine.stats().scanned_bytes;
        assert_eq!(before, text.len() as u64);

        text.insert(0, 'x');
        engine.apply_edit(Edit::insert(0, 1), &text);
        // "xfirst line" plus the line break after it
        assert_eq!(engine.stats().scanned_bytes - before, 12);
        assert!(engine.sets()[0].is_empty());
    }

    #[test]
    fn test_window_keeps_lookahead_context() {
        // `$` without (?m) is end of text, which a window never contains
        let rules = RuleSet::from_rules([Rule::new(r"g/a$", "x", "")]);
        let mut text = String::from("g/\nend");
        let mut engine = DecorationEngine::new(&rules, &text);
        text.insert(2, 'a');
        engine.apply_edit(Edit::insert(2, 1), &text);
        assert!(engine.sets()[0].is_empty());

        let mut text = String::from("z\ng/");
        let mut engine = DecorationEngine::new(&rules, &text);
        text.push('a');
        engine.apply_edit(Edit::insert(4, 1), &text);
        assert_eq!(ranges(engine.sets()[0].decorations()), vec![(2, 5)]);
    }

    #[test]
    fn test_inconsistent_edit_rebuilds() {
        let rules = search_rule();
        let mut engine = DecorationEngine::new(&rules, "g/a");
        // Claims an insert of 1 byte, but the text grew by 4
        engine.apply_edit(Edit::insert(0, 1), "xyz g/a");
        assert_eq!(ranges(engine.sets()[0].decorations()), vec![(4, 7)]);
        assert_eq!(engine.doc_len(), 7);
    }

    #[test]
    fn test_sync_rules_keeps_unchanged_and_rebuilds_changed() {
        let mut rules = RuleSet::from_rules([
            Rule::new("a+", "x", "one"),
            Rule::new("b+", "y", "two"),
        ]);
        let text = "aa bb";
        let mut engine = DecorationEngine::new(&rules, text);
        let kept_id = rules.get(0).unwrap().id();

        rules.replace(1, Rule::new("bb b", "z", "three")).unwrap();
        rules.push(Rule::new("(", "bad", ""));
        engine.sync_rules(&rules, text);

        assert_eq!(engine.sets().len(), 2);
        assert_eq!(engine.sets()[0].rule_id(), kept_id);
        assert!(engine.sets()[1].is_empty());
        assert!(engine.decorations_for(rules.get(1).unwrap().id()).is_some());

        rules.remove(0).unwrap();
        engine.sync_rules(&rules, text);
        assert_eq!(engine.sets().len(), 1);
        assert!(engine.decorations_for(kept_id).is_none());
    }

    #[test]
    fn test_sync_rules_follows_rule_order() {
        let mut rules = RuleSet::from_rules([Rule::new("a", "x", ""), Rule::new("b", "y", "")]);
        let mut engine = DecorationEngine::new(&rules, "ab");
        rules.move_rule(1, 0).unwrap();
        engine.sync_rules(&rules, "ab");
        assert_eq!(engine.sets()[0].rule().pattern(), "b");
    }

    #[test]
    fn test_rules_overlap_independently() {
        let rules = RuleSet::from_rules([
            Rule::new(r"g/\w+", "x", "search"),
            Rule::new(r"\w+", "y", "word"),
        ]);
        let engine = DecorationEngine::new(&rules, "g/abc");
        let all = engine.all_decorations();
        assert_eq!(all.len(), 3);
        assert_eq!((all[0].start, all[0].end), (0, 1));
        assert_eq!((all[1].start, all[1].end), (0, 5));
        assert_eq!((all[2].start, all[2].end), (2, 5));
    }

    #[test]
    fn test_apply_edits_merges_transaction() {
        let rules = search_rule();
        let old = "g/a 12345 g/b";
        let mut engine = DecorationEngine::new(&rules, old);
        // Replace "g/a" with "xx" and insert "g/q " before "g/b"
        let new = "xx 12345 g/q g/b";
        engine.apply_edits(&[Edit::new(0, 3, 2), Edit::insert(10, 4)], new);
        assert_eq!(ranges(engine.sets()[0].decorations()), vec![(9, 12), (13, 16)]);
    }

    #[test]
    fn test_decoration_json_shape() {
        let d = Decoration { start: 1, end: 2, style_class: "c".into() };
        assert_eq!(
            serde_json::to_value(&d).unwrap(),
            serde_json::json!({"start": 1, "end": 2, "cssclass": "c"})
        );
    }
}
