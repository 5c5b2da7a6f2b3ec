//! Rule model: rule records, compiled rules and the ordered RuleSet
//!
//! Rule order is precedence order. A RuleSet is copy-on-write over an
//! `Rc<[CompiledRule]>`, so [`RuleSet::snapshot`] hands out an immutable view
//! that later edits to the set cannot disturb.

use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::dialect::translate;
use super::locality::is_line_local;
use crate::engine::template::validate_template;
use crate::error::ConfigError;

// =============================================================================
// Rule records
// =============================================================================

/// A pattern → link-template rule, as configured and persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Regular expression source, may contain capture groups
    #[serde(rename = "regexp")]
    pub pattern: String,
    /// Link template with `$N` back-references
    pub link: String,
    /// Style class applied to rendered links and live decorations
    #[serde(rename = "cssclass", default)]
    pub style_class: String,
}

impl Rule {
    pub fn new(
        pattern: impl Into<String>,
        link: impl Into<String>,
        style_class: impl Into<String>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            link: link.into(),
            style_class: style_class.into(),
        }
    }
}

/// Identity of one compiled rule definition.
///
/// Every compile issues a fresh id, so a replaced rule never shares an id
/// with the definition it replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(u64);

impl RuleId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        RuleId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

// =============================================================================
// Compiled rules
// =============================================================================

#[derive(Debug, Clone)]
struct Compiled {
    regex: Regex,
    line_local: bool,
}

/// A rule together with its compiled pattern, or the reason it failed.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    id: RuleId,
    rule: Rule,
    compiled: Result<Compiled, ConfigError>,
}

impl CompiledRule {
    /// Compile a rule. Failures are recorded on the rule, not returned.
    pub fn compile(rule: Rule) -> Self {
        let compiled = compile_parts(&rule);
        if let Err(err) = &compiled {
            log::warn!("rule /{}/ will be skipped: {}", rule.pattern, err);
        }
        Self {
            id: RuleId::next(),
            rule,
            compiled,
        }
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn pattern(&self) -> &str {
        &self.rule.pattern
    }

    pub fn link(&self) -> &str {
        &self.rule.link
    }

    pub fn style_class(&self) -> &str {
        &self.rule.style_class
    }

    /// The compiled pattern, `None` for invalid rules
    pub fn regex(&self) -> Option<&Regex> {
        self.compiled.as_ref().ok().map(|c| &c.regex)
    }

    pub fn is_valid(&self) -> bool {
        self.compiled.is_ok()
    }

    pub fn error(&self) -> Option<&ConfigError> {
        self.compiled.as_ref().err()
    }

    /// Whether no match of this rule can span a line break
    pub fn is_line_local(&self) -> bool {
        self.compiled.as_ref().map(|c| c.line_local).unwrap_or(false)
    }
}

fn compile_parts(rule: &Rule) -> Result<Compiled, ConfigError> {
    let translated = translate(&rule.pattern);
    let regex = Regex::new(&translated.matcher).map_err(|e| ConfigError::InvalidPattern {
        pattern: rule.pattern.clone(),
        message: e.to_string(),
    })?;
    validate_template(&rule.link, regex.captures_len()).map_err(|source| {
        ConfigError::Template {
            template: rule.link.clone(),
            source,
        }
    })?;
    Ok(Compiled {
        line_local: is_line_local(&translated.analysis),
        regex,
    })
}

/// A configuration problem found on one rule of a set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDiagnostic {
    pub index: usize,
    pub pattern: String,
    pub message: String,
}

// =============================================================================
// RuleSet
// =============================================================================

/// Ordered rules currently in effect. Earlier rules take precedence.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Rc<[CompiledRule]>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleSet {
    pub fn new() -> Self {
        Self {
            rules: Rc::from(Vec::new()),
        }
    }

    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            rules: rules.into_iter().map(CompiledRule::compile).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CompiledRule> {
        self.rules.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompiledRule> {
        self.rules.iter()
    }

    /// Immutable view of the rules as they are now
    pub fn snapshot(&self) -> Rc<[CompiledRule]> {
        Rc::clone(&self.rules)
    }

    /// Plain rule records, in order
    pub fn rules(&self) -> Vec<Rule> {
        self.rules.iter().map(|r| r.rule.clone()).collect()
    }

    /// Every rule that failed to compile, with the reason
    pub fn diagnostics(&self) -> Vec<RuleDiagnostic> {
        self.rules
            .iter()
            .enumerate()
            .filter_map(|(index, rule)| {
                rule.error().map(|err| RuleDiagnostic {
                    index,
                    pattern: rule.pattern().to_string(),
                    message: err.to_string(),
                })
            })
            .collect()
    }

    pub fn push(&mut self, rule: Rule) -> RuleId {
        let compiled = CompiledRule::compile(rule);
        let id = compiled.id();
        self.edit(|rules| rules.push(compiled));
        id
    }

    pub fn insert(&mut self, index: usize, rule: Rule) -> Result<RuleId, ConfigError> {
        self.check_index(index, self.len() + 1)?;
        let compiled = CompiledRule::compile(rule);
        let id = compiled.id();
        self.edit(|rules| rules.insert(index, compiled));
        Ok(id)
    }

    pub fn remove(&mut self, index: usize) -> Result<Rule, ConfigError> {
        self.check_index(index, self.len())?;
        let mut removed = None;
        self.edit(|rules| removed = Some(rules.remove(index)));
        removed
            .map(|r| r.rule)
            .ok_or(ConfigError::IndexOutOfRange { index, len: self.len() })
    }

    /// Replace a rule's definition. The replacement gets a new [`RuleId`].
    pub fn replace(&mut self, index: usize, rule: Rule) -> Result<RuleId, ConfigError> {
        self.check_index(index, self.len())?;
        let compiled = CompiledRule::compile(rule);
        let id = compiled.id();
        self.edit(|rules| rules[index] = compiled);
        Ok(id)
    }

    /// Move a rule to a new position, shifting the rules in between.
    pub fn move_rule(&mut self, from: usize, to: usize) -> Result<(), ConfigError> {
        self.check_index(from, self.len())?;
        self.check_index(to, self.len())?;
        if from != to {
            self.edit(|rules| {
                let rule = rules.remove(from);
                rules.insert(to, rule);
            });
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.rules = Rc::from(Vec::new());
    }

    /// Swap in a whole new list of rules
    pub fn set_rules(&mut self, rules: impl IntoIterator<Item = Rule>) {
        *self = Self::from_rules(rules);
    }

    fn check_index(&self, index: usize, bound: usize) -> Result<(), ConfigError> {
        if index < bound {
            Ok(())
        } else {
            Err(ConfigError::IndexOutOfRange { index, len: self.len() })
        }
    }

    fn edit(&mut self, f: impl FnOnce(&mut Vec<CompiledRule>)) {
        let mut rules = self.rules.to_vec();
        f(&mut rules);
        self.rules = rules.into();
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a CompiledRule;
    type IntoIter = std::slice::Iter<'a, CompiledRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RuleSet {
        RuleSet::from_rules([
            Rule::new(r"g/([a-zA-Z.-]*)", "http://google.com/search?q=$1", ""),
            Rule::new(r"@(\w+)", "https://twitter.com/$1", "handle"),
        ])
    }

    #[test]
    fn test_compile_valid_rule() {
        let rule = CompiledRule::compile(Rule::new(r"a(b)", "x$1", "cls"));
        assert!(rule.is_valid());
        assert!(rule.regex().is_some());
        assert!(rule.is_line_local());
        assert_eq!(rule.style_class(), "cls");
    }

    #[test]
    fn test_javascript_only_syntax_compiles() {
        // Character class with a literal '-' after `\d`, escaped '/'
        let rule = CompiledRule::compile(Rule::new(r"\w+\/[\w\d-#]+", "http://$0", ""));
        assert!(rule.is_valid(), "{:?}", rule.error());
        assert!(rule.is_line_local());

        for pattern in [r"#(\w+)(?=\s)", r"(?<=@)\w+", r"(a)\1"] {
            let rule = CompiledRule::compile(Rule::new(pattern, "x", ""));
            assert!(rule.is_valid(), "{pattern}: {:?}", rule.error());
            assert!(!rule.is_line_local());
        }
    }

    #[test]
    fn test_word_boundary_rule_stays_line_local() {
        let rule = CompiledRule::compile(Rule::new(r"\bcat\b", "x", ""));
        assert!(rule.is_valid());
        assert!(rule.is_line_local());
    }

    #[test]
    fn test_invalid_pattern_is_kept_but_marked() {
        let rule = CompiledRule::compile(Rule::new(r"(unclosed", "x", ""));
        assert!(!rule.is_valid());
        assert!(rule.regex().is_none());
        assert!(matches!(rule.error(), Some(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_out_of_range_template_invalidates_rule() {
        let rule = CompiledRule::compile(Rule::new(r"abc", "http://$1", ""));
        assert!(!rule.is_valid());
        assert!(matches!(rule.error(), Some(ConfigError::Template { .. })));
    }

    #[test]
    fn test_diagnostics_report_index() {
        let mut rules = sample();
        rules.push(Rule::new(r"[", "x", ""));
        let diags = rules.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].index, 2);
        assert_eq!(diags[0].pattern, "[");
    }

    #[test]
    fn test_replace_issues_new_id() {
        let mut rules = sample();
        let before = rules.get(0).unwrap().id();
        let after = rules.replace(0, Rule::new("z", "y", "")).unwrap();
        assert_ne!(before, after);
        assert_eq!(rules.get(0).unwrap().pattern(), "z");
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_insert_remove_and_move() {
        let mut rules = sample();
        rules.insert(0, Rule::new("first", "1", "")).unwrap();
        assert_eq!(rules.get(0).unwrap().pattern(), "first");

        rules.move_rule(0, 2).unwrap();
        let patterns: Vec<_> = rules.iter().map(|r| r.pattern().to_string()).collect();
        assert_eq!(patterns, vec![r"g/([a-zA-Z.-]*)", r"@(\w+)", "first"]);

        let removed = rules.remove(1).unwrap();
        assert_eq!(removed.pattern, r"@(\w+)");
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_index_out_of_range() {
        let mut rules = sample();
        assert_eq!(
            rules.remove(5),
            Err(ConfigError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert!(rules.move_rule(0, 2).is_err());
        assert!(rules.insert(3, Rule::new("a", "b", "")).is_err());
        assert!(rules.insert(2, Rule::new("a", "b", "")).is_ok());
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_edits() {
        let mut rules = sample();
        let snapshot = rules.snapshot();
        rules.clear();
        rules.push(Rule::new("new", "n", ""));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].pattern(), r"g/([a-zA-Z.-]*)");
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_rule_json_field_names() {
        let rule = Rule::new("a", "b", "c");
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json, serde_json::json!({"regexp": "a", "link": "b", "cssclass": "c"}));
    }
}
