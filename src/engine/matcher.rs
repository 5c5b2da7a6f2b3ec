//! Rule Matcher - picks the single rule/match to apply to a string
//!
//! Precedence is rule order, not string position: the first rule (in order)
//! that matches anywhere wins, even when a later rule matches earlier in the
//! string. Within that rule the leftmost match is taken.

use fancy_regex::Captures;
use serde::Serialize;

use super::template::expand_template;
use crate::error::TemplateError;
use crate::rules::{CompiledRule, RuleId, RuleSet};

/// One located, rule-attributed occurrence of a pattern.
///
/// Offsets are byte offsets into the text the matcher was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub rule_index: usize,
    pub rule_id: RuleId,
    pub start: usize,
    pub end: usize,
    pub matched_text: String,
    /// Captured groups, index 0 is the whole match
    pub groups: Vec<Option<String>>,
    /// The rule's link template expanded against `groups`
    pub link: String,
    pub style_class: String,
}

impl Match {
    fn from_captures(
        rule_index: usize,
        rule: &CompiledRule,
        caps: &Captures<'_>,
    ) -> Result<Self, TemplateError> {
        let whole = caps.get(0).map(|m| (m.start(), m.end(), m.as_str()));
        let (start, end, matched) = whole.unwrap_or((0, 0, ""));
        let groups: Vec<Option<String>> = caps
            .iter()
            .map(|g| g.map(|m| m.as_str().to_string()))
            .collect();
        let link = expand_template(&groups, rule.link())?;

        Ok(Self {
            rule_index,
            rule_id: rule.id(),
            start,
            end,
            matched_text: matched.to_string(),
            groups,
            link,
            style_class: rule.style_class().to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Expand another template against this match's groups
    pub fn expand(&self, template: &str) -> Result<String, TemplateError> {
        expand_template(&self.groups, template)
    }
}

/// Find the match to apply to `text`, honouring rule-order precedence.
///
/// Invalid rules are skipped, as is a rule whose search fails at run time
/// (backtracking limit). `None` means no rule matches anywhere.
pub fn match_rule(rules: &[CompiledRule], text: &str) -> Option<Match> {
    rules.iter().enumerate().find_map(|(rule_index, rule)| {
        let caps = match rule.regex()?.captures(text) {
            Ok(caps) => caps?,
            Err(err) => {
                log::warn!("rule /{}/ gave up matching: {}", rule.pattern(), err);
                return None;
            }
        };
        match Match::from_captures(rule_index, rule, &caps) {
            Ok(m) => Some(m),
            Err(err) => {
                log::warn!("rule /{}/ skipped: {}", rule.pattern(), err);
                None
            }
        }
    })
}

impl RuleSet {
    /// [`match_rule`] over a snapshot of this set
    pub fn match_text(&self, text: &str) -> Option<Match> {
        match_rule(&self.snapshot(), text)
    }
}
