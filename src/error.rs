//! Error types shared by the rule model, template expansion and config import.

use thiserror::Error;

/// Errors raised while expanding a link template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template references ${group} but the pattern only has {available} capture group(s)")]
    GroupOutOfRange { group: usize, available: usize },
}

/// Configuration errors: bad patterns, bad templates, malformed rule data.
///
/// None of these are fatal to matching. A rule that fails to compile is kept
/// in its set and skipped; an import that fails validation is rejected whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid link template `{template}`: {source}")]
    Template {
        template: String,
        source: TemplateError,
    },

    #[error("malformed JSON: {0}")]
    Json(String),

    #[error("expected an object with a `rules` array, or a bare array of rules")]
    NotAnObjectOrArray,

    #[error("rule {index}: expected an object")]
    RuleNotAnObject { index: usize },

    #[error("rule {index}: missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("rule {index}: field `{field}` must be a string")]
    WrongType { index: usize, field: &'static str },

    #[error("rule index {index} is out of range (rule set has {len} rules)")]
    IndexOutOfRange { index: usize, len: usize },
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err.to_string())
    }
}
