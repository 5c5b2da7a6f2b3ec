//! Persisted settings and rule import/export
//!
//! Settings are a versionless JSON object:
//! `{ "rules": [ { "regexp": "...", "link": "...", "cssclass": "..." } ] }`.
//! Import also accepts a bare array of rule objects. Every element is checked
//! before anything is committed, and the first structural violation is
//! reported with its index.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::{Rule, RuleSet};
use crate::error::ConfigError;

/// Rules shipped with a fresh install
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new(r"g/([a-zA-Z.-]*)", "http://google.com/search?q=$1", ""),
        Rule::new(r"@([a-zA-Z0-9_]+)", "https://twitter.com/$1", ""),
    ]
}

/// Persisted plugin settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_rules")]
    pub rules: Vec<Rule>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl Settings {
    /// Load persisted settings, falling back to defaults for missing keys.
    ///
    /// An empty or `null` document yields the defaults.
    pub fn load(json: &str) -> Result<Self, ConfigError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        match serde_json::from_str::<Value>(json)? {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => match map.get("rules") {
                None => Ok(Self::default()),
                Some(Value::Array(items)) => Ok(Self {
                    rules: parse_rule_list(items)?,
                }),
                Some(_) => Err(ConfigError::NotAnObjectOrArray),
            },
            _ => Err(ConfigError::NotAnObjectOrArray),
        }
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse rules for import: a settings object or a bare array.
pub fn parse_import(json: &str) -> Result<Vec<Rule>, ConfigError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => parse_rule_list(&items),
        Value::Object(map) => match map.get("rules") {
            Some(Value::Array(items)) => parse_rule_list(items),
            _ => Err(ConfigError::NotAnObjectOrArray),
        },
        _ => Err(ConfigError::NotAnObjectOrArray),
    }
}

fn parse_rule_list(items: &[Value]) -> Result<Vec<Rule>, ConfigError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => parse_rule(index, fields),
            _ => Err(ConfigError::RuleNotAnObject { index }),
        })
        .collect()
}

fn parse_rule(index: usize, fields: &Map<String, Value>) -> Result<Rule, ConfigError> {
    let pattern = required_string(index, fields, "regexp")?;
    let link = required_string(index, fields, "link")?;
    let style_class = match fields.get("cssclass") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(ConfigError::WrongType {
                index,
                field: "cssclass",
            })
        }
    };
    Ok(Rule {
        pattern,
        link,
        style_class,
    })
}

fn required_string(
    index: usize,
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ConfigError> {
    match fields.get(field) {
        None => Err(ConfigError::MissingField { index, field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ConfigError::WrongType { index, field }),
    }
}

impl RuleSet {
    /// Replace the rules with an imported batch.
    ///
    /// All-or-nothing: on error the current rules are left untouched.
    /// Returns the number of rules imported.
    pub fn import(&mut self, json: &str) -> Result<usize, ConfigError> {
        let rules = parse_import(json)?;
        let count = rules.len();
        self.set_rules(rules);
        log::debug!("imported {} rules", count);
        Ok(count)
    }

    /// Serialize the current rules in the settings shape
    pub fn export_json(&self) -> Result<String, ConfigError> {
        self.to_settings().to_json()
    }

    pub fn to_settings(&self) -> Settings {
        Settings {
            rules: self.rules(),
        }
    }
}

impl From<Settings> for RuleSet {
    fn from(settings: Settings) -> Self {
        RuleSet::from_rules(settings.rules)
    }
}
