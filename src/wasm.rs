//! JavaScript bindings
//!
//! All offsets crossing this boundary are UTF-16 code units, as JavaScript
//! strings count them. Structured results are plain objects produced with
//! `serde-wasm-bindgen`; errors are thrown as `Error` instances.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::engine::{link_at, LinkTarget, Segment};
use crate::live::{DecorationEngine, Edit, EngineStats};
use crate::offsets::Utf16Map;
use crate::rules::{Rule, RuleSet, Settings};

fn js_error(err: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

// =============================================================================
// RuleLinker
// =============================================================================

/// Rule set plus the static operations over it (segment, activate)
#[wasm_bindgen]
pub struct RuleLinker {
    rules: RuleSet,
}

#[wasm_bindgen]
impl RuleLinker {
    /// Create from persisted settings JSON; defaults when absent
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: Option<String>) -> Result<RuleLinker, JsValue> {
        let settings = match settings_json {
            Some(json) => Settings::load(&json).map_err(js_error)?,
            None => Settings::default(),
        };
        Ok(RuleLinker {
            rules: RuleSet::from(settings),
        })
    }

    /// Replace all rules with an imported batch (object or bare array)
    #[wasm_bindgen(js_name = importRules)]
    pub fn import_rules(&mut self, json: &str) -> Result<usize, JsValue> {
        self.rules.import(json).map_err(js_error)
    }

    #[wasm_bindgen(js_name = exportRules)]
    pub fn export_rules(&self) -> Result<String, JsValue> {
        self.rules.export_json().map_err(js_error)
    }

    #[wasm_bindgen(js_name = addRule)]
    pub fn add_rule(&mut self, regexp: &str, link: &str, cssclass: Option<String>) {
        self.rules
            .push(Rule::new(regexp, link, cssclass.unwrap_or_default()));
    }

    #[wasm_bindgen(js_name = removeRule)]
    pub fn remove_rule(&mut self, index: usize) -> Result<(), JsValue> {
        self.rules.remove(index).map(|_| ()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = replaceRule)]
    pub fn replace_rule(
        &mut self,
        index: usize,
        regexp: &str,
        link: &str,
        cssclass: Option<String>,
    ) -> Result<(), JsValue> {
        self.rules
            .replace(index, Rule::new(regexp, link, cssclass.unwrap_or_default()))
            .map(|_| ())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = moveRule)]
    pub fn move_rule(&mut self, from: usize, to: usize) -> Result<(), JsValue> {
        self.rules.move_rule(from, to).map_err(js_error)
    }

    #[wasm_bindgen(js_name = ruleCount)]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// `[{ index, pattern, message }]` for every rule that failed to compile
    #[wasm_bindgen]
    pub fn diagnostics(&self) -> Result<JsValue, JsValue> {
        to_js(&self.rules.diagnostics())
    }

    /// `[{ kind: "plain", text } | { kind: "link", text, target, cssclass }]`
    #[wasm_bindgen]
    pub fn segment(&self, text: &str) -> Result<JsValue, JsValue> {
        let segments: Vec<Segment> = self.rules.segment(text);
        to_js(&segments)
    }

    /// `{ kind: "internal", name } | { kind: "external", url }`, or `null`
    #[wasm_bindgen]
    pub fn activate(&self, text: &str, offset: usize) -> Result<JsValue, JsValue> {
        let map = Utf16Map::new(text);
        match self.rules.activate(text, map.to_byte(offset)) {
            Some(target) => to_js(&target),
            None => Ok(JsValue::NULL),
        }
    }

    /// Like `activate`, with the link's UTF-16 span and raw target
    #[wasm_bindgen(js_name = linkAt)]
    pub fn link_at(&self, text: &str, offset: usize) -> Result<JsValue, JsValue> {
        let map = Utf16Map::new(text);
        let Some(link) = link_at(&self.rules.snapshot(), text, map.to_byte(offset)) else {
            return Ok(JsValue::NULL);
        };
        to_js(&LinkView {
            from: map.to_utf16(link.start),
            to: map.to_utf16(link.end),
            text: link.text,
            target: link.link_target,
        })
    }
}

#[derive(Serialize)]
struct LinkView {
    from: usize,
    to: usize,
    text: String,
    target: LinkTarget,
}

// =============================================================================
// LiveDecorations
// =============================================================================

/// One change of an editor transaction, in old-document UTF-16 offsets
#[derive(Deserialize)]
struct ChangeSpec {
    from: usize,
    to: usize,
    #[serde(default)]
    insert: String,
}

#[derive(Serialize)]
struct DecorationView<'a> {
    from: usize,
    to: usize,
    cssclass: &'a str,
}

/// Live decorations for one open document
#[wasm_bindgen]
pub struct LiveDecorations {
    engine: DecorationEngine,
    text: String,
    /// Offset table for `text`, rebuilt only when the text changes
    map: Utf16Map,
}

#[wasm_bindgen]
impl LiveDecorations {
    #[wasm_bindgen(constructor)]
    pub fn new(linker: &RuleLinker, text: &str) -> LiveDecorations {
        LiveDecorations {
            engine: DecorationEngine::new(&linker.rules, text),
            text: text.to_string(),
            map: Utf16Map::new(text),
        }
    }

    /// Apply a transaction: `changes` is `[{ from, to, insert }]` in the old
    /// document's UTF-16 offsets, `new_text` the document afterwards.
    #[wasm_bindgen(js_name = applyChanges)]
    pub fn apply_changes(&mut self, changes: JsValue, new_text: &str) -> Result<(), JsValue> {
        let changes: Vec<ChangeSpec> = serde_wasm_bindgen::from_value(changes).map_err(js_error)?;
        let edits: Vec<Edit> = changes
            .iter()
            .map(|c| Edit::new(self.map.to_byte(c.from), self.map.to_byte(c.to), c.insert.len()))
            .collect();

        self.engine.apply_edits(&edits, new_text);
        self.text = new_text.to_string();
        self.map = Utf16Map::new(new_text);
        Ok(())
    }

    /// Follow rule edits made on `linker`
    #[wasm_bindgen(js_name = syncRules)]
    pub fn sync_rules(&mut self, linker: &RuleLinker) {
        self.engine.sync_rules(&linker.rules, &self.text);
    }

    /// `[{ from, to, cssclass }]` sorted by position, UTF-16 offsets
    #[wasm_bindgen]
    pub fn decorations(&self) -> Result<JsValue, JsValue> {
        let map = &self.map;
        let all = self.engine.all_decorations();
        let views: Vec<DecorationView<'_>> = all
            .iter()
            .map(|d| DecorationView {
                from: map.to_utf16(d.start),
                to: map.to_utf16(d.end),
                cssclass: &d.style_class,
            })
            .collect();
        to_js(&views)
    }

    #[wasm_bindgen]
    pub fn stats(&self) -> Result<JsValue, JsValue> {
        let stats: EngineStats = self.engine.stats();
        to_js(&stats)
    }
}
