//! RuleLink: Regex rule -> hyperlink annotation engine
//!
//! A Rust/WASM implementation of the note editor's auto-link pipeline. An
//! ordered list of `{ regexp, link, cssclass }` rules turns matching text into
//! links, identically for rendered notes and for the live editor.
//!
//! # Architecture
//!
//! ## Rules
//! - `rules/model.rs` - Rule, CompiledRule, RuleSet (ordered, copy-on-write snapshots)
//! - `rules/config.rs` - Settings load, defaults, all-or-nothing import, export
//! - `rules/dialect.rs` - JavaScript regex syntax -> fancy-regex syntax
//! - `rules/locality.rs` - Decides whether a pattern can ever match a line break
//!
//! ## Engine (static rendering + activation)
//! - `engine/matcher.rs` - First rule in order wins, leftmost match within it
//! - `engine/template.rs` - `$N` back-reference expansion
//! - `engine/segment.rs` - Text -> alternating plain/link segments
//! - `engine/activate.rs` - Offset -> `LinkTarget::{Internal, External}`
//!
//! ## Live (editor decorations)
//! - `live/edit.rs` - Edit records and offset shifting
//! - `live/decorations.rs` - Per-rule DecorationSets with line-window rescans
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { RuleLinker, LiveDecorations } from 'rulelink';
//!
//! await init();
//!
//! const linker = new RuleLinker(savedSettingsJson);
//! linker.segment("see g/cats for info");
//! // [{kind:"plain",text:"see "},
//! //  {kind:"link",text:"g/cats",target:"http://google.com/search?q=cats",cssclass:""},
//! //  {kind:"plain",text:" for info"}]
//!
//! const live = new LiveDecorations(linker, doc);
//! live.applyChanges([{ from: 4, to: 4, insert: "g/" }], newDoc);
//! live.decorations(); // [{ from, to, cssclass }]
//!
//! linker.activate(doc, offset); // {kind:"external",url} | {kind:"internal",name} | null
//! ```

pub mod console;
pub mod engine;
pub mod error;
pub mod live;
pub mod offsets;
pub mod rules;
pub mod wasm;

// Public exports
pub use engine::*;
pub use error::*;
pub use live::*;
pub use offsets::*;
pub use rules::*;
pub use wasm::*;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    console::init(log::LevelFilter::Warn);
}

/// Set the console log level ("off", "error", "warn", "info", "debug", "trace")
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) {
    console::init(console::parse_level(level));
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("rulelink v{}", env!("CARGO_PKG_VERSION"))
}
