//! JavaScript regex dialect
//!
//! Rule patterns are written for the host's JavaScript regex syntax. They
//! are compiled with `fancy-regex`, which already covers look-around and
//! back-references. [`translate`] rewrites the remaining constructs whose
//! meaning differs:
//!
//! - `\w`, `\W`, `\d`, `\D` are ASCII-only
//! - `\b`, `\B` are ASCII word boundaries
//! - inside `[...]`: `-` next to a class escape is literal, `\b` is a
//!   backspace, `[`, `&` and `~` are literal
//! - `[^]` matches any character
//! - `\/` is a plain slash
//!
//! Anything else passes through untouched. Validation is left to the regex
//! compiler.

const WORD: &str = "0-9A-Za-z_";
const DIGIT: &str = "0-9";

const ASCII_BOUNDARY: &str = "(?:(?<=[0-9A-Za-z_])(?![0-9A-Za-z_])|(?<![0-9A-Za-z_])(?=[0-9A-Za-z_]))";
const ASCII_NON_BOUNDARY: &str = "(?:(?<=[0-9A-Za-z_])(?=[0-9A-Za-z_])|(?<![0-9A-Za-z_])(?![0-9A-Za-z_]))";

/// A pattern rewritten for this crate's regex engines
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Translated {
    /// Source for `fancy_regex::Regex`
    pub matcher: String,
    /// Same pattern with word boundaries kept as `\b`/`\B`, so that
    /// `regex-syntax` can analyse what the pattern consumes
    pub analysis: String,
}

impl Translated {
    fn push(&mut self, s: &str) {
        self.matcher.push_str(s);
        self.analysis.push_str(s);
    }

    fn push_char(&mut self, ch: char) {
        self.matcher.push(ch);
        self.analysis.push(ch);
    }

    fn push_escaped(&mut self, ch: char) {
        self.push_char('\\');
        self.push_char(ch);
    }
}

fn is_class_escape(ch: char) -> bool {
    matches!(ch, 'w' | 'W' | 'd' | 'D' | 's' | 'S')
}

/// Rewrite a JavaScript pattern into fancy-regex syntax.
pub fn translate(pattern: &str) -> Translated {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = Translated::default();
    let mut in_class = false;
    // Inside a class: the previous item was a class escape like `\d`
    let mut after_class_escape = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        i += 1;

        if ch == '\\' {
            let Some(&next) = chars.get(i) else {
                out.push_char('\\');
                break;
            };
            i += 1;

            if in_class {
                after_class_escape = is_class_escape(next);
                match next {
                    'w' => out.push(WORD),
                    'd' => out.push(DIGIT),
                    'b' => out.push(r"\x08"),
                    '/' => out.push_char('/'),
                    _ => out.push_escaped(next),
                }
            } else {
                match next {
                    'w' => out.push("[0-9A-Za-z_]"),
                    'W' => out.push("[^0-9A-Za-z_]"),
                    'd' => out.push("[0-9]"),
                    'D' => out.push("[^0-9]"),
                    'b' => {
                        out.matcher.push_str(ASCII_BOUNDARY);
                        out.analysis.push_str(r"\b");
                    }
                    'B' => {
                        out.matcher.push_str(ASCII_NON_BOUNDARY);
                        out.analysis.push_str(r"\B");
                    }
                    '/' => out.push_char('/'),
                    _ => out.push_escaped(next),
                }
            }
            continue;
        }

        if !in_class {
            if ch == '[' {
                if chars.get(i) == Some(&'^') && chars.get(i + 1) == Some(&']') {
                    out.push(r"[\s\S]");
                    i += 2;
                    continue;
                }
                in_class = true;
                after_class_escape = false;
                out.push_char('[');
                if chars.get(i) == Some(&'^') {
                    out.push_char('^');
                    i += 1;
                }
            } else {
                out.push_char(ch);
            }
            continue;
        }

        match ch {
            ']' => {
                in_class = false;
                out.push_char(']');
            }
            '-' => {
                let next_is_class_escape = chars.get(i) == Some(&'\\')
                    && chars.get(i + 1).copied().is_some_and(is_class_escape);
                if after_class_escape || next_is_class_escape {
                    out.push(r"\-");
                } else {
                    out.push_char('-');
                }
            }
            '[' | '&' | '~' => out.push_escaped(ch),
            _ => out.push_char(ch),
        }
        after_class_escape = false;
    }

    out
}
