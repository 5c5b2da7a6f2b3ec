//! Link template expansion
//!
//! Templates are literal text with `$N` back-references. `$0` is the whole
//! match, `$1`.. are capture groups. A `$` not followed by a digit is literal.
//! Multi-digit references are read greedily but fall back to the longest
//! prefix naming an existing group, so with two groups `$10` is group 1
//! followed by a literal `0`.

use crate::error::TemplateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'a> {
    Literal(&'a str),
    Group(usize),
}

/// Split a template into literal runs and group references.
///
/// `group_count` includes group 0.
fn parse(template: &str, group_count: usize) -> Result<Vec<Piece<'_>>, TemplateError> {
    let bytes = template.as_bytes();
    let mut pieces = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }

        let digits_start = i + 1;
        let digits_len = bytes[digits_start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits_len == 0 {
            i += 1;
            continue;
        }

        let digits = &template[digits_start..digits_start + digits_len];
        let resolved = (1..=digits_len).rev().find_map(|len| {
            digits[..len]
                .parse::<usize>()
                .ok()
                .filter(|&group| group < group_count)
                .map(|group| (group, len))
        });

        let Some((group, used)) = resolved else {
            return Err(TemplateError::GroupOutOfRange {
                group: digits.parse().unwrap_or(usize::MAX),
                available: group_count.saturating_sub(1),
            });
        };

        if literal_start < i {
            pieces.push(Piece::Literal(&template[literal_start..i]));
        }
        pieces.push(Piece::Group(group));
        i = digits_start + used;
        literal_start = i;
    }

    if literal_start < bytes.len() {
        pieces.push(Piece::Literal(&template[literal_start..]));
    }
    Ok(pieces)
}

/// Check that every back-reference in `template` names a group of a pattern
/// with `group_count` groups (group 0 included, as in `Regex::captures_len`).
pub fn validate_template(template: &str, group_count: usize) -> Result<(), TemplateError> {
    parse(template, group_count).map(|_| ())
}

/// Expand `template` against captured `groups` (index 0 is the whole match).
///
/// Unmatched optional groups expand to the empty string.
pub fn expand_template<S: AsRef<str>>(
    groups: &[Option<S>],
    template: &str,
) -> Result<String, TemplateError> {
    let pieces = parse(template, groups.len())?;
    let mut out = String::with_capacity(template.len());
    for piece in pieces {
        match piece {
            Piece::Literal(text) => out.push_str(text),
            Piece::Group(index) => {
                if let Some(Some(value)) = groups.get(index) {
                    out.push_str(value.as_ref());
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_expand_search_template() {
        let g = groups(&[Some("g/foo"), Some("foo")]);
        let link = expand_template(&g, "http://google.com/search?q=$1").unwrap();
        assert_eq!(link, "http://google.com/search?q=foo");
    }

    #[test]
    fn test_group_zero_is_whole_match() {
        let g = groups(&[Some("example.com/page")]);
        assert_eq!(expand_template(&g, "http://$0").unwrap(), "http://example.com/page");
    }

    #[test]
    fn test_multiple_references_and_repeats() {
        let g = groups(&[Some("a-b"), Some("a"), Some("b")]);
        assert_eq!(expand_template(&g, "$2/$1/$2").unwrap(), "b/a/b");
    }

    #[test]
    fn test_unmatched_optional_group_is_empty() {
        let g = groups(&[Some("x"), None]);
        assert_eq!(expand_template(&g, "[$1]").unwrap(), "[]");
    }

    #[test]
    fn test_out_of_range_reference_is_error() {
        let g = groups(&[Some("x"), Some("y")]);
        let err = expand_template(&g, "http://$2").unwrap_err();
        assert_eq!(err, TemplateError::GroupOutOfRange { group: 2, available: 1 });
    }

    #[test]
    fn test_multi_digit_falls_back_to_existing_group() {
        let g = groups(&[Some("x"), Some("y")]);
        assert_eq!(expand_template(&g, "$10").unwrap(), "y0");

        let many: Vec<Option<String>> = (0..12).map(|i| Some(format!("g{}", i))).collect();
        assert_eq!(expand_template(&many, "$11").unwrap(), "g11");
    }

    #[test]
    fn test_dollar_without_digit_is_literal() {
        let g = groups(&[Some("x")]);
        assert_eq!(expand_template(&g, "cost $ and $x$").unwrap(), "cost $ and $x$");
    }

    #[test]
    fn test_literal_template_passes_through() {
        let g = groups(&[Some("x")]);
        assert_eq!(expand_template(&g, "https://exämple.org/").unwrap(), "https://exämple.org/");
    }

    #[test]
    fn test_validate_template_against_group_count() {
        assert!(validate_template("$0 $1", 2).is_ok());
        assert!(validate_template("plain", 1).is_ok());
        assert_eq!(
            validate_template("$1", 1),
            Err(TemplateError::GroupOutOfRange { group: 1, available: 0 })
        );
    }
}
