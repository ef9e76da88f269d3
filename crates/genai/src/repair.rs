//! Tolerant JSON recovery for probabilistic backend replies.
//!
//! Replies are supposed to be strict JSON, but in practice arrive
//! wrapped in markdown fences, with unquoted keys, single quotes, or
//! trailing commas. `parse_lenient` applies an ordered list of
//! recovery transforms before giving up; each transform is a named
//! function so it can be tested on its own.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_bare_key, r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*:)"#);
re!(re_trailing_comma, r",(\s*[}\]])");

#[derive(Debug, Error)]
pub enum RepairError {
    #[error("response is empty after cleanup")]
    Empty,
    #[error("no JSON object found in response")]
    NoObject,
    #[error("response is not valid JSON even after repair: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parse backend output as JSON, falling back through the repair
/// transforms when strict parsing fails.
pub fn parse_lenient(text: &str) -> Result<Value, RepairError> {
    let cleaned = strip_fences(text);
    if cleaned.is_empty() {
        return Err(RepairError::Empty);
    }

    // Most replies are already well-formed; try before repairing.
    if let Ok(value) = serde_json::from_str(&cleaned) {
        return Ok(value);
    }

    let span = extract_object(&cleaned).ok_or(RepairError::NoObject)?;
    let repaired = strip_trailing_commas(&normalize_quotes(&quote_bare_keys(span)));
    Ok(serde_json::from_str(&repaired)?)
}

/// Remove markdown code fences and zero-width characters.
pub fn strip_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```", "")
        .chars()
        .filter(|c| !matches!(c, '\u{200b}'..='\u{200d}' | '\u{feff}'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Slice from the first `{` to the last `}`, dropping any prose the
/// model wrapped around the payload.
pub fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end >= start).then(|| &text[start..=end])
}

/// Quote bare object keys: `{amounts: ...}` → `{"amounts": ...}`.
pub fn quote_bare_keys(text: &str) -> String {
    re_bare_key().replace_all(text, "$1\"$2\"$3").into_owned()
}

/// Replace single quotes with double quotes.
pub fn normalize_quotes(text: &str) -> String {
    text.replace('\'', "\"")
}

/// Drop commas that directly precede a closing brace or bracket.
pub fn strip_trailing_commas(text: &str) -> String {
    re_trailing_comma().replace_all(text, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_json_passes_through() {
        let value = parse_lenient(r#"{"amounts": [1.0, 2.0]}"#).unwrap();
        assert_eq!(value["amounts"][1], 2.0);
    }

    #[test]
    fn strips_markdown_fences() {
        assert_eq!(strip_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        let value = parse_lenient("```json\n{\"a\": 1}\n```").unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn strips_zero_width_characters() {
        assert_eq!(strip_fences("\u{feff}{\"a\":1}\u{200b}"), "{\"a\":1}");
    }

    #[test]
    fn extracts_object_from_surrounding_prose() {
        let text = "Here is the result:\n{\"a\": 1}\nHope that helps!";
        assert_eq!(extract_object(text), Some("{\"a\": 1}"));
        assert_eq!(parse_lenient(text).unwrap()["a"], 1);
    }

    #[test]
    fn quotes_bare_keys() {
        assert_eq!(
            quote_bare_keys(r#"{amounts: [], confidence: 0.9}"#),
            r#"{"amounts": [], "confidence": 0.9}"#
        );
    }

    #[test]
    fn normalizes_single_quotes() {
        assert_eq!(normalize_quotes("{'a': 'b'}"), r#"{"a": "b"}"#);
    }

    #[test]
    fn drops_trailing_commas() {
        assert_eq!(strip_trailing_commas(r#"{"a": [1, 2,],}"#), r#"{"a": [1, 2]}"#);
    }

    #[test]
    fn repairs_combined_sloppiness() {
        let value = parse_lenient("```\n{amounts: [{'type': 'total', 'value': 9.0},],}\n```").unwrap();
        assert_eq!(value["amounts"][0]["value"], 9.0);
    }

    #[test]
    fn empty_reply_is_an_error() {
        assert!(matches!(parse_lenient("```json\n```"), Err(RepairError::Empty)));
    }

    #[test]
    fn prose_without_object_is_an_error() {
        assert!(matches!(
            parse_lenient("I could not find any amounts."),
            Err(RepairError::NoObject)
        ));
    }
}
