//! Markup stripping for submitted form payloads.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref SCRIPT_BLOCK: Regex = Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap();
    static ref STYLE_BLOCK: Regex = Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap();
    static ref COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref TAG: Regex = Regex::new(r"(?s)</?[A-Za-z!][^>]*>").unwrap();
}

/// Remove every tag (and its attributes) from `input`. Script and style
/// elements lose their content too. The result is trimmed.
pub fn strip_html(input: &str) -> String {
    let without_blocks = SCRIPT_BLOCK.replace_all(input, "");
    let without_blocks = STYLE_BLOCK.replace_all(&without_blocks, "");
    let without_comments = COMMENT.replace_all(&without_blocks, "");
    TAG.replace_all(&without_comments, "").trim().to_string()
}

/// Apply `strip_html` to every string in the value, descending into
/// objects and arrays.
pub fn sanitize_value(value: &mut Value) {
    match value {
        Value::String(s) => *s = strip_html(s),
        Value::Array(items) => items.iter_mut().for_each(sanitize_value),
        Value::Object(map) => map.values_mut().for_each(sanitize_value),
        _ => {}
    }
}
