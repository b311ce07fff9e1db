//! `{{NAME}}` placeholder detection and substitution.
//!
//! A well-formed placeholder is two opening braces, a name of one or more
//! ASCII letters, digits, or underscores, and two closing braces. It must not
//! be directly preceded by `{` or directly followed by `}`, so `{{{A}}}` is
//! not a placeholder. Anything that is not well-formed (empty names, spaces
//! inside the braces, unmatched braces) is ordinary text: it is never
//! reported and never rewritten.
//!
//! The value-level functions walk a [`serde_json::Value`] tree and only look
//! at string leaves. Object keys and non-string scalars pass through as-is.
//!
//! # Example
//!
//! ```
//! use lodestar_mcp::template;
//! use serde_json::json;
//! use std::collections::HashMap;
//!
//! let headers = json!({ "Authorization": "Bearer {{TOKEN}}" });
//! assert!(template::has_placeholder(&headers));
//!
//! let bindings = HashMap::from([("TOKEN".to_string(), "s3cret".to_string())]);
//! let resolved = template::substitute(&headers, &bindings).unwrap();
//! assert_eq!(resolved, json!({ "Authorization": "Bearer s3cret" }));
//! ```

use crate::error::MissingBindingError;
use core::ops::Range;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};

// ─────────────────────────────────────────────────────────────────────────────
// Bindings
// ─────────────────────────────────────────────────────────────────────────────

/// Source of placeholder values.
pub trait Bindings {
    /// Returns the value bound to `name`, if any.
    fn lookup(&self, name: &str) -> Option<&str>;
}

impl Bindings for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl Bindings for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<B: Bindings + ?Sized> Bindings for &B {
    fn lookup(&self, name: &str) -> Option<&str> {
        (**self).lookup(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scanner
// ─────────────────────────────────────────────────────────────────────────────

/// Iterator over the well-formed placeholders of a string.
///
/// Yields the byte range of the whole token and the placeholder name.
struct Placeholders<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Placeholders<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

impl<'a> Iterator for Placeholders<'a> {
    type Item = (Range<usize>, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();
        while let Some(offset) = self.text[self.pos..].find("{{") {
            let start = self.pos + offset;
            let name_start = start + 2;
            let name_len = bytes[name_start..]
                .iter()
                .take_while(|b| is_name_byte(**b))
                .count();
            let name_end = name_start + name_len;

            let closed = bytes[name_end..].starts_with(b"}}");
            let preceded = start > 0 && bytes[start - 1] == b'{';
            let followed = bytes.get(name_end + 2) == Some(&b'}');

            if name_len > 0 && closed && !preceded && !followed {
                self.pos = name_end + 2;
                return Some((start..name_end + 2, &self.text[name_start..name_end]));
            }
            // Braces are ASCII, so one byte forward is still a char boundary.
            self.pos = start + 1;
        }
        self.pos = self.text.len();
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// String-level API
// ─────────────────────────────────────────────────────────────────────────────

/// Returns `true` if `text` contains at least one well-formed placeholder.
#[must_use]
pub fn str_has_placeholder(text: &str) -> bool {
    Placeholders::new(text).next().is_some()
}

/// Returns the placeholder names in `text`, in order of appearance.
///
/// Names that appear more than once are returned more than once.
pub fn str_placeholder_names(text: &str) -> impl Iterator<Item = &str> {
    Placeholders::new(text).map(|(_, name)| name)
}

/// Replaces every placeholder in `text` with its bound value.
///
/// # Errors
///
/// Returns a [`MissingBindingError`] naming every unbound placeholder.
pub fn substitute_str(text: &str, bindings: &impl Bindings) -> Result<String, MissingBindingError> {
    let mut missing = BTreeSet::new();
    let out = substitute_str_into(text, bindings, &mut missing);
    if missing.is_empty() {
        Ok(out)
    } else {
        Err(MissingBindingError::new(missing))
    }
}

/// Substitutes `text`, recording unbound names in `missing` instead of failing.
///
/// Unbound placeholders are left in the output untouched. Callers that
/// resolve several strings together use this to report all missing names in
/// one error.
pub(crate) fn substitute_str_into(
    text: &str,
    bindings: &impl Bindings,
    missing: &mut BTreeSet<String>,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (range, name) in Placeholders::new(text) {
        out.push_str(&text[last..range.start]);
        match bindings.lookup(name) {
            Some(value) => out.push_str(value),
            None => {
                missing.insert(name.to_owned());
                out.push_str(&text[range.clone()]);
            }
        }
        last = range.end;
    }
    out.push_str(&text[last..]);
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Value-level API
// ─────────────────────────────────────────────────────────────────────────────

/// Returns `true` if any string leaf of `value` contains a well-formed placeholder.
#[must_use]
pub fn has_placeholder(value: &Value) -> bool {
    match value {
        Value::String(s) => str_has_placeholder(s),
        Value::Array(items) => items.iter().any(has_placeholder),
        Value::Object(map) => map.values().any(has_placeholder),
        Value::Null | Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Collects the names of all well-formed placeholders in `value`.
#[must_use]
pub fn extract_names(value: &Value) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect_names(value, &mut names);
    names
}

fn collect_names(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => names.extend(str_placeholder_names(s).map(str::to_owned)),
        Value::Array(items) => items.iter().for_each(|item| collect_names(item, names)),
        Value::Object(map) => map.values().for_each(|item| collect_names(item, names)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Rebuilds `value` with every placeholder replaced by its bound value.
///
/// The result has the same shape as the input. A value without placeholders
/// is returned unchanged.
///
/// # Errors
///
/// Returns a [`MissingBindingError`] naming every placeholder in the whole
/// tree that has no binding.
pub fn substitute(value: &Value, bindings: &impl Bindings) -> Result<Value, MissingBindingError> {
    let mut missing = BTreeSet::new();
    let out = substitute_value(value, bindings, &mut missing);
    if missing.is_empty() {
        Ok(out)
    } else {
        Err(MissingBindingError::new(missing))
    }
}

fn substitute_value(
    value: &Value,
    bindings: &impl Bindings,
    missing: &mut BTreeSet<String>,
) -> Value {
    match value {
        Value::String(s) => Value::String(substitute_str_into(s, bindings, missing)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| substitute_value(item, bindings, missing))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_value(v, bindings, missing)))
                .collect(),
        ),
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bindings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn detects_well_formed_placeholders() {
        assert!(str_has_placeholder("{{TOKEN}}"));
        assert!(str_has_placeholder("Bearer {{TOKEN}}"));
        assert!(str_has_placeholder("https://{{HOST}}/mcp"));
        assert!(str_has_placeholder("{{a_1}}{{B}}"));
    }

    #[test]
    fn malformed_braces_are_not_placeholders() {
        for text in [
            "{{}}",
            "{{ TOKEN }}",
            "{TOKEN}",
            "{{TOKEN}",
            "{{TOKEN",
            "TOKEN}}",
            "{{{TOKEN}}}",
            "{{TO-KEN}}",
            "{{TOKEN}}}",
            "{{{TOKEN}}",
            "plain",
            "",
        ] {
            assert!(!str_has_placeholder(text), "{text:?} should not match");
        }
    }

    #[test]
    fn names_in_order_of_appearance() {
        let names: Vec<&str> = str_placeholder_names("{{B}}-{{A}}-{{B}}").collect();
        assert_eq!(names, ["B", "A", "B"]);
    }

    #[test]
    fn substitutes_mixed_text() {
        let out = substitute_str(
            "{{SCHEME}}://{{HOST}}/v1?key={{KEY}}",
            &bindings(&[("SCHEME", "https"), ("HOST", "api.example.com"), ("KEY", "k")]),
        )
        .unwrap();
        assert_eq!(out, "https://api.example.com/v1?key=k");
    }

    #[test]
    fn malformed_tokens_survive_substitution() {
        let out = substitute_str("{{{A}}} {{ A }} {{A}}", &bindings(&[("A", "x")])).unwrap();
        assert_eq!(out, "{{{A}}} {{ A }} x");
    }

    #[test]
    fn bound_value_is_not_rescanned() {
        let out = substitute_str("{{A}}", &bindings(&[("A", "{{B}}")])).unwrap();
        assert_eq!(out, "{{B}}");
    }

    #[test]
    fn missing_names_are_all_reported() {
        let value = json!({
            "url": "https://{{HOST}}/mcp",
            "headers": { "Authorization": "Bearer {{TOKEN}}", "X-Org": "{{ORG}}" }
        });
        let err = substitute(&value, &bindings(&[("ORG", "acme")])).unwrap_err();
        assert_eq!(err.names(), ["HOST", "TOKEN"]);
    }

    #[test]
    fn walks_nested_values() {
        let value = json!({
            "list": ["{{A}}", 1, true, null, { "deep": "x{{B}}y" }],
            "{{KEY}}": "literal"
        });
        assert!(has_placeholder(&value));
        assert_eq!(
            extract_names(&value),
            BTreeSet::from(["A".to_string(), "B".to_string()])
        );

        let out = substitute(&value, &bindings(&[("A", "1"), ("B", "2")])).unwrap();
        assert_eq!(
            out,
            json!({
                "list": ["1", 1, true, null, { "deep": "x2y" }],
                "{{KEY}}": "literal"
            })
        );
    }

    #[test]
    fn non_string_leaves_have_no_placeholders() {
        assert!(!has_placeholder(&json!(42)));
        assert!(!has_placeholder(&json!(null)));
        assert!(!has_placeholder(&json!([true, 1.5])));
        assert!(extract_names(&json!({ "a": 1 })).is_empty());
    }
}
