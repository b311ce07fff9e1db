//! Property tests for placeholder substitution.
//!
//! Values are generated as small JSON trees whose strings mix literal text
//! with `{{NAME}}` tokens drawn from a fixed set of names.

use lodestar_mcp::template::{extract_names, has_placeholder, substitute, substitute_str};
use proptest::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashMap;

const NAMES: [&str; 4] = ["TOKEN", "TENANT", "API_KEY", "region"];

/// Literal text that can never form a placeholder.
fn arb_literal() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 /:._-]{0,12}"
}

/// Text with zero or more placeholders from [`NAMES`] spliced in.
fn arb_templated() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            arb_literal(),
            prop::sample::select(NAMES.to_vec()).prop_map(|n| format!("{{{{{n}}}}}")),
        ],
        0..5,
    )
    .prop_map(|parts| parts.concat())
}

fn arb_value(leaf: BoxedStrategy<String>) -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        leaf.prop_map(Value::String),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn full_bindings() -> HashMap<String, String> {
    NAMES
        .iter()
        .map(|n| ((*n).to_string(), format!("value-of-{n}")))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Values without placeholders come back unchanged, whatever the bindings.
    #[test]
    fn prop_substitution_without_placeholders_is_identity(
        value in arb_value(arb_literal().boxed())
    ) {
        prop_assert!(!has_placeholder(&value));
        prop_assert!(extract_names(&value).is_empty());
        let out = substitute(&value, &HashMap::<String, String>::new()).unwrap();
        prop_assert_eq!(out, value);
    }

    /// Full bindings leave no placeholders behind.
    #[test]
    fn prop_full_substitution_removes_every_placeholder(
        value in arb_value(arb_templated().boxed())
    ) {
        let out = substitute(&value, &full_bindings()).unwrap();
        prop_assert!(extract_names(&out).is_empty());
        prop_assert!(!has_placeholder(&out));
    }

    /// Missing bindings are reported exactly as the names the value references.
    #[test]
    fn prop_missing_names_match_extracted_names(
        value in arb_value(arb_templated().boxed())
    ) {
        let names = extract_names(&value);
        match substitute(&value, &HashMap::<String, String>::new()) {
            Ok(out) => {
                prop_assert!(names.is_empty());
                prop_assert_eq!(out, value);
            }
            Err(err) => {
                let reported: Vec<_> = names.into_iter().collect();
                prop_assert_eq!(err.names(), reported.as_slice());
            }
        }
    }

    /// String substitution splices values in without disturbing the literal text.
    #[test]
    fn prop_string_substitution_preserves_literals(
        prefix in arb_literal(),
        suffix in arb_literal(),
        name in prop::sample::select(NAMES.to_vec()),
    ) {
        let text = format!("{prefix}{{{{{name}}}}}{suffix}");
        let out = substitute_str(&text, &full_bindings()).unwrap();
        prop_assert_eq!(out, format!("{prefix}value-of-{name}{suffix}"));
    }
}
