//! Integration tests for `nestedtext::load`/`load_str` against whole
//! documents, as opposed to the unit tests embedded in `src/loader.rs`
//! which exercise the option plumbing in isolation.

use nestedtext::{load_str, load_str_with_keymap, LoadOptions, OnDup, ParseErrorKind, Top, Value};
use std::rc::Rc;

fn mapping(v: &Value) -> &[(String, Value)] {
    v.as_mapping().expect("expected a mapping")
}

// A contact-card style flat mapping of strings.
#[test]
fn scenario_flat_mapping_of_strings() {
    let doc = "name: Katheryn McDaniel\ngender: female\nphone: 1-210-555-5297";
    let v = load_str(doc, &LoadOptions::default()).unwrap().unwrap();
    assert_eq!(v.get("name").unwrap().as_str(), Some("Katheryn McDaniel"));
    assert_eq!(v.get("gender").unwrap().as_str(), Some("female"));
    assert_eq!(v.get("phone").unwrap().as_str(), Some("1-210-555-5297"));
}

// A mapping whose values are sequences.
#[test]
fn scenario_mapping_of_sequences() {
    let doc = "kids:\n    - Joanie\n    - Terrance\npets:\n    - Rufus\n    - Fido";
    let v = load_str(doc, &LoadOptions::default()).unwrap().unwrap();
    let kids = v.get("kids").unwrap().as_sequence().unwrap();
    assert_eq!(kids.len(), 2);
    assert_eq!(kids[0].as_str(), Some("Joanie"));
    assert_eq!(kids[1].as_str(), Some("Terrance"));
}

// A sequence of mappings: each item is a dash with no rest-of-line value,
// opening an indented mapping child — a dash with a rest-of-line value
// permits no further indentation.
#[test]
fn scenario_sequence_of_mappings() {
    let doc = "\
-
    name: Katheryn McDaniel
    gender: female
-
    name: Frank Douglas
    gender: male";
    let v = load_str(doc, &LoadOptions::default()).unwrap().unwrap();
    let items = v.as_sequence().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].get("name").unwrap().as_str(), Some("Katheryn McDaniel"));
    assert_eq!(items[1].get("gender").unwrap().as_str(), Some("male"));
}

// A dash that *does* carry a rest-of-line value cannot also open an
// indented child — that's an "invalid indentation (value already given)".
#[test]
fn list_item_with_rest_of_line_value_rejects_further_indentation() {
    let doc = "- name: Katheryn McDaniel\n  gender: female";
    let err = load_str(doc, &LoadOptions::default()).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::InvalidIndentation);
    assert!(err.message.contains("line 1"));
}

// Multiline strings carrying embedded blank lines.
#[test]
fn scenario_multiline_string_with_blank_line() {
    let doc = "greeting:\n    > Hello,\n    >\n    > World!";
    let v = load_str(doc, &LoadOptions::default()).unwrap().unwrap();
    assert_eq!(v.get("greeting").unwrap().as_str(), Some("Hello,\n\nWorld!"));
}

// S5: a multiline key paired with an indented value.
#[test]
fn scenario_multiline_key() {
    let doc = ": regex for matching\n: an integer\n    > [-+]?[0-9]+";
    let (v, _) = load_str_with_keymap(doc, &LoadOptions::default()).unwrap();
    let v = v.unwrap();
    let entries = mapping(&v);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "regex for matching\nan integer");
    assert_eq!(entries[0].1.as_str(), Some("[-+]?[0-9]+"));
}

// S6: an inline mapping/sequence nested inside block structure.
#[test]
fn scenario_inline_value_inside_block_mapping() {
    let doc = "fruits: [apple, cherry, grape]\ncolors: {red: ff0000, green: 00ff00}";
    let v = load_str(doc, &LoadOptions::default()).unwrap().unwrap();
    let fruits = v.get("fruits").unwrap().as_sequence().unwrap();
    assert_eq!(fruits[1].as_str(), Some("cherry"));
    assert_eq!(v.get("colors").unwrap().get("green").unwrap().as_str(), Some("00ff00"));
}

#[test]
fn tab_in_indentation_is_rejected_with_location() {
    let doc = "a:\n\t- 1";
    let err = load_str(doc, &LoadOptions::default()).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::TabInIndentation);
    assert_eq!(err.line_number, 1);
}

#[test]
fn mismatched_indentation_reports_invalid_indentation() {
    let doc = "a:\n    - 1\n  - 2";
    let err = load_str(doc, &LoadOptions::default()).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::InvalidIndentation);
}

#[test]
fn duplicate_key_without_on_dup_is_an_error() {
    let doc = "a: 1\na: 2";
    let err = load_str(doc, &LoadOptions::default()).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::DuplicateKey);
}

#[test]
fn top_constraint_rejects_mismatched_root() {
    let err = load_str("- a\n- b", &LoadOptions::new().top(Top::Dict)).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::TopLevelTypeMismatch);
}

#[test]
fn empty_brace_and_bracket_are_distinct_from_a_single_empty_entry() {
    let empty_list = load_str("[]", &LoadOptions::default()).unwrap().unwrap();
    assert_eq!(empty_list, Value::Sequence(vec![]));

    let one_empty_string = load_str("[ ]", &LoadOptions::default()).unwrap().unwrap();
    assert_eq!(one_empty_string, Value::Sequence(vec![Value::String(String::new())]));
}

#[test]
fn on_dup_callback_is_retried_until_it_returns_a_free_key() {
    let opts = LoadOptions::new().on_dup(OnDup::Callback(Rc::new(|key, _path, attempt| {
        format!("{key}-{attempt}")
    })));
    let doc = "a: 1\na: 2\na: 3";
    let v = load_str(doc, &opts).unwrap().unwrap();
    assert_eq!(v.get("a").unwrap().as_str(), Some("1"));
    assert_eq!(v.get("a-0").unwrap().as_str(), Some("2"));
    assert_eq!(v.get("a-1").unwrap().as_str(), Some("3"));
}

#[test]
fn source_label_is_used_in_error_display() {
    let opts = LoadOptions::new().source("config.nt");
    let err = load_str("a: 1\na: 2", &opts).unwrap_err();
    assert!(err.to_string().starts_with("config.nt:"));
}

#[test]
fn keymap_locates_every_node_including_nested_ones() {
    let doc = "a:\n    - 1\n    - 2\nb: 3";
    let (_, km) = load_str_with_keymap(doc, &LoadOptions::default()).unwrap();
    use nestedtext::KeyPathSegment::{Index, Key};
    assert!(km.location(&[]).is_some());
    assert!(km.location(&[Key("a".to_string())]).is_some());
    assert!(km.location(&[Key("a".to_string()), Index(0)]).is_some());
    assert!(km.location(&[Key("b".to_string())]).is_some());
}
