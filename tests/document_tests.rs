// tests/document_tests.rs

use catalog_core::{Document, DocumentError, Value};

fn sample() -> Document {
    Document::from_json(
        r#"{
            "a": {"b": 1, "c": ["x", {"d": true}]},
            "e": [],
            "when": "2014-05-30T15:45:10+02:00"
        }"#,
    )
    .unwrap()
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn test_get_nested_and_indexed() {
    let doc = sample();
    assert_eq!(doc.get("a.b"), Some(&Value::Integer(1)));
    assert_eq!(doc.get("a.c.0"), Some(&Value::from("x")));
    assert_eq!(doc.get("a.c.1.d"), Some(&Value::Boolean(true)));
    assert_eq!(doc.get("a.c.-.d"), Some(&Value::Boolean(true)));
}

#[test]
fn test_get_tolerates_absent_segments() {
    let doc = sample();
    assert!(doc.get("a.missing.deeper").is_none());
    assert!(doc.get("a.c.7").is_none());
    assert!(doc.get("a.b.c").is_none());
    assert!(!doc.contains_key("e.0"));
    assert!(doc.contains_key("e"));
}

#[test]
fn test_set_then_get() {
    let mut doc = sample();
    doc.set("a.b", 42).unwrap();
    assert_eq!(doc.get("a.b"), Some(&Value::Integer(42)));

    doc.set("a.c.0", "y").unwrap();
    assert_eq!(doc.get("a.c.0"), Some(&Value::from("y")));
}

#[test]
fn test_set_creates_intermediate_mappings() {
    let mut doc = Document::new();
    doc.set("Doc.meta.title", "Severe weather").unwrap();
    assert_eq!(doc.get("Doc.meta.title"), Some(&Value::from("Severe weather")));
}

#[test]
fn test_set_never_creates_list_slots() {
    let mut doc = sample();
    let err = doc.set("a.c.5", "z").unwrap_err();
    assert!(matches!(err, DocumentError::IndexOutOfBounds { len: 2, .. }));
    assert!(err.is_path_error());

    let err = doc.set("e.0", "z").unwrap_err();
    assert!(err.is_path_error());
}

#[test]
fn test_set_through_scalar_is_type_error() {
    let mut doc = sample();
    let err = doc.set("a.b.c", 1).unwrap_err();
    assert!(matches!(err, DocumentError::NotAContainer { ref path, found: "integer" } if path == "a.b"));
    assert!(err.is_type_error());
}

#[test]
fn test_remove() {
    let mut doc = sample();
    assert_eq!(doc.remove("a.c.0"), Some(Value::from("x")));
    assert_eq!(doc.get("a.c.0.d"), Some(&Value::Boolean(true)));
    assert_eq!(doc.remove("a.b"), Some(Value::Integer(1)));
    assert!(!doc.contains_key("a.b"));
}

#[test]
fn test_remove_missing_is_noop() {
    let mut doc = sample();
    let before = doc.clone();
    assert_eq!(doc.remove("a.nothing"), None);
    assert_eq!(doc.remove("nothing.at.all"), None);
    assert_eq!(doc, before);
}

// ============================================================================
// Flattening
// ============================================================================

#[test]
fn test_flatten_keys_are_paths() {
    let doc = sample();
    let flat = doc.flatten();
    assert_eq!(
        flat.keys().map(String::as_str).collect::<Vec<_>>(),
        ["a.b", "a.c.0", "a.c.1.d", "e", "when"]
    );
    for (path, value) in &flat {
        assert_eq!(doc.get(path), Some(value));
    }
}

#[test]
fn test_unflatten_restores_document() {
    let doc = sample();
    assert_eq!(Document::unflatten(doc.flatten()).unwrap(), doc);
}

#[test]
fn test_flatten_keeps_ambiguous_mappings_whole() {
    let doc =
        Document::from_json(r#"{"a": {"0": "x", "1": "y"}, "b": {"c.d": 1}, "e": {"f": 2}}"#)
            .unwrap();
    let flat = doc.flatten();
    assert_eq!(flat.keys().map(String::as_str).collect::<Vec<_>>(), ["a", "b", "e.f"]);
    assert_eq!(Document::unflatten(flat).unwrap(), doc);
}

#[test]
fn test_unflatten_rejects_gaps() {
    let flat = vec![("list.1".to_string(), Value::from("x"))];
    assert!(Document::unflatten(flat).unwrap_err().is_path_error());
}

// ============================================================================
// JSON
// ============================================================================

#[test]
fn test_dates_are_recognized_and_canonical() {
    let doc = sample();
    assert!(matches!(doc.get("when"), Some(Value::DateTime(_))));
    assert_eq!(
        doc.to_json(),
        r#"{"a":{"b":1,"c":["x",{"d":true}]},"e":[],"when":"2014-05-30T13:45:10Z"}"#
    );
}

#[test]
fn test_extended_json_dates() {
    let doc = Document::from_json(r#"{"at": {"$date": 1401457510000}}"#).unwrap();
    assert_eq!(doc.to_json(), r#"{"at":"2014-05-30T13:45:10Z"}"#);
}

#[test]
fn test_key_order_is_preserved() {
    let doc = Document::from_json(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
    assert_eq!(doc.keys().map(String::as_str).collect::<Vec<_>>(), ["z", "a", "m"]);
}

#[test]
fn test_non_object_json_is_rejected() {
    let err = Document::from_json("[1, 2]").unwrap_err();
    assert!(matches!(err, DocumentError::NotAnObject { found: "list" }));
}

#[test]
fn test_serde_round_trip_through_document() {
    let doc = sample();
    let text = serde_json::to_string(&doc).unwrap();
    let back: Document = serde_json::from_str(&text).unwrap();
    assert_eq!(back, doc);
}
