//! Behavioral checks of the public loader API.

use std::cell::RefCell;
use std::rc::Rc;

use libyaml11::{
    load, load_all, load_with_options, ErrorKind, Kind, LoadError, LoadOptions, NodePhase,
    Schema, Type, Value,
};

fn keys(value: &Value) -> Vec<String> {
    value.as_mapping().unwrap().borrow().keys().cloned().collect()
}

#[test]
fn test_block_mapping_keeps_order() {
    let value = load("b: 2\na: 1\n").unwrap().unwrap();
    assert_eq!(keys(&value), vec!["b", "a"]);
    assert_eq!(value.get("a"), Some(Value::from(1i64)));
    assert_eq!(value.get("b"), Some(Value::from(2i64)));
}

#[test]
fn test_stream_of_documents() {
    let docs = load_all("--- 1\n--- 2\n--- 3\n--- 4\n").unwrap();
    assert_eq!(docs.len(), 4);
    assert_eq!(docs[3], Value::from(4i64));
    assert!(load_all("").unwrap().is_empty());
    assert_eq!(
        load("--- 1\n--- 2\n").unwrap_err().kind(),
        &ErrorKind::MultipleDocuments
    );
}

#[test]
fn test_alias_shares_collection() {
    let value = load("{x: &a [1], y: *a}").unwrap().unwrap();
    let (Some(Value::Sequence(x)), Some(Value::Sequence(y))) = (value.get("x"), value.get("y"))
    else {
        panic!("expected two sequences, got {:?}", value);
    };
    assert!(Rc::ptr_eq(&x, &y));
    x.borrow_mut().push(Value::from(2i64));
    assert_eq!(y.borrow().len(), 2);
}

#[test]
fn test_alias_to_scalar() {
    let value = load("{x: &a 1, y: *a}").unwrap().unwrap();
    assert_eq!(value.get("y"), Some(Value::from(1i64)));
}

#[test]
fn test_self_reference() {
    let value = load("&a [0, *a]").unwrap().unwrap();
    let outer = value.as_sequence().unwrap().clone();
    let inner = match &outer.borrow()[1] {
        Value::Sequence(inner) => inner.clone(),
        other => panic!("expected a sequence, got {:?}", other),
    };
    assert!(Rc::ptr_eq(&outer, &inner));
    // Break the cycle so the test does not leak.
    outer.borrow_mut().clear();
}

#[test]
fn test_self_reference_mapping() {
    let value = load("&m\nname: root\nself: *m\n").unwrap().unwrap();
    let outer = value.as_mapping().unwrap().clone();
    let inner = outer.borrow().get("self").and_then(|v| v.as_mapping().cloned());
    assert!(Rc::ptr_eq(&outer, &inner.unwrap()));
    outer.borrow_mut().clear();
}

#[test]
fn test_duplicate_keys() {
    let err = load("a: 1\na: 2\n").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
    assert_eq!(err.mark().unwrap().line(), 1);

    let value = load_with_options("a: 1\na: 2\n", LoadOptions::new().json(true))
        .unwrap()
        .unwrap();
    assert_eq!(value.get("a"), Some(Value::from(2i64)));

    assert_eq!(
        load("{a: 1, a: 2}").unwrap_err().kind(),
        &ErrorKind::DuplicateKey
    );
    let value = load_with_options("{a: 1, a: 2}", LoadOptions::new().json(true))
        .unwrap()
        .unwrap();
    assert_eq!(value.get("a"), Some(Value::from(2i64)));
}

#[test]
fn test_merge_keys() {
    let value = load("{<<: {a: 1, b: 2}, a: 9}").unwrap().unwrap();
    assert_eq!(value.get("a"), Some(Value::from(9i64)));
    assert_eq!(value.get("b"), Some(Value::from(2i64)));
    assert_eq!(keys(&value), vec!["a", "b"]);

    // Keys already present are not replaced by a later merge.
    let value = load("a: 1\n<<: {a: 2, c: 3}\n").unwrap().unwrap();
    assert_eq!(value.get("a"), Some(Value::from(1i64)));
    assert_eq!(value.get("c"), Some(Value::from(3i64)));

    // A merged key may be overridden once, not twice.
    assert_eq!(
        load("<<: {a: 1}\na: 2\na: 3\n").unwrap_err().kind(),
        &ErrorKind::DuplicateKey
    );

    assert_eq!(
        load("<<: [{a: 1}, 2]\n").unwrap_err().kind(),
        &ErrorKind::UnacceptableMergeSource
    );
}

#[test]
fn test_merge_with_itself() {
    let value = load("&m\na: 1\n<<: *m\n").unwrap().unwrap();
    assert_eq!(keys(&value), vec!["a"]);
}

#[test]
fn test_block_scalar_chomping() {
    let value = load("strip: |-\n  x\n\nclip: |\n  x\n\nkeep: |+\n  x\n\n")
        .unwrap()
        .unwrap();
    assert_eq!(value.get("strip"), Some(Value::from("x")));
    assert_eq!(value.get("clip"), Some(Value::from("x\n")));
    assert_eq!(value.get("keep"), Some(Value::from("x\n\n")));

    assert_eq!(load("|-\nfoo\n\n").unwrap(), Some(Value::from("foo")));
    assert_eq!(load("|\nfoo\n\n").unwrap(), Some(Value::from("foo\n")));
    assert_eq!(load("|+\nfoo\n\n").unwrap(), Some(Value::from("foo\n\n")));
}

#[test]
fn test_folded_scalar() {
    assert_eq!(load(">\n  a\n  b\n").unwrap(), Some(Value::from("a b\n")));
    assert_eq!(
        load(">\n  a\n\n  b\n   c\n").unwrap(),
        Some(Value::from("a\nb\n c\n"))
    );
}

#[test]
fn test_unknown_tag() {
    let err = load("!<tag:nope> x").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::UnknownTag("tag:nope".to_string()));
    assert!(err.to_string().starts_with("unknown tag !<tag:nope>"));
}

#[test]
fn test_missing_space_after_colon() {
    let err = load("key: 1\n\"b\":c\n").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MissingWhitespaceAfterColon);
    let mark = err.mark().unwrap();
    assert_eq!(mark.line(), 1);
    assert_eq!(mark.column(), 4);
}

#[test]
fn test_error_display() {
    let options = LoadOptions::new().filename("doc.yaml");
    let err = load_with_options("a: 1\na: 2\n", options).unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("duplicated mapping key in \"doc.yaml\" at line 2, column 1:"));
    assert!(text.contains("a: 2"));
    assert!(text.contains('^'));
}

#[test]
fn test_warnings() {
    let warnings: RefCell<Vec<LoadError>> = RefCell::new(Vec::new());
    let options = LoadOptions::new().on_warning(|w| warnings.borrow_mut().push(w.clone()));
    let value = load_with_options("%FOO bar\n--- 1\n", options).unwrap();
    assert_eq!(value, Some(Value::from(1i64)));

    let warnings = warnings.into_inner();
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].kind(),
        &ErrorKind::UnknownDirective("FOO".to_string())
    );
    assert!(warnings[0].mark().is_some());
}

#[test]
fn test_warnings_without_callback_do_not_fail() {
    assert_eq!(
        load("%YAML 1.3\n--- 1\n").unwrap(),
        Some(Value::from(1i64))
    );
}

#[test]
fn test_listener() {
    let events: RefCell<Vec<(NodePhase, usize, Option<String>)>> = RefCell::new(Vec::new());
    let options = LoadOptions::new().listener(|event| {
        events
            .borrow_mut()
            .push((event.phase, event.line, event.tag.map(str::to_string)))
    });
    load_with_options("a: 1\nb: [x]\n", options).unwrap();

    let events = events.into_inner();
    let opens = events.iter().filter(|e| e.0 == NodePhase::Open).count();
    let closes = events.iter().filter(|e| e.0 == NodePhase::Close).count();
    assert_eq!(opens, closes);
    assert_eq!(events.first().map(|e| e.0), Some(NodePhase::Open));
    assert_eq!(events.last().map(|e| e.0), Some(NodePhase::Close));
    assert!(events
        .iter()
        .any(|e| e.0 == NodePhase::Close && e.2.as_deref() == Some("tag:yaml.org,2002:int")));
}

#[test]
fn test_json_mode_characters() {
    let json = || LoadOptions::new().json(true);

    // DEL is a valid JSON character but not a printable one.
    let text = "\"a\u{7f}b\"";
    assert_eq!(load(text).unwrap_err().kind(), &ErrorKind::NonPrintable);
    assert_eq!(
        load_with_options(text, json()).unwrap(),
        Some(Value::from("a\u{7f}b"))
    );

    assert_eq!(
        load_with_options("\"a\u{1}b\"", json()).unwrap_err().kind(),
        &ErrorKind::InvalidJsonCharacter
    );
    assert_eq!(load("a\u{1}b").unwrap_err().kind(), &ErrorKind::NonPrintable);
}

#[test]
fn test_schemas() {
    let options = LoadOptions::new().schema(Schema::failsafe());
    let value = load_with_options("[1, true, ~]", options).unwrap().unwrap();
    assert_eq!(
        value,
        Value::sequence(vec!["1".into(), "true".into(), "~".into()])
    );

    let options = LoadOptions::new().schema(Schema::json());
    let value = load_with_options("[1, 2001-12-14]", options).unwrap().unwrap();
    assert_eq!(
        value,
        Value::sequence(vec![Value::from(1i64), "2001-12-14".into()])
    );
}

#[test]
fn test_custom_type() {
    let point = Type::new("!point", Kind::Sequence)
        .with_resolve(|v| v.len() == 2)
        .with_construct(|v| {
            let x = v.index(0).unwrap_or_default();
            let y = v.index(1).unwrap_or_default();
            let mut map = indexmap::IndexMap::new();
            map.insert("x".to_string(), x);
            map.insert("y".to_string(), y);
            Value::mapping(map)
        });
    let options = LoadOptions::new().schema(Schema::default_safe().with_explicit(point));
    let value = load_with_options("at: !point [3, 4]\n", options)
        .unwrap()
        .unwrap();
    let at = value.get("at").unwrap();
    assert_eq!(at.get("x"), Some(Value::from(3i64)));
    assert_eq!(at.get("y"), Some(Value::from(4i64)));

    assert_eq!(
        load("!point [3, 4]").unwrap_err().kind(),
        &ErrorKind::UnknownTag("!point".to_string())
    );
}

#[test]
fn test_binary_and_timestamp() {
    let value = load("bin: !!binary aGVsbG8=\nat: 2001-12-14 21:59:43.10 -5\n")
        .unwrap()
        .unwrap();
    assert_eq!(value.get("bin").unwrap().as_bytes(), Some(&b"hello"[..]));
    let at = value.get("at").unwrap();
    assert_eq!(
        at.as_timestamp().unwrap().to_rfc3339(),
        "2001-12-14T21:59:43.100-05:00"
    );
}

#[test]
fn test_tabs_are_not_indentation() {
    let value = load("a:\n\tb: 1\n").unwrap().unwrap();
    assert_eq!(keys(&value), vec!["a", "b"]);
    assert_eq!(value.get("a"), Some(Value::Null));
    assert_eq!(value.get("b"), Some(Value::from(1i64)));
}

#[test]
fn test_deep_nesting_is_an_error() {
    let depth = 10_000;
    let text = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
    let err = load(&text).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::NestingTooDeep);
    assert!(err.mark().is_some());

    let shallow = format!("{}1{}", "[".repeat(20), "]".repeat(20));
    assert!(load(&shallow).unwrap().is_some());
}

#[test]
fn test_indentation_errors() {
    assert_eq!(
        load("a: 1\n\"b\"\n").unwrap_err().kind(),
        &ErrorKind::MissingColon
    );
    assert_eq!(
        load("a: 1\n  b: 2\n").unwrap_err().kind(),
        &ErrorKind::BadMappingIndentation
    );
    assert_eq!(
        load("- a\n  - b: 1\n - c\n").unwrap_err().kind(),
        &ErrorKind::BadSequenceIndentation
    );
    assert_eq!(
        load("\"a\n---\n").unwrap_err().kind(),
        &ErrorKind::DocumentEndInQuotedScalar("double")
    );
}
