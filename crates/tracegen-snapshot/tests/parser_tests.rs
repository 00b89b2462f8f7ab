//! Integration tests for dump parsing and transcoding.
//!
//! Each test lays out dump files in a scratch directory the way the recorder
//! names them and runs the parser against it.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tracegen_snapshot::{
    dedup_triples, serializer_for, FormatTranscoder, SnapshotError, SnapshotParser,
    StreamingTranscoder,
};
use tracegen_types::{InstrumentedMethod, OutcomeKind, SerializationFormat, Snapshot};

fn method(ty: &str, name: &str, params: &[&str], ret: &str) -> InstrumentedMethod {
    InstrumentedMethod {
        declaring_type: ty.to_string(),
        name: name.to_string(),
        parameters: params.iter().map(|p| p.to_string()).collect(),
        return_type: ret.to_string(),
        invocation_count: 1,
    }
}

fn write_dump(dir: &Path, file: &str, contents: &str) {
    fs::write(dir.join(file), contents).unwrap();
}

#[test]
fn test_scenario_c_single_returned_value() {
    let dir = TempDir::new().unwrap();
    write_dump(dir.path(), "a.Obj.getX-receiving.xml", "<Obj><x>1</x></Obj>");
    write_dump(dir.path(), "a.Obj.getX-returned.xml", "<int>2</int>");

    let parsed = SnapshotParser::new(dir.path())
        .parse(&method("a.Obj", "getX", &[], "int"))
        .unwrap();

    assert_eq!(parsed.paired, 1);
    assert_eq!(parsed.triples.len(), 1);
    let triple = &parsed.triples[0];
    assert_eq!(triple.receiving, "<Obj><x>1</x></Obj>");
    assert_eq!(triple.params, "");
    assert_eq!(triple.outcome, "<int>2</int>");
    assert_eq!(triple.outcome_kind, OutcomeKind::Returned);
}

#[test]
fn test_scenario_d_void_method_without_state_change() {
    let dir = TempDir::new().unwrap();
    let state = "<a.Counter>\n  <count>3</count>\n</a.Counter>";
    write_dump(dir.path(), "a.Counter.touch-receiving.xml", state);
    write_dump(dir.path(), "a.Counter.touch-receiving-post.xml", state);

    let parsed = SnapshotParser::new(dir.path())
        .parse(&method("a.Counter", "touch", &[], "void"))
        .unwrap();

    assert_eq!(parsed.triples.len(), 1);
    let triple = &parsed.triples[0];
    assert_eq!(triple.receiving, triple.outcome);
    assert_eq!(triple.outcome_kind, OutcomeKind::ReceivingPost);
}

#[test]
fn test_scenario_e_duplicate_captures_collapse() {
    let dir = TempDir::new().unwrap();
    write_dump(
        dir.path(),
        "a.Calc.add_int-receiving.xml",
        "<a.Calc/>\n<a.Calc/>\n<a.Calc><base>1</base></a.Calc>\n",
    );
    write_dump(
        dir.path(),
        "a.Calc.add_int-params.xml",
        "<object-array><int>5</int></object-array>\n<object-array><int>5</int></object-array>\n<object-array><int>5</int></object-array>\n",
    );
    write_dump(
        dir.path(),
        "a.Calc.add_int-returned.xml",
        "<int>5</int>\n<int>5</int>\n<int>6</int>\n",
    );

    let parsed = SnapshotParser::new(dir.path())
        .parse(&method("a.Calc", "add", &["int"], "int"))
        .unwrap();

    assert_eq!(parsed.paired, 3);
    assert_eq!(parsed.dropped_duplicate, 1);
    assert_eq!(parsed.triples.len(), 2);
    assert_eq!(parsed.triples[0].receiving, "<a.Calc/>");
    assert_eq!(parsed.triples[0].params, "<object-array><int>5</int></object-array>");
    assert_eq!(parsed.triples[1].outcome, "<int>6</int>");

    // filters only ever shrink the paired set
    assert!(parsed.triples.len() <= parsed.paired);
    assert_eq!(dedup_triples(parsed.triples.clone()), parsed.triples);
}

#[test]
fn test_encoding_headers_are_stripped() {
    let dir = TempDir::new().unwrap();
    write_dump(
        dir.path(),
        "a.S.name-receiving.xml",
        "<?xml version=\"1.0\" encoding=\"UTF-16\"?>\n<a.S><n>&amp;#x1f;</n></a.S>\n",
    );
    write_dump(
        dir.path(),
        "a.S.name-returned.xml",
        "<?xml version=\"1.0\" encoding=\"UTF-16\"?>\n<string>x</string>\n",
    );

    let parsed = SnapshotParser::new(dir.path())
        .parse(&method("a.S", "name", &[], "java.lang.String"))
        .unwrap();

    assert_eq!(parsed.triples[0].receiving, "<a.S><n>&#x1f;</n></a.S>");
    assert_eq!(parsed.triples[0].outcome, "<string>x</string>");
}

#[test]
fn test_missing_dump_is_capture_absent() {
    let dir = TempDir::new().unwrap();
    write_dump(dir.path(), "a.Obj.getX-receiving.xml", "<Obj/>");

    let err = SnapshotParser::new(dir.path())
        .parse(&method("a.Obj", "getX", &[], "int"))
        .unwrap_err();

    assert!(err.is_capture_absent());
    match err {
        SnapshotError::Missing { path } => {
            assert!(path.ends_with("a.Obj.getX-returned.xml"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_malformed_dump_names_path_and_params() {
    let dir = TempDir::new().unwrap();
    write_dump(dir.path(), "a.Obj.put_int,int-receiving.xml", "<Obj><x>1</Obj>");
    write_dump(dir.path(), "a.Obj.put_int,int-params.xml", "<p/>");
    write_dump(dir.path(), "a.Obj.put_int,int-returned.xml", "<int>1</int>");

    let err = SnapshotParser::new(dir.path())
        .parse(&method("a.Obj", "put", &["int", "int"], "int"))
        .unwrap_err();

    assert!(!err.is_capture_absent());
    let message = err.to_string();
    assert!(message.contains("a.Obj.put_int,int-receiving.xml"), "{}", message);
    assert!(message.contains("int,int"), "{}", message);
}

#[test]
fn test_fragment_count_mismatch_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_dump(dir.path(), "a.Obj.getX-receiving.xml", "<Obj/><Obj/>");
    write_dump(dir.path(), "a.Obj.getX-returned.xml", "<int>1</int>");

    let err = SnapshotParser::new(dir.path())
        .parse(&method("a.Obj", "getX", &[], "int"))
        .unwrap_err();

    assert!(matches!(
        err,
        SnapshotError::CountMismatch {
            receiving: 2,
            params: None,
            outcome: 1,
            ..
        }
    ));
}

#[test]
fn test_empty_dumps_yield_no_triples() {
    let dir = TempDir::new().unwrap();
    write_dump(dir.path(), "a.Obj.getX-receiving.xml", "\n");
    write_dump(dir.path(), "a.Obj.getX-returned.xml", "");

    let parsed = SnapshotParser::new(dir.path())
        .parse(&method("a.Obj", "getX", &[], "int"))
        .unwrap();

    assert_eq!(parsed.paired, 0);
    assert!(parsed.triples.is_empty());
}

#[test]
fn test_transcoded_snapshot_deserializes_to_same_tree() {
    let captured = [
        "<int>2</int>",
        "<null/>",
        "<a.Obj>\n  <x>1</x>\n  <tags class=\"java.util.ArrayList\">\n    <string>a &amp; b</string>\n    <string>  spaced  </string>\n  </tags>\n  <empty></empty>\n</a.Obj>",
        "<map id=\"1\"><entry><string>k</string><int>9</int></entry></map>",
    ];
    let xml = serializer_for(SerializationFormat::Xml);
    let json = serializer_for(SerializationFormat::Json);

    for text in captured {
        let native = xml.deserialize(text).unwrap();
        let transcoded = StreamingTranscoder
            .transcode(&Snapshot::xml(text), SerializationFormat::Json)
            .unwrap();
        assert_eq!(transcoded.format, SerializationFormat::Json);
        assert_eq!(json.deserialize(&transcoded.text).unwrap(), native, "{}", text);
    }
}
