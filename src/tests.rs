use pretty_assertions::assert_eq;

use crate::*;

fn load_str(input: &str) -> Vec<Document> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut bytes = input.as_bytes();
    load_all(&mut bytes).unwrap()
}

fn values_of(documents: &[Document]) -> Vec<Value> {
    let constructor = Constructor::new();
    documents
        .iter()
        .map(|document| constructor.construct_document(document).unwrap())
        .collect()
}

fn dump_to_string(documents: Vec<Document>, options: &DumpOptions) -> String {
    let mut output = Vec::new();
    dump(&mut output, documents, options).unwrap();
    String::from_utf8(output).unwrap()
}

fn bare_options() -> DumpOptions {
    DumpOptions {
        yaml_version: None,
        ..DumpOptions::default()
    }
}

/// Load, dump and re-load; the constructed values must be unchanged.
fn assert_round_trip(input: &str) {
    let documents = load_str(input);
    let before = values_of(&documents);
    let text = dump_to_string(documents, &bare_options());
    let after = values_of(&load_str(&text));
    assert_eq!(before, after, "round-tripped through:\n{text}");
}

#[test]
fn sanity() {
    const SANITY_INPUT: &str = r#"
unicode: "Sosa did fine.\u263A"
control: "\b1998\t1999\t2000\n"
hex esc: "\x0d\x0a is \r\n"

single: '"Howdy!" he cried.'
quoted: ' # Not a ''comment''.'
tie-fighter: '|\-*-/|'
"#;
    let mut input = SANITY_INPUT.as_bytes();
    let document = load_one(&mut input).unwrap();
    assert!(matches!(
        document.get_root_node().unwrap().data,
        NodeData::Mapping { .. }
    ));
}

#[test]
fn empty_input_yields_no_documents() {
    assert!(load_str("").is_empty());
    let mut input = "".as_bytes();
    assert!(load_one(&mut input).is_err());
}

#[test]
fn load_one_rejects_multiple_documents() {
    let mut input = "---\none\n---\ntwo\n".as_bytes();
    assert!(load_one(&mut input).is_err());
}

#[test]
fn scalar_int_pipeline() {
    let documents = load_str("42\n");
    let root = documents[0].get_root_node().unwrap();
    assert_eq!(root.tag.as_deref(), Some(INT_TAG));
    assert_eq!(values_of(&documents), vec![Value::Int(42)]);
}

#[test]
fn underscored_hex_int() {
    assert_eq!(values_of(&load_str("0x_0A_74_AE\n")), vec![Value::Int(685_230)]);
}

#[test]
fn sexagesimal_int() {
    assert_eq!(values_of(&load_str("190:20:30\n")), vec![Value::Int(685_230)]);
}

#[test]
fn alias_preserves_node_identity_through_dump() {
    let input = "anchor: &a { x: 1 }\nalias: *a\n";
    let text = dump_to_string(load_str(input), &bare_options());
    assert!(text.contains("&id001"), "{text}");
    assert!(text.contains("*id001"), "{text}");
    assert_round_trip(input);
}

#[test]
fn merge_key_flattens_first_wins() {
    assert_eq!(
        values_of(&load_str("<<: { a: 1 }\na: 2\nb: 3\n")),
        vec![Value::Map(vec![
            (Value::Str(String::from("a")), Value::Int(2)),
            (Value::Str(String::from("b")), Value::Int(3)),
        ])]
    );
}

#[test]
fn flow_sequence_of_ints_emits_flow() {
    let mut document = Document::new(None, &[], true, true);
    let sequence = document.add_sequence(None, SequenceStyle::Any);
    for value in ["1", "2", "3"] {
        let item = document.add_scalar(Some(INT_TAG), value, ScalarStyle::Any);
        document.append_sequence_item(sequence, item);
    }
    let options = DumpOptions {
        yaml_version: None,
        default_collection_style: CollectionStyle::Flow,
        ..DumpOptions::default()
    };
    assert_eq!(dump_to_string(vec![document], &options), "[1, 2, 3]\n");
}

#[test]
fn special_characters_force_double_quotes() {
    let mut document = Document::new(None, &[], true, true);
    let _ = document.add_scalar(None, "Hello\n\tworld", ScalarStyle::Any);
    assert_eq!(
        dump_to_string(vec![document], &bare_options()),
        "\"Hello\\n\\tworld\"\n"
    );
}

#[test]
fn windows_breaks_normalize_and_re_emit() {
    let documents = load_str("key: |\r\n  line1\r\n  line2\r\n");
    let Value::Map(pairs) = &values_of(&documents)[0] else {
        panic!("expected a mapping");
    };
    assert_eq!(pairs[0].1, Value::Str(String::from("line1\nline2\n")));

    let options = DumpOptions {
        yaml_version: None,
        line_break: Break::CrLn,
        ..DumpOptions::default()
    };
    assert_eq!(
        dump_to_string(documents, &options),
        "key: |\r\n  line1\r\n  line2\r\n"
    );
}

#[test]
fn multiline_plain_scalar_folds_into_single_quotes() {
    let mut emitter = Emitter::new();
    let mut output = Vec::new();
    emitter.set_output(&mut output);

    emitter.emit(Event::stream_start(Encoding::Utf8)).unwrap();
    emitter.emit(Event::document_start(None, &[], true)).unwrap();
    emitter
        .emit(Event::scalar(
            None,
            None,
            "1st non-empty\n2nd non-empty 3rd non-empty",
            true,
            true,
            ScalarStyle::Plain,
        ))
        .unwrap();
    emitter.emit(Event::document_end(true)).unwrap();
    emitter.emit(Event::stream_end()).unwrap();

    assert_eq!(
        core::str::from_utf8(&output),
        Ok("'1st non-empty\n\n  2nd non-empty 3rd non-empty'\n")
    );
}

#[test]
fn round_trips() {
    assert_round_trip("a: 1\nb: [x, y]\nc:\n  - 1\n  - {d: e}\n");
    assert_round_trip("s1: 'single'\ns2: \"double\\n\"\nempty:\n");
    assert_round_trip("lit: |\n  a\n  b\nfold: >\n  folded line\n  continues\n");
    assert_round_trip("base: &b { x: 1 }\nref: *b\n");
    assert_round_trip("---\none\n---\n- 2\n- yes\n- ~\n");
    assert_round_trip("<<: { a: 1 }\nb: 2\n");
    assert_round_trip("!!omap\n- a: 1\n- b: 2\n");
    assert_round_trip("binary: !!binary aGVsbG8=\nwhen: 2002-12-14\n");
    assert_round_trip("str int: '42'\nreal int: 42\nfloat: 1.25\n");
}

#[test]
fn implicit_resolution_survives_round_trip() {
    let resolver = Resolver::new();
    for input in ["42\n", "yes\n", "3.5\n", "~\n", "2002-12-14\n"] {
        let documents = load_str(input);
        let tag_before = documents[0].get_root_node().unwrap().tag.clone();
        let text = dump_to_string(documents, &bare_options());
        let documents = load_str(&text);
        let tag_after = documents[0].get_root_node().unwrap().tag.clone();
        assert_eq!(tag_before, tag_after, "{input:?} -> {text:?}");
        let NodeData::Scalar { value, .. } = &documents[0].get_root_node().unwrap().data else {
            panic!("expected a scalar");
        };
        assert_eq!(
            resolver.resolve(crate::NodeKind::Scalar, None, value, true),
            tag_after.unwrap()
        );
    }
}

#[test]
fn canonical_output_is_explicit() {
    let options = DumpOptions {
        canonical: true,
        yaml_version: None,
        ..DumpOptions::default()
    };
    let text = dump_to_string(load_str("a: 1\n"), &options);
    assert!(text.contains("!!int"), "{text}");
    assert!(text.contains("\"a\""), "{text}");
    assert_eq!(
        values_of(&load_str(&text)),
        values_of(&load_str("a: 1\n"))
    );
}

#[test]
fn indent_option_changes_nesting() {
    let options = DumpOptions {
        indent: 4,
        yaml_version: None,
        ..DumpOptions::default()
    };
    let text = dump_to_string(load_str("a:\n  b: 1\n"), &options);
    assert_eq!(text, "a:\n    b: 1\n");
}

#[test]
fn version_directive_emitted_by_default() {
    let text = dump_to_string(load_str("a: 1\n"), &DumpOptions::default());
    assert!(text.starts_with("%YAML 1.1\n---"), "{text}");
    assert_eq!(values_of(&load_str(&text)), values_of(&load_str("a: 1\n")));
}

#[test]
fn explicit_markers() {
    let options = DumpOptions {
        yaml_version: None,
        explicit_start: true,
        explicit_end: true,
        ..DumpOptions::default()
    };
    let text = dump_to_string(load_str("a\n"), &options);
    assert_eq!(text, "--- a\n...\n");
}

#[test]
fn tag_directive_shorthand_survives() {
    let input = "%TAG !e! tag:example.com,2000:\n--- !e!widget\nname\n";
    let documents = load_str(input);
    assert_eq!(
        documents[0].get_root_node().unwrap().tag.as_deref(),
        Some("tag:example.com,2000:widget")
    );

    let options = DumpOptions {
        yaml_version: None,
        tag_directives: vec![TagDirective::new("!e!", "tag:example.com,2000:")],
        ..DumpOptions::default()
    };
    let text = dump_to_string(documents, &options);
    assert!(text.contains("%TAG !e! tag:example.com,2000:"), "{text}");
    assert!(text.contains("!e!widget"), "{text}");
}

#[test]
fn utf16_output_has_bom() {
    let options = DumpOptions {
        yaml_version: None,
        encoding: Encoding::Utf16Le,
        ..DumpOptions::default()
    };
    let mut output = Vec::new();
    dump(&mut output, load_str("a\n"), &options).unwrap();
    assert_eq!(output, vec![0xFF, 0xFE, 0x61, 0x00, 0x0A, 0x00]);

    let mut input: &[u8] = &output;
    let reloaded = load_all(&mut input).unwrap();
    assert_eq!(
        values_of(&reloaded),
        vec![Value::Str(String::from("a"))]
    );
}

#[test]
fn utf16_input_with_bom() {
    let mut input: &[u8] = b"\xFF\xFEa\x00:\x00 \x001\x00\x0A\x00";
    let documents = load_all(&mut input).unwrap();
    assert_eq!(
        values_of(&documents),
        vec![Value::Map(vec![(
            Value::Str(String::from("a")),
            Value::Int(1)
        )])]
    );
}

#[test]
fn scanner_indents_balance_at_stream_end() {
    let mut bytes: &[u8] = b"a:\n  b:\n    - 1\n    - 2\nc: 3\n";
    let mut scanner = Scanner::new();
    scanner.set_input_string(&mut bytes);
    let mut depth = 0i32;
    loop {
        let token = scanner.scan().unwrap();
        match token.data {
            TokenData::BlockMappingStart | TokenData::BlockSequenceStart => depth += 1,
            TokenData::BlockEnd => depth -= 1,
            TokenData::StreamEnd => break,
            _ => {}
        }
        assert!(depth >= 0);
    }
    assert_eq!(depth, 0);
}
