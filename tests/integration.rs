//! Integration tests: sessions built from bytes or values, layout shape for nested,
//! enum and array schemas, offsets, colors, hex rows and error propagation.

use visistruct::{
    build, field, layout, parse, ByteOrder, Color, Config, DependencyReason, Encoding, HexCell,
    LengthPrefix, Node, NumKind, ScalarSpec, Schema, Subcon, Value, VisiError, VisiStruct,
};

const FLAGS: [&str; 4] = ["ONE", "TWO", "THREE", "FOUR"];

/// Constant, int, string, enum and a nested struct with two fields.
fn simple_struct() -> (Schema, Value) {
    let schema = Schema::new(vec![
        field("my_header", Node::constant(*b"FAKE")),
        field("my_int", Node::Scalar(ScalarSpec::INT32UL)),
        field("my_string", Node::cstring(Encoding::Ascii)),
        field(
            "my_enum",
            Node::enumeration(ScalarSpec::INT8UL, [("ONE", 1), ("TWO", 2), ("THREE", 3)]),
        ),
        field(
            "my_inner",
            Node::structure(vec![
                field("my_id", Node::Scalar(ScalarSpec::INT16UL)),
                field(
                    "my_value",
                    Node::enumeration(ScalarSpec::INT32UL, [("HOT", 1), ("COLD", 2), ("JUST_RIGHT", 3)]),
                ),
            ]),
        ),
    ]);
    let value = Value::structure([
        ("my_int", Value::U32(17)),
        ("my_string", Value::str("helloworld")),
        ("my_enum", Value::str("ONE")),
        (
            "my_inner",
            Value::structure([("my_id", Value::U16(3)), ("my_value", Value::str("HOT"))]),
        ),
    ]);
    (schema, value)
}

fn heavily_nested() -> (Schema, Value) {
    let int = || Node::Scalar(ScalarSpec::INT32SL);
    let schema = Schema::new(vec![
        field("top_value", int()),
        field(
            "one",
            Node::structure(vec![
                field("one_value", int()),
                field(
                    "two",
                    Node::structure(vec![
                        field("two_value", int()),
                        field(
                            "three",
                            Node::structure(vec![field("three_value", int()), field("bottom", int())]),
                        ),
                    ]),
                ),
            ]),
        ),
    ]);
    let value = Value::structure([
        ("top_value", Value::I32(0)),
        (
            "one",
            Value::structure([
                ("one_value", Value::I32(1)),
                (
                    "two",
                    Value::structure([
                        ("two_value", Value::I32(2)),
                        (
                            "three",
                            Value::structure([("three_value", Value::I32(3)), ("bottom", Value::I32(32))]),
                        ),
                    ]),
                ),
            ]),
        ),
    ]);
    (schema, value)
}

fn array_struct(count: i32) -> (Schema, Value) {
    let schema = Schema::new(vec![
        field("sz_custom_array", Node::Scalar(ScalarSpec::INT32SB)),
        field(
            "custom_array",
            Node::array_sized_by(
                "sz_custom_array",
                Node::structure(vec![
                    field(
                        "a_flag",
                        Node::enumeration(ScalarSpec::INT8SB, [("ONE", 1), ("TWO", 2), ("THREE", 3), ("FOUR", 4)]),
                    ),
                    field("nested_custom_array", Node::array(3, Node::Scalar(ScalarSpec::FLOAT32L))),
                ]),
            ),
        ),
    ]);
    let elements = (0..count)
        .map(|n| {
            Value::structure([
                ("a_flag", Value::str(FLAGS[n as usize % FLAGS.len()])),
                (
                    "nested_custom_array",
                    Value::List(vec![
                        Value::Float(n as f32 * 1.5),
                        Value::Float(-2.25),
                        Value::Float(8.0),
                    ]),
                ),
            ])
        })
        .collect();
    let value = Value::structure([
        ("sz_custom_array", Value::I32(count)),
        ("custom_array", Value::List(elements)),
    ]);
    (schema, value)
}

fn assert_offsets_consistent(v: &VisiStruct) {
    let mut prev = 0;
    for f in v.fields() {
        assert_eq!(f.offset, prev + f.length, "field {}", f.name);
        if f.length > 0 {
            assert!(f.offset > prev);
        }
        prev = f.offset;
    }
    assert_eq!(prev, v.raw().len());
}

#[test]
fn test_simple_struct_from_bytes() {
    let (schema, value) = simple_struct();
    let raw = build(&schema, &value).expect("build");
    assert_eq!(raw.len(), 26);
    let v = VisiStruct::from_bytes(schema, raw).expect("session");
    let fields = v.fields();
    assert_eq!(fields.len(), 6);

    let summary: Vec<(&str, &str, usize, usize)> = fields
        .iter()
        .map(|f| (f.name.as_str(), f.type_label.as_str(), f.length, f.offset))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("my_header", "Const(Bytes[4])", 4, 4),
            ("my_int", "Int32ul", 4, 8),
            ("my_string", "CString", 11, 19),
            ("my_enum", "Enum(Int8ul)", 1, 20),
            ("my_id", "Int16ul", 2, 22),
            ("my_value", "Enum(Int32ul)", 4, 26),
        ]
    );
    assert_eq!(fields[0].value, Value::Bytes(b"FAKE".to_vec()));
    assert_eq!(fields[2].value, Value::str("helloworld"));
    assert_eq!(fields[3].value, Value::str("ONE"));
    assert_eq!(fields[5].value, Value::str("HOT"));
    assert_eq!(fields[4].parent, "my_inner");
    assert_eq!(fields[4].nested, 1);
    assert_eq!(fields[3].parent, "");
    assert_eq!(fields[3].nested, 0);
    assert_offsets_consistent(&v);
}

#[test]
fn test_simple_struct_from_value_matches_from_bytes() {
    let (schema, value) = simple_struct();
    let from_value = VisiStruct::from_value(schema.clone(), value).expect("session");
    let from_bytes = VisiStruct::from_bytes(schema, from_value.raw().to_vec()).expect("session");
    assert_eq!(from_value.fields(), from_bytes.fields());
}

#[test]
fn test_heavily_nested_yields_one_field_per_leaf() {
    let (schema, value) = heavily_nested();
    let v = VisiStruct::from_value(schema, value).expect("session");
    let fields = v.fields();
    assert_eq!(fields.len(), 5);
    let shape: Vec<(&str, &str, usize)> = fields
        .iter()
        .map(|f| (f.name.as_str(), f.parent.as_str(), f.nested))
        .collect();
    assert_eq!(
        shape,
        vec![
            ("top_value", "", 0),
            ("one_value", "one", 1),
            ("two_value", "two", 2),
            ("three_value", "three", 3),
            ("bottom", "three", 3),
        ]
    );
    assert_eq!(fields[4].value, Value::I32(32));
    assert_offsets_consistent(&v);
}

#[test]
fn test_dynamic_array_element_fields() {
    let (schema, value) = array_struct(4);
    let raw = build(&schema, &value).expect("build");
    assert_eq!(raw.len(), 4 + 4 * (1 + 12));
    let v = VisiStruct::from_bytes(schema, raw).expect("session");
    let fields = v.fields();
    assert_eq!(fields.len(), 1 + 4 * 2);

    assert_eq!(fields[0].type_label, "Int32sb");
    for element in fields[1..].chunks(2) {
        assert_eq!(element[0].name, "a_flag");
        assert_eq!(element[0].type_label, "Enum(Int8sb)");
        assert_eq!(element[1].name, "nested_custom_array");
        assert_eq!(element[1].type_label, "Array[Float32l]");
        assert_eq!(element[1].length, 12);
        for f in element {
            assert_eq!(f.parent, "custom_array");
            assert_eq!(f.nested, 1);
        }
    }
    let flags: Vec<String> = fields[1..].iter().step_by(2).map(|f| f.value.to_string()).collect();
    assert_eq!(flags, vec!["ONE", "TWO", "THREE", "FOUR"]);
    assert_eq!(
        fields[4].value,
        Value::List(vec![Value::Float(1.5), Value::Float(-2.25), Value::Float(8.0)])
    );
    assert_offsets_consistent(&v);
}

#[test]
fn test_dynamic_array_of_zero_elements() {
    let (schema, value) = array_struct(0);
    let v = VisiStruct::from_value(schema, value).expect("session");
    assert_eq!(v.fields().len(), 1);
    assert_eq!(v.raw().len(), 4);
    assert_offsets_consistent(&v);
}

#[test]
fn test_scalar_array_sized_by_sibling() {
    let schema = Schema::new(vec![
        field("n", Node::Scalar(ScalarSpec::INT8UL)),
        field("samples", Node::array_sized_by("n", Node::scalar(ByteOrder::Big, NumKind::Float, 2))),
    ]);
    let v = VisiStruct::from_bytes(schema, vec![2, 0x3c, 0x00, 0xc0, 0x00]).expect("session");
    assert_eq!(v.fields()[1].type_label, "Array[Float16b]");
    assert_eq!(v.fields()[1].length, 4);
    assert_eq!(v.fields()[1].value, Value::List(vec![Value::Float(1.0), Value::Float(-2.0)]));
}

#[test]
fn test_nested_array_inside_struct_uses_local_scope() {
    // The count lives inside the same nested struct as the array.
    let schema = Schema::new(vec![field(
        "block",
        Node::structure(vec![
            field("len", Node::Scalar(ScalarSpec::INT8UL)),
            field(
                "entries",
                Node::array_sized_by("len", Node::structure(vec![field("b", Node::Scalar(ScalarSpec::INT8UL))])),
            ),
        ]),
    )]);
    let v = VisiStruct::from_bytes(schema, vec![3, 7, 8, 9]).expect("session");
    let fields = v.fields();
    assert_eq!(fields.len(), 4);
    assert_eq!((fields[0].parent.as_str(), fields[0].nested), ("block", 1));
    for f in &fields[1..] {
        assert_eq!((f.parent.as_str(), f.nested), ("entries", 2));
    }
    assert_eq!(fields[3].value, Value::U8(9));
}

#[test]
fn test_round_trip_layout() {
    for (schema, value) in [simple_struct(), heavily_nested(), array_struct(3)] {
        let config = Config::default();
        let direct = layout(&schema, &value, &config).expect("layout");
        let raw = build(&schema, &value).expect("build");
        let reparsed = parse(&schema, &raw).expect("parse");
        let via_bytes = layout(&schema, &reparsed, &config).expect("layout");
        assert_eq!(direct, via_bytes);
        assert_eq!(direct.last().map(|f| f.offset), Some(raw.len()));
    }
}

#[test]
fn test_colors_are_positional_and_optional() {
    let (schema, value) = simple_struct();
    let a = VisiStruct::from_value(schema.clone(), value.clone()).expect("session");
    let b = VisiStruct::from_value(schema.clone(), value.clone()).expect("session");
    let colors: Vec<_> = a.fields().iter().map(|f| f.color).collect();
    assert_eq!(colors, b.fields().iter().map(|f| f.color).collect::<Vec<_>>());
    assert_eq!(
        colors,
        vec![
            Some(Color::Cyan),
            Some(Color::Green),
            Some(Color::Blue),
            Some(Color::Yellow),
            Some(Color::Purple),
            Some(Color::Red),
        ]
    );

    let plain = VisiStruct::new(schema, None, Some(value), Config::default().with_color(false))
        .expect("session");
    assert!(plain.fields().iter().all(|f| f.color.is_none()));
    for (x, y) in plain.fields().iter().zip(a.fields()) {
        assert_eq!((&x.name, x.offset, x.length), (&y.name, y.offset, y.length));
    }
    assert!(plain
        .hex_rows(8)
        .iter()
        .flatten()
        .all(|cell| cell.color().is_none()));
}

#[test]
fn test_hex_rows_follow_field_ownership() {
    let (schema, value) = simple_struct();
    let v = VisiStruct::from_value(schema, value).expect("session");
    let rows = v.hex_rows(8);
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.len() == 8));
    assert_eq!(rows[0][0].text(), "46");
    assert_eq!(rows[0][3].color(), Some(Color::Cyan));
    assert_eq!(rows[0][4].color(), Some(Color::Green));
    // bytes 20..22 belong to my_id, 22..26 to my_value, 26..32 are placeholders
    assert_eq!(rows[2][4].color(), Some(Color::Purple));
    assert_eq!(rows[3][1].color(), Some(Color::Red));
    assert_eq!(rows[3][2], HexCell::Padding);
    assert_eq!(rows[3][7].text(), "..");
}

#[test]
fn test_trailing_bytes_are_uncolored() {
    let schema = Schema::new(vec![field("a", Node::Scalar(ScalarSpec::INT16UL))]);
    let v = VisiStruct::from_bytes(schema, vec![1, 0, 0xee, 0xff]).expect("session");
    assert_eq!(v.fields().len(), 1);
    let rows = v.hex_rows(4);
    assert_eq!(rows[0][1].color(), Some(Color::Cyan));
    assert_eq!(rows[0][2].color(), None);
    assert_eq!(rows[0][3].color(), None);
}

#[test]
fn test_display_lists_fields_and_hex() {
    let (schema, value) = simple_struct();
    let v = VisiStruct::new(schema, None, Some(value), Config::default().with_row_width(13))
        .expect("session");
    let text = v.to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Container:");
    assert_eq!(lines[1], "  my_header Const(Bytes[4]) : hex(46 41 4b 45) | sz=4 offset=4");
    assert_eq!(lines[5], "  my_inner:");
    assert_eq!(lines[6], "    my_id Int16ul : 3 | sz=2 offset=22");
    assert_eq!(lines.len(), 1 + 6 + 1 + 2);
    assert!(lines[8].starts_with(" 46  41  4b  45 "));
    assert!(!text.contains('\x1b'));
    assert!(v.render().contains("\x1b[36m"));
}

#[test]
fn test_length_prefixed_string_with_wide_prefix() {
    let schema = Schema::new(vec![field(
        "name",
        Node::pascal_string(
            LengthPrefix::Int(ScalarSpec::new(ByteOrder::Big, NumKind::Unsigned, 2)),
            Encoding::Utf8,
        ),
    )]);
    let v = VisiStruct::from_value(schema, Value::structure([("name", Value::str("abc"))]))
        .expect("session");
    assert_eq!(v.raw(), &[0, 3, b'a', b'b', b'c']);
    assert_eq!(v.fields()[0].length, 5);
    assert_eq!(v.fields()[0].type_label, "PascalString");
}

#[test]
fn test_construction_requires_input() {
    let (schema, _) = simple_struct();
    let err = VisiStruct::new(schema, None, None, Config::default()).unwrap_err();
    assert!(matches!(err, VisiError::Construction));
}

#[test]
fn test_codec_errors_propagate() {
    let (schema, value) = simple_struct();
    let err = VisiStruct::from_bytes(schema.clone(), b"FAKE\x11\x00".to_vec()).unwrap_err();
    assert!(matches!(err, VisiError::Decoding(_)));

    let mut broken = value.clone();
    if let Value::Struct(m) = &mut broken {
        m.remove("my_int");
    }
    let err = VisiStruct::from_value(schema.clone(), broken).unwrap_err();
    assert!(matches!(err, VisiError::Encoding(_)));

    let err = VisiStruct::from_bytes(schema, b"JUNK".to_vec()).unwrap_err();
    assert!(matches!(err, VisiError::Decoding(_)));
}

#[test]
fn test_unclassifiable_node_fails_whole_layout() {
    let schema = Schema::new(vec![
        field("a", Node::Scalar(ScalarSpec::INT8UL)),
        Subcon::anonymous(Node::Padding(2)),
        field("b", Node::Scalar(ScalarSpec::INT8UL)),
    ]);
    let err = VisiStruct::from_bytes(schema, vec![1, 0, 0, 2]).unwrap_err();
    match err {
        VisiError::Classification { shape, .. } => assert_eq!(shape, "Padding(2)"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_unknown_primitive_width_is_a_lookup_error() {
    let schema = Schema::new(vec![field("odd", Node::scalar(ByteOrder::Little, NumKind::Unsigned, 3))]);
    let value = Value::structure([("odd", Value::U32(1))]);
    let err = VisiStruct::new(schema, Some(vec![1, 0, 0]), Some(value), Config::default()).unwrap_err();
    assert!(matches!(err, VisiError::Lookup { width: 3, .. }));
}

#[test]
fn test_forward_reference_fails_through_session() {
    let schema = Schema::new(vec![
        field("items", Node::array_sized_by("n", Node::Scalar(ScalarSpec::INT8UL))),
        field("n", Node::Scalar(ScalarSpec::INT8UL)),
    ]);
    let value = Value::structure([("items", Value::List(vec![])), ("n", Value::U8(0))]);
    let err = VisiStruct::new(schema, Some(vec![0]), Some(value), Config::default()).unwrap_err();
    assert!(matches!(
        err,
        VisiError::DependencyResolution { reason: DependencyReason::ForwardReference, .. }
    ));
}

#[test]
fn test_fixed_count_array_of_structs() {
    let schema = Schema::new(vec![
        field("tag", Node::Scalar(ScalarSpec::INT8UL)),
        field(
            "points",
            Node::array(
                3,
                Node::structure(vec![
                    field("x", Node::Scalar(ScalarSpec::INT16UL)),
                    field("y", Node::Scalar(ScalarSpec::INT8SB)),
                ]),
            ),
        ),
    ]);
    let raw = vec![9, 1, 0, 0xff, 2, 0, 0xfe, 3, 0, 0xfd];
    let v = VisiStruct::from_bytes(schema, raw).expect("session");
    let fields = v.fields();
    assert_eq!(fields.len(), 1 + 3 * 2);
    assert_eq!((fields[0].parent.as_str(), fields[0].nested), ("", 0));
    for element in fields[1..].chunks(2) {
        assert_eq!((element[0].name.as_str(), element[0].length), ("x", 2));
        assert_eq!((element[1].name.as_str(), element[1].length), ("y", 1));
        for f in element {
            assert_eq!(f.parent, "points");
            assert_eq!(f.nested, 1);
        }
    }
    assert_eq!(fields[5].value, Value::U16(3));
    assert_eq!(fields[6].value, Value::I8(-3));
    assert_offsets_consistent(&v);
}
