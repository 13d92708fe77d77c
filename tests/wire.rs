//! Wire-format conformance: hand-built byte streams decode to the expected
//! graphs, and the minimal encodings are byte-exact.

use nrbf::prelude::*;
use nrbf::Writer;

/// Header record with root id 1, the conventional -1 header id, version 1.0.
fn header(out: &mut Writer) {
    out.write_le::<u8>(0x00);
    out.write_le::<i32>(1);
    out.write_le::<i32>(-1);
    out.write_le::<i32>(1);
    out.write_le::<i32>(0);
}

#[test]
fn minimal_string_stream_decodes() {
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0x06); // BinaryObjectString
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("hi").unwrap();
    out.write_le::<u8>(0x0B); // MessageEnd

    let graph = decode(&out.into_bytes()).unwrap();
    assert_eq!(graph.root(), Some(&Node::Str("hi".into())));
    assert_eq!(graph.len(), 1);
}

#[test]
fn minimal_string_stream_encodes_byte_exact() {
    let mut graph = Graph::new();
    graph.insert(ObjectId::new(1), Node::Str("hi".into())).unwrap();
    graph.set_root(ObjectId::new(1));

    let expected = [
        0x00, // SerializedStreamHeader
        0x01, 0x00, 0x00, 0x00, // root id 1
        0xFF, 0xFF, 0xFF, 0xFF, // header id -1
        0x01, 0x00, 0x00, 0x00, // major 1
        0x00, 0x00, 0x00, 0x00, // minor 0
        0x06, // BinaryObjectString
        0x01, 0x00, 0x00, 0x00, // object id 1
        0x02, b'h', b'i', // "hi"
        0x0B, // MessageEnd
    ];
    assert_eq!(encode(&graph).unwrap(), expected);
}

#[test]
fn point_stream_with_library_decodes() {
    let mut out = Writer::new();
    header(&mut out);

    out.write_le::<u8>(0x0C); // BinaryLibrary
    out.write_le::<i32>(2);
    out.write_length_prefixed_string("Geometry, Version=1.0.0.0").unwrap();

    out.write_le::<u8>(0x05); // ClassWithMembersAndTypes
    out.write_le::<i32>(1); // object id
    out.write_length_prefixed_string("Point").unwrap();
    out.write_le::<i32>(2); // member count
    out.write_length_prefixed_string("x").unwrap();
    out.write_length_prefixed_string("y").unwrap();
    out.write_le::<u8>(0); // x: Primitive
    out.write_le::<u8>(0); // y: Primitive
    out.write_le::<u8>(8); // x: Int32
    out.write_le::<u8>(8); // y: Int32
    out.write_le::<i32>(2); // library id
    out.write_le::<i32>(5); // x = 5
    out.write_le::<i32>(7); // y = 7

    out.write_le::<u8>(0x0B);

    let graph = decode(&out.into_bytes()).unwrap();
    let instance = graph.root().unwrap().as_class().unwrap();
    assert_eq!(instance.type_name, "Point");
    assert_eq!(instance.member("x"), Some(&NodeRef::Value(PrimitiveValue::Int32(5))));
    assert_eq!(instance.member("y"), Some(&NodeRef::Value(PrimitiveValue::Int32(7))));
    assert_eq!(
        graph.library(instance.library.unwrap()),
        Some("Geometry, Version=1.0.0.0")
    );
}

#[test]
fn self_reference_stream_decodes() {
    let mut out = Writer::new();
    header(&mut out);

    out.write_le::<u8>(0x04); // SystemClassWithMembersAndTypes
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("Node").unwrap();
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("next").unwrap();
    out.write_le::<u8>(2); // Object
    out.write_le::<u8>(0x09); // MemberReference
    out.write_le::<i32>(1); // to itself
    out.write_le::<u8>(0x0B);

    let graph = decode(&out.into_bytes()).unwrap();
    let instance = graph.root().unwrap().as_class().unwrap();
    assert_eq!(instance.member("next"), Some(&NodeRef::Object(ObjectId::new(1))));
}

#[test]
fn forward_reference_resolves_after_definition() {
    let mut out = Writer::new();
    header(&mut out);

    // Root class references id 2 before id 2 is defined.
    out.write_le::<u8>(0x04);
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("Holder").unwrap();
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("value").unwrap();
    out.write_le::<u8>(2); // Object
    out.write_le::<u8>(0x09); // MemberReference
    out.write_le::<i32>(2);

    // The referent arrives later as a top-level record.
    out.write_le::<u8>(0x06);
    out.write_le::<i32>(2);
    out.write_length_prefixed_string("later").unwrap();

    out.write_le::<u8>(0x0B);

    let graph = decode(&out.into_bytes()).unwrap();
    let instance = graph.root().unwrap().as_class().unwrap();
    let NodeRef::Object(target) = instance.member("value").unwrap() else {
        panic!("expected a reference");
    };
    assert_eq!(graph.node(*target), Some(&Node::Str("later".into())));
}

#[test]
fn class_with_id_reuses_descriptor() {
    let mut out = Writer::new();
    header(&mut out);

    // Root: object array of two Entry instances.
    out.write_le::<u8>(0x10); // ArraySingleObject
    out.write_le::<i32>(1);
    out.write_le::<i32>(2);

    out.write_le::<u8>(0x04); // first Entry defines the descriptor
    out.write_le::<i32>(2);
    out.write_length_prefixed_string("Entry").unwrap();
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("n").unwrap();
    out.write_le::<u8>(0); // Primitive
    out.write_le::<u8>(8); // Int32
    out.write_le::<i32>(41);

    out.write_le::<u8>(0x01); // ClassWithId
    out.write_le::<i32>(3); // new object id
    out.write_le::<i32>(2); // metadata id of the first Entry
    out.write_le::<i32>(42);

    out.write_le::<u8>(0x0B);

    let graph = decode(&out.into_bytes()).unwrap();
    let array = graph.root().unwrap().as_array().unwrap();
    assert_eq!(array.elements.len(), 2);

    let NodeRef::Object(second) = &array.elements[1] else {
        panic!("expected a reference");
    };
    let instance = graph.node(*second).unwrap().as_class().unwrap();
    assert_eq!(instance.type_name, "Entry");
    assert_eq!(instance.member("n"), Some(&NodeRef::Value(PrimitiveValue::Int32(42))));
}

#[test]
fn null_run_spans_consecutive_members() {
    let mut out = Writer::new();
    header(&mut out);

    out.write_le::<u8>(0x04);
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("Triple").unwrap();
    out.write_le::<i32>(3);
    out.write_length_prefixed_string("a").unwrap();
    out.write_length_prefixed_string("b").unwrap();
    out.write_length_prefixed_string("c").unwrap();
    out.write_le::<u8>(2); // a: Object
    out.write_le::<u8>(2); // b: Object
    out.write_le::<u8>(2); // c: Object

    // One ObjectNullMultiple256 record fills all three member slots.
    out.write_le::<u8>(0x0D);
    out.write_le::<u8>(3);

    out.write_le::<u8>(0x0B);

    let graph = decode(&out.into_bytes()).unwrap();
    let instance = graph.root().unwrap().as_class().unwrap();
    assert!(instance.members.iter().all(|(_, v)| *v == NodeRef::Null));
}

#[test]
fn untyped_class_members_decode_as_references() {
    // ClassWithMembers (no member types): members default to Object-typed
    // id-referenced values.
    let mut out = Writer::new();
    header(&mut out);

    out.write_le::<u8>(0x0C);
    out.write_le::<i32>(4);
    out.write_length_prefixed_string("Lib").unwrap();

    out.write_le::<u8>(0x03); // ClassWithMembers
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("Opaque").unwrap();
    out.write_le::<i32>(2);
    out.write_length_prefixed_string("first").unwrap();
    out.write_length_prefixed_string("second").unwrap();
    out.write_le::<i32>(4); // library id

    out.write_le::<u8>(0x06); // first: inline string
    out.write_le::<i32>(2);
    out.write_length_prefixed_string("payload").unwrap();
    out.write_le::<u8>(0x0A); // second: null

    out.write_le::<u8>(0x0B);

    let graph = decode(&out.into_bytes()).unwrap();
    let instance = graph.root().unwrap().as_class().unwrap();
    assert_eq!(instance.member("first"), Some(&NodeRef::Object(ObjectId::new(2))));
    assert_eq!(instance.member("second"), Some(&NodeRef::Null));
    assert_eq!(graph.node(ObjectId::new(2)), Some(&Node::Str("payload".into())));
}

#[test]
fn library_record_allowed_before_inline_member_object() {
    let mut out = Writer::new();
    header(&mut out);

    out.write_le::<u8>(0x04); // Holder with one Object member
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("Holder").unwrap();
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("inner").unwrap();
    out.write_le::<u8>(2);

    // BinaryFormatter interleaves library records with member records.
    out.write_le::<u8>(0x0C);
    out.write_le::<i32>(3);
    out.write_length_prefixed_string("InnerLib").unwrap();

    out.write_le::<u8>(0x05); // inline ClassWithMembersAndTypes in member position
    out.write_le::<i32>(2);
    out.write_length_prefixed_string("Inner").unwrap();
    out.write_le::<i32>(0); // no members
    out.write_le::<i32>(3); // library id

    out.write_le::<u8>(0x0B);

    let graph = decode(&out.into_bytes()).unwrap();
    let holder = graph.root().unwrap().as_class().unwrap();
    assert_eq!(holder.member("inner"), Some(&NodeRef::Object(ObjectId::new(2))));
    let inner = graph.node(ObjectId::new(2)).unwrap().as_class().unwrap();
    assert_eq!(inner.type_name, "Inner");
    assert_eq!(graph.library(inner.library.unwrap()), Some("InnerLib"));
}

#[test]
fn member_primitive_typed_decodes_inline() {
    let mut out = Writer::new();
    header(&mut out);

    out.write_le::<u8>(0x04);
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("Boxed").unwrap();
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("value").unwrap();
    out.write_le::<u8>(2); // Object

    out.write_le::<u8>(0x08); // MemberPrimitiveTyped
    out.write_le::<u8>(6); // Double
    out.write_le::<f64>(2.5);

    out.write_le::<u8>(0x0B);

    let graph = decode(&out.into_bytes()).unwrap();
    let instance = graph.root().unwrap().as_class().unwrap();
    assert_eq!(
        instance.member("value"),
        Some(&NodeRef::Value(PrimitiveValue::Double(2.5)))
    );
}

#[test]
fn jagged_array_with_inline_nested_arrays_decodes() {
    let mut out = Writer::new();
    header(&mut out);

    out.write_le::<u8>(0x07); // BinaryArray
    out.write_le::<i32>(1);
    out.write_le::<u8>(1); // Jagged
    out.write_le::<i32>(1); // rank
    out.write_le::<i32>(2); // extent
    out.write_le::<u8>(7); // element: PrimitiveArray
    out.write_le::<u8>(8); // of Int32

    // Each element is a nested array record with its own id.
    out.write_le::<u8>(0x0F); // ArraySinglePrimitive
    out.write_le::<i32>(2);
    out.write_le::<i32>(2);
    out.write_le::<u8>(8); // Int32
    out.write_le::<i32>(10);
    out.write_le::<i32>(20);

    out.write_le::<u8>(0x0F);
    out.write_le::<i32>(3);
    out.write_le::<i32>(1);
    out.write_le::<u8>(8);
    out.write_le::<i32>(30);

    out.write_le::<u8>(0x0B);

    let graph = decode(&out.into_bytes()).unwrap();
    let outer = graph.root().unwrap().as_array().unwrap();
    assert_eq!(outer.elements.len(), 2);
    let NodeRef::Object(first) = &outer.elements[0] else {
        panic!("expected a nested array reference");
    };
    let inner = graph.node(*first).unwrap().as_array().unwrap();
    assert_eq!(
        inner.elements,
        vec![
            NodeRef::Value(PrimitiveValue::Int32(10)),
            NodeRef::Value(PrimitiveValue::Int32(20)),
        ]
    );
}

#[test]
fn trailing_bytes_after_message_end_are_ignored() {
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0x06);
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("x").unwrap();
    out.write_le::<u8>(0x0B);
    out.write_bytes(&[0xAB, 0xCD, 0xEF]);

    assert!(decode(&out.into_bytes()).is_ok());
}
