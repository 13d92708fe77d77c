//! Hostile-input behavior: malformed, truncated and resource-exhausting
//! streams must fail fast with the precise error, allocate nothing driven by
//! declared lengths, and remain inspectable through the diagnostic mode.

use nrbf::prelude::*;
use nrbf::Writer;

fn header(out: &mut Writer) {
    out.write_le::<u8>(0x00);
    out.write_le::<i32>(1);
    out.write_le::<i32>(-1);
    out.write_le::<i32>(1);
    out.write_le::<i32>(0);
}

fn valid_string_stream() -> Vec<u8> {
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0x06);
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("hi").unwrap();
    out.write_le::<u8>(0x0B);
    out.into_bytes()
}

#[test]
fn empty_input_is_truncated() {
    assert!(matches!(decode(&[]), Err(Error::TruncatedStream { .. })));
}

#[test]
fn truncated_int32_member_is_truncated_stream() {
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0x04);
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("C").unwrap();
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("n").unwrap();
    out.write_le::<u8>(0); // Primitive
    out.write_le::<u8>(8); // Int32
    out.write_bytes(&[0x2A, 0x00]); // only 2 of the 4 value bytes

    assert!(matches!(
        decode(&out.into_bytes()),
        Err(Error::TruncatedStream { expected: 4, available: 2 })
    ));
}

#[test]
fn truncated_stream_without_message_end_fails() {
    let mut bytes = valid_string_stream();
    bytes.pop(); // drop MessageEnd
    assert!(matches!(decode(&bytes), Err(Error::TruncatedStream { .. })));
}

#[test]
fn unknown_tag_aborts_with_zero_nodes() {
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0xFF);
    let bytes = out.into_bytes();

    assert!(matches!(decode(&bytes), Err(Error::MalformedStream { .. })));

    // No partial graph mutation before the first invalid field.
    let diagnostic = decode_diagnostic(&bytes, &DecodeLimits::default());
    assert!(!diagnostic.is_clean());
    assert_eq!(diagnostic.graph.len(), 0);
}

#[test]
fn method_call_and_return_are_unsupported() {
    for tag in [0x15u8, 0x16] {
        let mut out = Writer::new();
        header(&mut out);
        out.write_le::<u8>(tag);
        assert!(matches!(
            decode(&out.into_bytes()),
            Err(Error::UnsupportedRecordType(t)) if t == tag
        ));
    }
}

#[test]
fn duplicate_object_id_is_fatal() {
    let mut out = Writer::new();
    header(&mut out);
    for _ in 0..2 {
        out.write_le::<u8>(0x06);
        out.write_le::<i32>(1);
        out.write_length_prefixed_string("dup").unwrap();
    }
    out.write_le::<u8>(0x0B);

    assert!(matches!(
        decode(&out.into_bytes()),
        Err(Error::DuplicateObjectId(id)) if id.value() == 1
    ));
}

#[test]
fn dangling_reference_is_fatal() {
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0x04);
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("C").unwrap();
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("m").unwrap();
    out.write_le::<u8>(2); // Object
    out.write_le::<u8>(0x09); // MemberReference
    out.write_le::<i32>(99); // never defined
    out.write_le::<u8>(0x0B);
    let bytes = out.into_bytes();

    assert!(matches!(
        decode(&bytes),
        Err(Error::DanglingReference(id)) if id.value() == 99
    ));

    // Forensics still sees the holder node.
    let diagnostic = decode_diagnostic(&bytes, &DecodeLimits::default());
    assert_eq!(diagnostic.graph.len(), 1);
    assert!(matches!(
        diagnostic.errors.as_slice(),
        [Error::DanglingReference(id)] if id.value() == 99
    ));
}

#[test]
fn dangling_root_is_fatal() {
    let mut out = Writer::new();
    out.write_le::<u8>(0x00);
    out.write_le::<i32>(7); // root id never defined
    out.write_le::<i32>(-1);
    out.write_le::<i32>(1);
    out.write_le::<i32>(0);
    out.write_le::<u8>(0x0B);

    assert!(matches!(
        decode(&out.into_bytes()),
        Err(Error::DanglingReference(id)) if id.value() == 7
    ));
}

#[test]
fn class_with_id_without_descriptor_is_unknown_class() {
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0x01); // ClassWithId
    out.write_le::<i32>(1);
    out.write_le::<i32>(42); // no class record introduced id 42

    assert!(matches!(
        decode(&out.into_bytes()),
        Err(Error::UnknownClassId(id)) if id.value() == 42
    ));
}

#[test]
fn stream_must_start_with_header() {
    let mut out = Writer::new();
    out.write_le::<u8>(0x06);
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("x").unwrap();
    assert!(matches!(
        decode(&out.into_bytes()),
        Err(Error::MalformedStream { .. })
    ));
}

#[test]
fn wrong_version_is_malformed() {
    let mut out = Writer::new();
    out.write_le::<u8>(0x00);
    out.write_le::<i32>(1);
    out.write_le::<i32>(-1);
    out.write_le::<i32>(2); // major 2
    out.write_le::<i32>(0);
    assert!(matches!(
        decode(&out.into_bytes()),
        Err(Error::MalformedStream { .. })
    ));
}

#[test]
fn duplicate_header_is_malformed() {
    let mut out = Writer::new();
    header(&mut out);
    header(&mut out);
    assert!(matches!(
        decode(&out.into_bytes()),
        Err(Error::MalformedStream { .. })
    ));
}

#[test]
fn member_position_records_invalid_at_top_level() {
    // ObjectNull directly after the header.
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0x0A);
    assert!(matches!(
        decode(&out.into_bytes()),
        Err(Error::MalformedStream { .. })
    ));

    // MemberPrimitiveTyped directly after the header.
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0x08);
    out.write_le::<u8>(8);
    out.write_le::<i32>(42);
    assert!(matches!(
        decode(&out.into_bytes()),
        Err(Error::MalformedStream { .. })
    ));
}

#[test]
fn null_run_overrunning_members_is_malformed() {
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0x04);
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("C").unwrap();
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("m").unwrap();
    out.write_le::<u8>(2); // Object
    out.write_le::<u8>(0x0D); // null run of 5 into a single slot
    out.write_le::<u8>(5);

    assert!(matches!(
        decode(&out.into_bytes()),
        Err(Error::MalformedStream { .. })
    ));
}

#[test]
fn undefined_library_reference_is_malformed() {
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0x05); // ClassWithMembersAndTypes
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("C").unwrap();
    out.write_le::<i32>(0);
    out.write_le::<i32>(9); // library 9 was never defined

    assert!(matches!(
        decode(&out.into_bytes()),
        Err(Error::MalformedStream { .. })
    ));
}

#[test]
fn library_redefinition_is_malformed() {
    let mut out = Writer::new();
    header(&mut out);
    for _ in 0..2 {
        out.write_le::<u8>(0x0C);
        out.write_le::<i32>(3);
        out.write_length_prefixed_string("Lib").unwrap();
    }
    assert!(matches!(
        decode(&out.into_bytes()),
        Err(Error::MalformedStream { .. })
    ));
}

#[test]
fn zero_object_id_is_malformed() {
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0x06);
    out.write_le::<i32>(0);
    out.write_length_prefixed_string("x").unwrap();
    assert!(matches!(
        decode(&out.into_bytes()),
        Err(Error::MalformedStream { .. })
    ));
}

#[test]
fn record_budget_is_enforced() {
    let limits = DecodeLimits {
        max_records: 2,
        ..DecodeLimits::default()
    };
    assert!(matches!(
        decode_with_limits(&valid_string_stream(), &limits),
        Err(Error::ResourceLimitExceeded { limit: 2, .. })
    ));
}

#[test]
fn node_budget_is_enforced() {
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0x10); // ArraySingleObject, 1 element
    out.write_le::<i32>(1);
    out.write_le::<i32>(1);
    out.write_le::<u8>(0x06); // element: inline string (second node)
    out.write_le::<i32>(2);
    out.write_length_prefixed_string("x").unwrap();
    out.write_le::<u8>(0x0B);

    let limits = DecodeLimits {
        max_nodes: 1,
        ..DecodeLimits::default()
    };
    assert!(matches!(
        decode_with_limits(&out.into_bytes(), &limits),
        Err(Error::ResourceLimitExceeded { limit: 1, .. })
    ));
}

#[test]
fn hostile_array_extent_fails_before_allocation() {
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0x0F); // ArraySinglePrimitive
    out.write_le::<i32>(1);
    out.write_le::<i32>(i32::MAX); // claims 2^31-1 elements
    out.write_le::<u8>(8); // Int32
    out.write_le::<i32>(42); // but carries just one
    let bytes = out.into_bytes();

    // Under default limits the extent budget trips first.
    assert!(matches!(
        decode(&bytes),
        Err(Error::ResourceLimitExceeded { .. })
    ));

    // With the budget lifted, the byte requirement is checked before any
    // element buffer is built.
    let limits = DecodeLimits {
        max_array_extent: usize::MAX,
        ..DecodeLimits::default()
    };
    assert!(matches!(
        decode_with_limits(&bytes, &limits),
        Err(Error::TruncatedStream { .. })
    ));
}

#[test]
fn rectangular_extent_product_is_bounded() {
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0x07); // BinaryArray
    out.write_le::<i32>(1);
    out.write_le::<u8>(2); // Rectangular
    out.write_le::<i32>(2); // rank
    out.write_le::<i32>(1 << 20); // extents multiply far past the budget
    out.write_le::<i32>(1 << 20);
    out.write_le::<u8>(0);
    out.write_le::<u8>(2); // Byte

    assert!(matches!(
        decode(&out.into_bytes()),
        Err(Error::ResourceLimitExceeded { .. })
    ));
}

#[test]
fn nesting_depth_is_bounded() {
    let mut out = Writer::new();
    header(&mut out);
    // Ten levels of inline classes, each the sole member of its parent.
    for level in 0..10 {
        out.write_le::<u8>(0x04);
        out.write_le::<i32>(level + 1);
        out.write_length_prefixed_string("Nest").unwrap();
        out.write_le::<i32>(1);
        out.write_length_prefixed_string("inner").unwrap();
        out.write_le::<u8>(2); // Object
    }
    out.write_le::<u8>(0x0A); // innermost member: null
    out.write_le::<u8>(0x0B);

    let limits = DecodeLimits {
        max_depth: 4,
        ..DecodeLimits::default()
    };
    assert!(matches!(
        decode_with_limits(&out.into_bytes(), &limits),
        Err(Error::ResourceLimitExceeded { limit: 4, .. })
    ));

    // The same stream is fine under the default depth budget.
    let mut out = Writer::new();
    header(&mut out);
    for level in 0..10 {
        out.write_le::<u8>(0x04);
        out.write_le::<i32>(level + 1);
        out.write_length_prefixed_string("Nest").unwrap();
        out.write_le::<i32>(1);
        out.write_length_prefixed_string("inner").unwrap();
        out.write_le::<u8>(2);
    }
    out.write_le::<u8>(0x0A);
    out.write_le::<u8>(0x0B);
    assert!(decode(&out.into_bytes()).is_ok());
}

#[test]
fn diagnostic_mode_keeps_partial_graph() {
    let mut out = Writer::new();
    header(&mut out);
    out.write_le::<u8>(0x06);
    out.write_le::<i32>(1);
    out.write_length_prefixed_string("survivor").unwrap();
    out.write_le::<u8>(0xFF); // garbage tag cuts the stream short

    let diagnostic = decode_diagnostic(&out.into_bytes(), &DecodeLimits::default());
    assert!(!diagnostic.is_clean());
    assert_eq!(diagnostic.graph.len(), 1);
    assert_eq!(
        diagnostic.graph.node(ObjectId::new(1)),
        Some(&Node::Str("survivor".into()))
    );
    assert!(matches!(
        diagnostic.errors[0],
        Error::MalformedStream { .. }
    ));
}

#[test]
fn diagnostic_mode_is_clean_on_valid_input() {
    let diagnostic = decode_diagnostic(&valid_string_stream(), &DecodeLimits::default());
    assert!(diagnostic.is_clean());
    assert_eq!(diagnostic.graph.root(), Some(&Node::Str("hi".into())));
}

#[test]
fn concurrent_decodes_share_no_state() {
    let bytes = valid_string_stream();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let bytes = bytes.clone();
            std::thread::spawn(move || decode(&bytes).unwrap().len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }
}
