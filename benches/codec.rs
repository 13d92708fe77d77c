#![allow(unused)]
extern crate nrbf;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use nrbf::prelude::*;
use std::hint::black_box;

/// Builds a representative graph: a class-heavy object array plus a bulk
/// primitive array, the two shapes that dominate real BinaryFormatter output.
fn sample_graph() -> Graph {
    let mut graph = Graph::new();
    graph
        .define_library(LibraryId::new(1), "Sample, Version=1.0.0.0")
        .unwrap();

    let entries = 200;
    for i in 0..entries {
        graph
            .insert(
                ObjectId::new(100 + i),
                Node::class("Entry", Some(LibraryId::new(1)))
                    .with_member("id", NodeRef::Value(PrimitiveValue::Int32(i)))
                    .with_member("weight", NodeRef::Value(PrimitiveValue::Double(f64::from(i) * 0.5)))
                    .with_member("label", NodeRef::Object(ObjectId::new(2))),
            )
            .unwrap();
    }
    graph.insert(ObjectId::new(2), Node::Str("shared label".into())).unwrap();

    graph
        .insert(
            ObjectId::new(3),
            Node::Array(ArrayInstance {
                array_type: BinaryArrayType::Single,
                element_type: BinaryType::Primitive,
                element_info: AdditionalTypeInfo::Primitive(PrimitiveType::Int64),
                dimensions: vec![Dimension { extent: 4096, lower_bound: 0 }],
                elements: (0..4096)
                    .map(|v| NodeRef::Value(PrimitiveValue::Int64(v)))
                    .collect(),
            }),
        )
        .unwrap();

    let mut elements: Vec<NodeRef> = (0..entries)
        .map(|i| NodeRef::Object(ObjectId::new(100 + i)))
        .collect();
    elements.push(NodeRef::Object(ObjectId::new(3)));
    let extent = elements.len() as u32;
    graph
        .insert(
            ObjectId::new(4),
            Node::Array(ArrayInstance {
                array_type: BinaryArrayType::Single,
                element_type: BinaryType::Object,
                element_info: AdditionalTypeInfo::None,
                dimensions: vec![Dimension { extent, lower_bound: 0 }],
                elements,
            }),
        )
        .unwrap();
    graph.set_root(ObjectId::new(4));
    graph
}

fn bench_codec(c: &mut Criterion) {
    let graph = sample_graph();
    let bytes = encode(&graph).expect("Failed to encode sample graph");
    let stream_size = bytes.len();

    println!(
        "Benchmarking NRBF stream: {} bytes ({:.2} KB)",
        stream_size,
        stream_size as f64 / 1024.0
    );

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(stream_size as u64));
    group.bench_function("decode_stream", |b| {
        b.iter(|| {
            let graph = decode(black_box(&bytes)).unwrap();
            black_box(graph)
        });
    });
    group.finish();

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(stream_size as u64));
    group.bench_function("encode_graph", |b| {
        b.iter(|| {
            let bytes = encode(black_box(&graph)).unwrap();
            black_box(bytes)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
