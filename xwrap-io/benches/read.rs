use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use xwrap_io::{BufferedRequest, TypeDesc, XmlInputFormatter};
use xwrap_test_utils::{int_sequence_document, nested_int_sequence_document, utf16le_with_bom};

fn groups(count: usize, width: usize) -> Vec<Vec<i32>> {
    (0..count)
        .map(|g| (0..width).map(|i| (g * width + i) as i32).collect())
        .collect()
}

fn bench_flat_sequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_sequence");
    let formatter = XmlInputFormatter::default();
    let declared = TypeDesc::sequence(TypeDesc::Int);

    for count in [100usize, 10_000] {
        let items: Vec<i32> = (0..count as i32).collect();
        let doc = int_sequence_document(&items).into_bytes();

        group.throughput(Throughput::Bytes(doc.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &doc, |b, doc| {
            b.iter(|| {
                let mut request = BufferedRequest::new(Some("application/xml"), doc.clone());
                black_box(formatter.read(&mut request, &declared).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_nested_sequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_sequence");
    let formatter = XmlInputFormatter::default();
    let declared = TypeDesc::sequence(TypeDesc::sequence(TypeDesc::Int));
    let doc = nested_int_sequence_document(&groups(200, 50)).into_bytes();

    group.throughput(Throughput::Bytes(doc.len() as u64));

    // Surrogate substitution plus unwrap
    group.bench_function("wrapped", |b| {
        b.iter(|| {
            let mut request = BufferedRequest::new(Some("application/xml"), doc.clone());
            black_box(formatter.read(&mut request, &declared).unwrap());
        });
    });

    // Same document read as a plain list, no provider involved
    let plain = TypeDesc::list(TypeDesc::list(TypeDesc::Int));
    group.bench_function("plain_list", |b| {
        b.iter(|| {
            let mut request = BufferedRequest::new(Some("application/xml"), doc.clone());
            black_box(formatter.read(&mut request, &plain).unwrap());
        });
    });

    group.finish();
}

fn bench_utf16_body(c: &mut Criterion) {
    let formatter = XmlInputFormatter::default();
    let declared = TypeDesc::sequence(TypeDesc::Int);
    let items: Vec<i32> = (0..10_000).collect();
    let doc = utf16le_with_bom(&int_sequence_document(&items));

    c.bench_function("utf16_sequence", |b| {
        b.iter(|| {
            let mut request = BufferedRequest::new(Some("text/xml"), doc.clone());
            black_box(formatter.read(&mut request, &declared).unwrap());
        });
    });
}

fn bench_resolution(c: &mut Criterion) {
    let formatter = XmlInputFormatter::default();
    let mut declared = TypeDesc::Int;
    for _ in 0..8 {
        declared = TypeDesc::sequence(declared);
    }

    c.bench_function("resolve_depth_8", |b| {
        b.iter(|| black_box(formatter.resolve_provider(&declared).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_flat_sequence,
    bench_nested_sequence,
    bench_utf16_body,
    bench_resolution
);
criterion_main!(benches);
