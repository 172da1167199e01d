use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use micro_message::protocol::AcceptList;
use std::hint::black_box;

const ACCEPT_HEADERS: [(&str, &str); 3] = [
    ("browser", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"),
    ("api", "application/json"),
    (
        "weighted",
        "text/plain;q=0.5, text/html, text/x-dvi;q=0.8, text/x-c, application/json;q=0.95, application/xml;q=0.85, */*;q=0.1",
    ),
];

const ACCEPT_LANGUAGE: &str = "en_US,en;q=0.8,fr-CA;q=0.6,fr;q=0.4,es_MX;q=0.3";

fn benchmark_accept_parser(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("accept_parser");

    for (name, header) in ACCEPT_HEADERS {
        group.bench_with_input(BenchmarkId::from_parameter(name), header, |b, header| {
            b.iter(|| black_box(AcceptList::parse(black_box(header))));
        });
    }

    group.bench_function("language", |b| {
        b.iter(|| black_box(AcceptList::parse_language(black_box(ACCEPT_LANGUAGE))));
    });

    group.finish();
}

criterion_group!(accept, benchmark_accept_parser);
criterion_main!(accept);
