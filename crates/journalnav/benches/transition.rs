use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use journalnav::{EntryId, EntryList, EntryRecord, MemoryViewPort, Navigator, PageDescriptor};

const ORIGIN: &str = "http://localhost:8080";

fn entries(n: usize) -> EntryList {
    (0..n)
        .map(|i| EntryRecord::new(format!("Entry title {}", i), "x".repeat(512)))
        .collect()
}

fn bench_entry_transition(c: &mut Criterion) {
    let mut group = c.benchmark_group("transition");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("entry_push_history", |b| {
        let mut nav = Navigator::new(MemoryViewPort::new(ORIGIN), entries(100), ORIGIN);
        let mut counter = 0u32;
        b.iter(|| {
            let num = EntryId::new(counter % 100 + 1).unwrap();
            black_box(nav.transition(Some(PageDescriptor::entry(num)), false).ok());
            counter += 1;
        });
    });

    group.bench_function("entry_from_history", |b| {
        let mut nav = Navigator::new(MemoryViewPort::new(ORIGIN), entries(100), ORIGIN);
        let mut counter = 0u32;
        b.iter(|| {
            let num = EntryId::new(counter % 100 + 1).unwrap();
            black_box(nav.transition(Some(PageDescriptor::entry(num)), true).ok());
            counter += 1;
        });
    });

    group.finish();
}

fn bench_fragment_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragment");
    group.throughput(Throughput::Elements(1));

    group.bench_function("from_url", |b| {
        b.iter(|| black_box(PageDescriptor::from_url("http://localhost:8080#entry42").ok()));
    });

    group.finish();
}

criterion_group!(benches, bench_entry_transition, bench_fragment_parse);
criterion_main!(benches);
