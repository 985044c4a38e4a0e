use std::{hint::black_box, sync::Arc};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use stockwatch::{EmailAlert, FnSubscriber, MemorySink, ObservableRegistry, SubscriberRef};

fn registry_with(count: usize) -> (ObservableRegistry, Vec<SubscriberRef>) {
    let mut registry = ObservableRegistry::new("bench");
    let subs: Vec<SubscriberRef> = (0..count)
        .map(|i| FnSubscriber::shared(format!("s{i}"), || Ok(())))
        .collect();
    for sub in &subs {
        registry.add(sub.clone());
    }
    (registry, subs)
}

fn bench_set_quantity(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_quantity");
    for count in [0usize, 1, 10, 100] {
        let (mut registry, _subs) = registry_with(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| registry.set_quantity(black_box(5)).unwrap())
        });
    }
    group.finish();
}

fn bench_silent_quantity(c: &mut Criterion) {
    let (mut registry, _subs) = registry_with(100);
    c.bench_function("set_quantity_zero_100_subs", |b| {
        b.iter(|| registry.set_quantity(black_box(0)).unwrap())
    });
}

fn bench_email_broadcast(c: &mut Criterion) {
    let sink = Arc::new(MemorySink::new());
    let mut registry = ObservableRegistry::new("bench");
    for i in 0..10 {
        let alert = EmailAlert::new(format!("user{i}@example.com"), registry.source(), sink.clone())
            .unwrap()
            .into_shared();
        registry.add(alert);
    }
    c.bench_function("email_broadcast_10", |b| {
        b.iter(|| {
            sink.clear();
            registry.notify_all().unwrap()
        })
    });
}

fn bench_remove_last(c: &mut Criterion) {
    let (mut registry, subs) = registry_with(100);
    let last = subs[99].clone();
    c.bench_function("remove_then_add_last_of_100", |b| {
        b.iter(|| {
            registry.remove(black_box(&last)).unwrap();
            registry.add(last.clone());
        })
    });
}

criterion_group!(
    benches,
    bench_set_quantity,
    bench_silent_quantity,
    bench_email_broadcast,
    bench_remove_last
);
criterion_main!(benches);
