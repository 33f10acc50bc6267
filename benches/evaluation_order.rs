//! Benchmarks for network ordering and link propagation
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use voreen::link::IdEvaluator;
use voreen::prelude::*;

fn chain(registry: &Registry, class: &str, len: usize) -> ProcessorNetwork {
    let mut network = ProcessorNetwork::new();
    let mut previous = None;
    for i in 0..len {
        let id = network.add(registry, class, Some(&format!("P{}", i))).unwrap();
        if let Some(prev) = previous {
            match class {
                "Passthrough" => network.connect(prev, "output", id, "input").unwrap(),
                _ => network.connect(prev, "image.output", id, "image.input").unwrap(),
            };
        }
        previous = Some(id);
    }
    network
}

fn bench_evaluation_order(c: &mut Criterion) {
    let registry = Registry::with_builtins();
    let mut group = c.benchmark_group("evaluation_order");

    for size in [10, 100, 1000].iter() {
        let network = chain(&registry, "Passthrough", *size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(TopologyAnalyzer::new(&network).evaluation_order().unwrap()))
        });
    }

    group.finish();
}

fn bench_link_propagation(c: &mut Criterion) {
    let registry = Registry::with_builtins();
    let mut group = c.benchmark_group("link_propagation");

    for size in [10, 100].iter() {
        let mut network = chain(&registry, "Blur", *size);
        let keys: Vec<PropertyKey> = (0..*size)
            .map(|i| network.key(&format!("P{}", i), "sigma").unwrap())
            .collect();
        network.link_all(&keys, &IdEvaluator, true).unwrap();

        let mut sigma = 0.0;
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                sigma = if sigma > 10.0 { 0.0 } else { sigma + 0.5 };
                black_box(network.set_property(&keys[0], Value::Float(sigma)).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evaluation_order, bench_link_propagation);

criterion_main!(benches);
