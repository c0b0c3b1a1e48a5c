//! Benchmark suite for danci-propagation
//!
//! Run with: cargo bench

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use danci_propagation::{
    aggregate_by_target, propagate_update, IndirectUpdate, ObjectPropagationState, ObjectStates,
    ObjectUpdateEvent, PropagationConfig, PropagationEngine, TransferRelation, TransferType,
    UpdateType,
};

/// Every node links to the next `fan_out` nodes, wrapping around.
fn dense_graph(nodes: usize, fan_out: usize) -> (Vec<TransferRelation>, ObjectStates) {
    let now = Utc::now();
    let id = |i: usize| format!("w{i}");

    let relations = (0..nodes)
        .flat_map(|i| {
            (1..=fan_out).map(move |k| {
                let t = TransferType::ALL[(i + k) % TransferType::ALL.len()];
                TransferRelation::new(id(i), id((i + k) % nodes), t, 0.9, 0.9)
            })
        })
        .collect();
    let states = (0..nodes)
        .map(|i| (id(i), ObjectPropagationState::new(id(i), "lexical", now)))
        .collect();
    (relations, states)
}

fn event(source: &str) -> ObjectUpdateEvent {
    ObjectUpdateEvent {
        source_object_id: source.into(),
        update_type: UpdateType::Assessment,
        previous_stage: 2,
        new_stage: 3,
        accuracy: 1.0,
        response_time_ms: 1200,
        component: "lexical".into(),
        timestamp: Utc::now(),
    }
}

fn bench_propagate_update(c: &mut Criterion) {
    let config = PropagationConfig {
        max_depth: 3,
        min_magnitude: 0.01,
        ..PropagationConfig::default()
    };
    let mut group = c.benchmark_group("propagate_update");
    for fan_out in [4usize, 16, 64] {
        let (relations, states) = dense_graph(500, fan_out);
        let e = event("w0");
        group.bench_with_input(BenchmarkId::from_parameter(fan_out), &fan_out, |b, _| {
            b.iter(|| propagate_update(black_box(&e), &relations, &states, &config))
        });
    }
    group.finish();
}

fn bench_aggregate_by_target(c: &mut Criterion) {
    let updates: Vec<IndirectUpdate> = (0..400)
        .map(|i| IndirectUpdate {
            target_object_id: format!("w{}", i % 40),
            source_object_id: format!("s{i}"),
            relationship_type: TransferType::ALL[i % TransferType::ALL.len()],
            magnitude: 0.3,
            difficulty_adjustment: -0.15,
            stability_boost: 0.6,
            priority_adjustment: -0.09,
            confidence: 0.8,
            depth: 1,
            reason: String::new(),
        })
        .collect();

    c.bench_function("aggregate_by_target/400x40", |b| {
        b.iter(|| aggregate_by_target(black_box(&updates)))
    });
}

fn bench_propagate_batch(c: &mut Criterion) {
    let engine = PropagationEngine::with_defaults();
    let (relations, states) = dense_graph(500, 16);
    let events: Vec<_> = (0..64).map(|i| event(&format!("w{}", i * 7))).collect();

    c.bench_function("propagate_batch/64", |b| {
        b.iter(|| engine.propagate_batch(black_box(&events), &relations, &states))
    });
}

criterion_group!(
    benches,
    bench_propagate_update,
    bench_aggregate_by_target,
    bench_propagate_batch
);
criterion_main!(benches);
