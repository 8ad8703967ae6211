//! Tracker benchmarks
//!
//! - Transition function: pure table lookup plus payload move
//! - Dispatch: lock, reduce, broadcast, execute the entry effect
//! - Full cycle: Load through settled, including the spawned completion
//!
//! Run with: `cargo bench`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::expect_used)] // Benchmarks can use expect for setup

use async_tracker_core::{
    AsyncEvent, AsyncState, EventTag, StateTag,
    machine::{accepts, transition},
    reducer::{AsyncReducer, Reducer},
};
use async_tracker_runtime::{OperationTracker, Production};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

type State = AsyncState<u64, String, u64>;
type Event = AsyncEvent<u64, String, u64>;

fn echo(state: &State) -> Production<u64, String> {
    let context = state.context().copied().unwrap_or_default();
    Production::deferred(async move { Ok(context) })
}

/// Benchmark the pure transition function
fn benchmark_transition(c: &mut Criterion) {
    let mut group = c.benchmark_group("transition");
    group.throughput(Throughput::Elements(1));

    group.bench_function("accepts_table", |b| {
        b.iter(|| {
            let mut hits = 0_u8;
            for state in StateTag::ALL {
                for event in EventTag::ALL {
                    hits += u8::from(accepts(black_box(state), black_box(event)));
                }
            }
            hits
        });
    });

    group.bench_function("load_from_idle", |b| {
        b.iter(|| transition(black_box(State::Idle), black_box(Event::Load { context: 7 })));
    });

    group.bench_function("ignored_pair", |b| {
        b.iter(|| {
            transition(
                black_box(State::Loading { context: 7 }),
                black_box(Event::Load { context: 8 }),
            )
        });
    });

    group.bench_function("reducer_cycle", |b| {
        let reducer = AsyncReducer::<u64, String, u64>::new();
        let mut state = State::Idle;
        b.iter(|| {
            let _ = reducer.reduce(&mut state, black_box(Event::Load { context: 1 }));
            let _ = reducer.reduce(&mut state, black_box(Event::AsyncSuccess { data: 2 }));
            let _ = reducer.reduce(&mut state, black_box(Event::Reset));
        });
    });

    group.finish();
}

/// Benchmark dispatch through the tracker
fn benchmark_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime");

    group.bench_function("ignored_event", |b| {
        let tracker = OperationTracker::new(echo);

        b.to_async(&runtime).iter(|| async {
            let _ = tracker.send(black_box(Event::Reset)).await;
        });
    });

    group.bench_function("load_until_settled", |b| {
        let tracker = OperationTracker::new(echo);

        b.to_async(&runtime).iter(|| async {
            if let Ok(mut handle) = tracker.load(black_box(3)).await {
                handle.wait().await;
            }
            let _ = tracker.reset().await;
        });
    });

    group.bench_function("load_and_read_state", |b| {
        let tracker = OperationTracker::new(echo);

        b.to_async(&runtime).iter(|| async {
            if let Ok(mut handle) = tracker.load(black_box(5)).await {
                handle.wait().await;
            }
            let _data = tracker.state(|s| s.data().copied()).await;
            let _ = tracker.reset().await;
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_transition, benchmark_dispatch);
criterion_main!(benches);
