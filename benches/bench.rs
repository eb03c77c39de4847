use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use task_chain::collections::ConcurrentVec;
use task_chain::Task;

use std::sync::Arc;
use std::thread;

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("push contention");
    for threads in [1, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &t| {
            b.iter(|| push_test(black_box(t), black_box(1000)))
        });
    }
    group.finish();

    c.bench_function("chain 10", |b| b.iter(|| chain_test(black_box(10))));
    c.bench_function("chain 100", |b| b.iter(|| chain_test(black_box(100))));
    c.bench_function("snapshot 1000", |b| {
        let list: ConcurrentVec<u64> = (0..1000).collect();
        b.iter(|| list.iter().sum::<u64>())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

fn push_test(threads: usize, per_thread: usize) {
    let list = Arc::new(ConcurrentVec::with_capacity(threads * per_thread));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let list = list.clone();
            thread::spawn(move || {
                for n in 0..per_thread {
                    list.push(n);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(list.len(), threads * per_thread);
}

fn chain_test(len: usize) {
    let mut task = Task::ready(0usize);
    for _ in 0..len {
        task = task.then(|n| n + 1);
    }
    assert_eq!(task.wait().unwrap(), len);
}
