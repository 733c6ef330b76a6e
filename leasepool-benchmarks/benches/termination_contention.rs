use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use leasepool_benchmarks::bench_pool;
use std::sync::Barrier;
use std::thread;

fn bench_racing_terminations(c: &mut Criterion) {
    let pool = bench_pool();
    let mut group = c.benchmark_group("termination_contention");

    for threads in [2_usize, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let handle = pool.get().expect("pool has capacity");
                let barrier = Barrier::new(threads);
                thread::scope(|scope| {
                    for n in 0..threads {
                        let handle = &handle;
                        let barrier = &barrier;
                        scope.spawn(move || {
                            barrier.wait();
                            if n % 2 == 0 {
                                handle.release().expect("release");
                            } else {
                                handle.discard().expect("discard");
                            }
                        });
                    }
                });
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_racing_terminations);
criterion_main!(benches);
