use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use slotring_rs::{Backoff, Config, RingBuffer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

const MSG_PER_PRODUCER: u64 = 100_000;

fn put_until_accepted(ring: &RingBuffer<u64>, mut item: u64) {
    let mut backoff = Backoff::new();
    while let Err(err) = ring.try_put(item) {
        item = err.into_inner();
        backoff.snooze();
    }
}

fn bench_uncontended(c: &mut Criterion) {
    let mut group = c.benchmark_group("uncontended");
    group.throughput(Throughput::Elements(1));

    let ring = RingBuffer::<u64>::new(1024).unwrap();
    group.bench_function("put_get", |b| {
        b.iter(|| {
            ring.put(black_box(42));
            black_box(ring.get());
        });
    });

    let empty = RingBuffer::<u64>::new(1024).unwrap();
    group.bench_function("get_empty", |b| {
        b.iter(|| black_box(empty.get()));
    });

    group.finish();
}

fn bench_spsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc");
    group.throughput(Throughput::Elements(MSG_PER_PRODUCER));

    group.bench_function("single_producer_consumer", |b| {
        b.iter(|| {
            let ring = Arc::new(RingBuffer::<u64>::new(4096).unwrap());

            let producer_ring = Arc::clone(&ring);
            let producer = thread::spawn(move || {
                for i in 0..MSG_PER_PRODUCER {
                    put_until_accepted(&producer_ring, i);
                }
            });

            let mut count = 0u64;
            while count < MSG_PER_PRODUCER {
                match ring.get() {
                    Some(v) => {
                        black_box(v);
                        count += 1;
                    }
                    None => std::hint::spin_loop(),
                }
            }

            producer.join().unwrap();
        });
    });

    group.finish();
}

fn bench_mpmc(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpmc");

    for threads in [2u64, 4] {
        let total = MSG_PER_PRODUCER * threads;
        group.throughput(Throughput::Elements(total));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{threads}P_{threads}C")),
            &threads,
            |b, &n| {
                b.iter(|| {
                    let config = Config::new(4096).with_claim_attempts(64);
                    let ring = Arc::new(RingBuffer::<u64>::with_config(config).unwrap());
                    let received = Arc::new(AtomicU64::new(0));

                    let mut handles = Vec::new();
                    for _ in 0..n {
                        let ring = Arc::clone(&ring);
                        handles.push(thread::spawn(move || {
                            for i in 0..MSG_PER_PRODUCER {
                                put_until_accepted(&ring, i);
                            }
                        }));
                    }
                    for _ in 0..n {
                        let ring = Arc::clone(&ring);
                        let received = Arc::clone(&received);
                        handles.push(thread::spawn(move || {
                            while received.load(Ordering::Relaxed) < total {
                                if let Some(v) = ring.get() {
                                    black_box(v);
                                    received.fetch_add(1, Ordering::Relaxed);
                                } else {
                                    std::hint::spin_loop();
                                }
                            }
                        }));
                    }

                    for h in handles {
                        h.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_uncontended, bench_spsc, bench_mpmc);
criterion_main!(benches);
