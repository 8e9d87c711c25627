//! Demo: a spawner pool hands idle worker handles to request threads.
//!
//! Run with `cargo run --bin pool_handoff --features tracing` to see trace
//! events whenever a retry budget runs out.

use slotring_rs::{init_tracing, Backoff, Config, PutErrorKind, RingBuffer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const SPAWNERS: u32 = 2;
const HANDLERS: usize = 4;
const WORKERS_PER_SPAWNER: u32 = 50_000;

#[derive(Debug)]
struct Worker {
    pid: u32,
    served: AtomicU64,
}

fn main() {
    init_tracing();

    let config = Config::new(100).with_metrics(true);
    let ring = match RingBuffer::<Arc<Worker>>::with_config(config) {
        Ok(ring) => Arc::new(ring),
        Err(err) => {
            eprintln!("invalid ring configuration: {err}");
            std::process::exit(1);
        }
    };
    println!(
        "ring: requested {} slots, got {} (mask {:#x})",
        config.capacity,
        ring.capacity(),
        ring.mask()
    );

    let total = u64::from(SPAWNERS * WORKERS_PER_SPAWNER);
    let handled = Arc::new(AtomicU64::new(0));
    let start = Instant::now();

    let spawners: Vec<_> = (0..SPAWNERS)
        .map(|s| {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let mut full_waits = 0u64;
                for n in 0..WORKERS_PER_SPAWNER {
                    let mut worker = Arc::new(Worker {
                        pid: s * WORKERS_PER_SPAWNER + n,
                        served: AtomicU64::new(0),
                    });
                    let mut backoff = Backoff::new();
                    loop {
                        match ring.try_put(worker) {
                            Ok(()) => break,
                            Err(err) => {
                                if err.kind == PutErrorKind::Full {
                                    full_waits += 1;
                                }
                                worker = err.into_inner();
                                backoff.snooze();
                            }
                        }
                    }
                }
                full_waits
            })
        })
        .collect();

    let handlers: Vec<_> = (0..HANDLERS)
        .map(|_| {
            let ring = Arc::clone(&ring);
            let handled = Arc::clone(&handled);
            thread::spawn(move || {
                let (mut local, mut pid_sum) = (0u64, 0u64);
                while handled.load(Ordering::Acquire) < total {
                    match ring.get() {
                        Some(worker) => {
                            worker.served.fetch_add(1, Ordering::Relaxed);
                            handled.fetch_add(1, Ordering::AcqRel);
                            pid_sum += u64::from(worker.pid);
                            local += 1;
                        }
                        None => thread::yield_now(),
                    }
                }
                (local, pid_sum)
            })
        })
        .collect();

    let full_waits: u64 = spawners.into_iter().map(|h| h.join().unwrap_or(0)).sum();
    let results: Vec<(u64, u64)> = handlers
        .into_iter()
        .map(|h| h.join().unwrap_or((0, 0)))
        .collect();
    let per_handler: Vec<u64> = results.iter().map(|&(n, _)| n).collect();
    let pid_sum: u64 = results.iter().map(|&(_, sum)| sum).sum();
    let expected_sum = total * (total - 1) / 2;

    let elapsed = start.elapsed();
    let m = ring.metrics();
    println!("handed off {total} workers in {elapsed:?}");
    println!("per handler: {per_handler:?}");
    println!("spawner waits on full ring: {full_waits}");
    println!(
        "metrics: puts={} gets={} full={} empty={} contention={} slot_busy={}",
        m.puts,
        m.gets,
        m.full_rejections,
        m.empty_returns,
        m.contention_retries,
        m.slot_busy_failures
    );
    println!(
        "every pid seen exactly once: {} (ring empty: {})",
        pid_sum == expected_sum,
        ring.is_empty()
    );
}
