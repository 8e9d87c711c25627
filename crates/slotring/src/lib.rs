//! slotring-rs - Bounded Lock-Free MPMC Slot Ring
//!
//! A fixed-capacity circular buffer for handing opaque work-item handles
//! (process-pool entries, `Arc`s, indices) between producer and consumer
//! threads without locks.
//!
//! # Key Features
//!
//! - Power-of-two capacity, slot addressed by `cursor & mask`
//! - Free-running `u32` cursors; crossing 2^32 is normal operation
//! - Per-slot `(generation, state)` word: a cursor is only claimed once its
//!   slot is ready, so a failed call never strands a cursor value
//! - Two fixed retry budgets per call instead of blocking
//! - Opt-in metrics, feature-gated tracing
//!
//! # Example
//!
//! ```
//! use slotring_rs::{Config, RingBuffer};
//! use std::sync::Arc;
//!
//! struct Worker {
//!     pid: u32,
//! }
//!
//! let ring = RingBuffer::with_config(Config::new(16).with_metrics(true)).unwrap();
//! let worker = Arc::new(Worker { pid: 4242 });
//!
//! assert!(ring.put(Arc::clone(&worker)));
//!
//! if let Some(idle) = ring.get() {
//!     assert_eq!(idle.pid, 4242);
//! }
//! assert_eq!(ring.metrics().gets, 1);
//! ```

mod backoff;
mod config;
mod error;
mod invariants;
mod metrics;
mod ring;
mod slot;
mod sync;
mod trace;

pub use backoff::Backoff;
pub use config::{
    round_up_to_power_of_two, Config, DEFAULT_RETRY_BUDGET, HIGH_CONTENTION_CONFIG,
    MAX_CAPACITY, PROCESS_POOL_CONFIG,
};
pub use error::{ConfigError, GetError, PutError, PutErrorKind};
pub use metrics::MetricsSnapshot;
pub use ring::RingBuffer;
pub use slot::SlotState;
pub use trace::init_tracing;
