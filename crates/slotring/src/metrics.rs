use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for ring activity.
///
/// Only updated when [`Config::enable_metrics`](crate::Config) is set. Counters
/// are relaxed: a snapshot taken under load is approximate.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    puts: AtomicU64,
    gets: AtomicU64,
    full_rejections: AtomicU64,
    empty_returns: AtomicU64,
    contention_retries: AtomicU64,
    slot_busy_failures: AtomicU64,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_get(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_full(&self) {
        self.full_rejections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_empty(&self) {
        self.empty_returns.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_contention_retries(&self, n: u32) {
        if n > 0 {
            self.contention_retries
                .fetch_add(u64::from(n), Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_slot_busy(&self) {
        self.slot_busy_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            puts: self.puts.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            full_rejections: self.full_rejections.load(Ordering::Relaxed),
            empty_returns: self.empty_returns.load(Ordering::Relaxed),
            contention_retries: self.contention_retries.load(Ordering::Relaxed),
            slot_busy_failures: self.slot_busy_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the ring counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Successful Puts.
    pub puts: u64,
    /// Successful Gets.
    pub gets: u64,
    /// Puts that gave up because the ring stayed full.
    pub full_rejections: u64,
    /// Gets that found the ring empty.
    pub empty_returns: u64,
    /// Outer-loop retries caused by fullness or lost cursor races.
    pub contention_retries: u64,
    /// Operations that gave up while a slot's peer was mid-operation.
    pub slot_busy_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let m = Metrics::new();
        m.record_put();
        m.record_put();
        m.record_get();
        m.record_full();
        m.record_empty();
        m.add_contention_retries(0);
        m.add_contention_retries(4);
        m.record_slot_busy();

        let snap = m.snapshot();
        assert_eq!(
            snap,
            MetricsSnapshot {
                puts: 2,
                gets: 1,
                full_rejections: 1,
                empty_returns: 1,
                contention_retries: 4,
                slot_busy_failures: 1,
            }
        );
    }
}
