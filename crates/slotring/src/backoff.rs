use crate::sync::{spin_loop, yield_now};

/// Adaptive backoff between retries (Crossbeam-style).
///
/// Spins with exponentially more PAUSE hints, then yields to the OS. It never
/// parks: the ring's retry budgets decide when to stop, not the backoff.
///
/// Callers that need more patience than one `try_put`/`try_get` offers can
/// drive their own loop with it:
///
/// ```
/// use slotring_rs::{Backoff, RingBuffer};
///
/// let ring = RingBuffer::<u32>::new(8).unwrap();
/// let mut backoff = Backoff::new();
/// let mut item = 7;
/// for _ in 0..100 {
///     match ring.try_put(item) {
///         Ok(()) => break,
///         Err(err) => {
///             item = err.into_inner();
///             backoff.snooze();
///         }
///     }
/// }
/// assert_eq!(ring.get(), Some(7));
/// ```
#[derive(Debug)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6; // 2^6 = 64 spins max before yielding

    /// Creates a new backoff instance.
    #[inline]
    pub fn new() -> Self {
        Self { step: 0 }
    }

    /// Light spin with PAUSE hints.
    #[inline]
    pub fn spin(&mut self) {
        for _ in 0..1u32 << self.step.min(Self::SPIN_LIMIT) {
            spin_loop();
        }
        if self.step <= Self::SPIN_LIMIT {
            self.step += 1;
        }
    }

    /// Spin while the wait is short, yield the processor once it is not.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step <= Self::SPIN_LIMIT {
            self.spin();
        } else {
            yield_now();
        }
    }

    /// Returns `true` once spinning has given way to yielding.
    #[inline]
    pub fn is_yielding(&self) -> bool {
        self.step > Self::SPIN_LIMIT
    }

    /// Reset for next wait cycle.
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts attempts against a fixed budget.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryBudget {
    used: u32,
    limit: u32,
}

impl RetryBudget {
    #[inline]
    pub(crate) const fn new(limit: u32) -> Self {
        Self { used: 0, limit }
    }

    /// Records one attempt. Returns `false` once the budget is spent.
    #[inline]
    pub(crate) fn spend(&mut self) -> bool {
        self.used += 1;
        self.used < self.limit
    }

    #[inline]
    pub(crate) fn used(&self) -> u32 {
        self.used
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_progression() {
        let mut b = Backoff::new();

        // Should start at step 0
        assert_eq!(b.step, 0);
        assert!(!b.is_yielding());

        // Spin should increment
        b.spin();
        assert!(b.step > 0);

        // Should eventually switch to yielding and stay there
        while !b.is_yielding() {
            b.snooze();
        }
        let step = b.step;
        b.snooze();
        assert_eq!(b.step, step);

        // Reset
        b.reset();
        assert_eq!(b.step, 0);
    }

    #[test]
    fn test_retry_budget_counts_attempts() {
        let mut budget = RetryBudget::new(3);
        assert!(budget.spend());
        assert!(budget.spend());
        assert!(!budget.spend());
        assert_eq!(budget.used(), 3);

        let mut single = RetryBudget::new(1);
        assert!(!single.spend());
    }
}
