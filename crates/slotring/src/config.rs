use crate::ConfigError;

/// Default number of attempts for both the cursor-claim loop and the slot poll loop.
pub const DEFAULT_RETRY_BUDGET: u32 = 10;

/// Largest supported capacity (2^30 slots).
///
/// Slot generations are compared by signed wrapping distance on `u32`
/// cursors, which needs `capacity < 2^31`.
pub const MAX_CAPACITY: u32 = 1 << 30;

/// Configuration for [`RingBuffer`](crate::RingBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Requested capacity; rounded up to the next power of two.
    pub capacity: u32,
    /// Outer budget: attempts to claim a cursor before giving up.
    pub claim_attempts: u32,
    /// Inner budget: polls of a slot whose peer is still mid-operation.
    pub slot_polls: u32,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a configuration with the default retry budgets and metrics off.
    pub const fn new(capacity: u32) -> Self {
        Self {
            capacity,
            claim_attempts: DEFAULT_RETRY_BUDGET,
            slot_polls: DEFAULT_RETRY_BUDGET,
            enable_metrics: false,
        }
    }

    /// Sets the outer (cursor-claim) retry budget.
    pub const fn with_claim_attempts(mut self, attempts: u32) -> Self {
        self.claim_attempts = attempts;
        self
    }

    /// Sets the inner (slot-poll) retry budget.
    pub const fn with_slot_polls(mut self, polls: u32) -> Self {
        self.slot_polls = polls;
        self
    }

    /// Turns metrics collection on or off.
    pub const fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Checks the configuration and returns the effective (rounded) capacity.
    pub fn validate(&self) -> Result<u32, ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }
        if self.capacity > MAX_CAPACITY {
            return Err(ConfigError::CapacityTooLarge {
                requested: self.capacity,
                max: MAX_CAPACITY,
            });
        }
        if self.claim_attempts == 0 || self.slot_polls == 0 {
            return Err(ConfigError::ZeroRetryBudget);
        }
        Ok(round_up_to_power_of_two(self.capacity))
    }
}

impl Default for Config {
    fn default() -> Self {
        PROCESS_POOL_CONFIG
    }
}

/// Sized for a typical worker pool: 64 slots, default budgets.
pub const PROCESS_POOL_CONFIG: Config = Config::new(64);

/// Larger budgets for pools where many threads hammer the same ring.
pub const HIGH_CONTENTION_CONFIG: Config = Config::new(1024)
    .with_claim_attempts(64)
    .with_slot_polls(32);

/// Rounds `v` up to the next power of two by smearing the highest set bit.
///
/// `v` must be in `1..=2^31`; `0` wraps to `0` and callers reject it first.
#[inline]
pub const fn round_up_to_power_of_two(v: u32) -> u32 {
    let mut v = v.wrapping_sub(1);
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v.wrapping_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up_small_values() {
        assert_eq!(round_up_to_power_of_two(1), 1);
        assert_eq!(round_up_to_power_of_two(2), 2);
        assert_eq!(round_up_to_power_of_two(3), 4);
        assert_eq!(round_up_to_power_of_two(5), 8);
        assert_eq!(round_up_to_power_of_two(8), 8);
        assert_eq!(round_up_to_power_of_two(9), 16);
        assert_eq!(round_up_to_power_of_two(1000), 1024);
    }

    #[test]
    fn test_round_up_upper_bound() {
        assert_eq!(round_up_to_power_of_two(MAX_CAPACITY), MAX_CAPACITY);
        assert_eq!(round_up_to_power_of_two(MAX_CAPACITY - 1), MAX_CAPACITY);
        assert_eq!(round_up_to_power_of_two(1 << 31), 1 << 31);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        assert_eq!(Config::new(0).validate(), Err(ConfigError::InvalidCapacity));
    }

    #[test]
    fn test_validate_rejects_oversized_capacity() {
        let err = Config::new(MAX_CAPACITY + 1).validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::CapacityTooLarge {
                requested: MAX_CAPACITY + 1,
                max: MAX_CAPACITY,
            }
        );
        assert!(Config::new(u32::MAX).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_budgets() {
        let config = Config::new(8).with_claim_attempts(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroRetryBudget));

        let config = Config::new(8).with_slot_polls(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroRetryBudget));
    }

    #[test]
    fn test_presets() {
        assert_eq!(Config::default(), PROCESS_POOL_CONFIG);
        assert_eq!(PROCESS_POOL_CONFIG.claim_attempts, DEFAULT_RETRY_BUDGET);
        assert_eq!(PROCESS_POOL_CONFIG.validate(), Ok(64));
        assert_eq!(HIGH_CONTENTION_CONFIG.validate(), Ok(1024));
        assert!(!HIGH_CONTENTION_CONFIG.enable_metrics);
    }
}
