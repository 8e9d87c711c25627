//! Error types for ring construction and bounded Put/Get.

use std::fmt;
use thiserror::Error;

/// Errors raised when a [`Config`](crate::Config) cannot produce a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Capacity must be at least one slot.
    #[error("capacity must be greater than zero")]
    InvalidCapacity,

    /// Rounded capacity would not fit the cursor range.
    #[error("capacity {requested} exceeds the maximum of {max} slots")]
    CapacityTooLarge {
        /// The capacity that was asked for.
        requested: u32,
        /// The largest supported capacity.
        max: u32,
    },

    /// Both retry budgets need at least one attempt.
    #[error("retry budgets must allow at least one attempt")]
    ZeroRetryBudget,
}

/// Why a Put gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PutErrorKind {
    /// Occupancy stayed at capacity for the whole claim budget.
    #[error("ring buffer is full")]
    Full,

    /// Other producers kept winning the write cursor.
    #[error("write cursor is contended")]
    Contended,

    /// The target slot was still being read by a consumer.
    #[error("target slot is still being consumed")]
    SlotBusy,
}

/// A failed Put. Carries the item back to the caller.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PutError<T> {
    /// Failure reason.
    pub kind: PutErrorKind,
    /// The item that was not inserted.
    pub item: T,
}

impl<T> PutError<T> {
    /// Returns the rejected item.
    #[inline]
    pub fn into_inner(self) -> T {
        self.item
    }

    /// Returns `true` if the failure came from other threads rather than fullness.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, PutErrorKind::Contended | PutErrorKind::SlotBusy)
    }
}

// Manual impl: the item is an opaque handle and need not be `Debug`.
impl<T> fmt::Debug for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutError")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl<T> std::error::Error for PutError<T> {}

/// Why a Get returned nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GetError {
    /// Read and write cursors were equal.
    #[error("ring buffer is empty")]
    Empty,

    /// Other consumers kept winning the read cursor.
    #[error("read cursor is contended")]
    Contended,

    /// The target slot was claimed by a producer that has not finished writing.
    #[error("target slot is still being filled")]
    SlotBusy,
}

impl GetError {
    /// Returns `true` if the failure came from other threads rather than emptiness.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Contended | Self::SlotBusy)
    }
}
