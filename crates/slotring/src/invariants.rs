//! Debug assertion macros for ring invariants.
//!
//! Only active in debug builds (`debug_assert!`), so release builds pay
//! nothing for them.

// =============================================================================
// Bounded occupancy
// =============================================================================

/// Assert that a freshly claimed write cursor keeps occupancy within capacity.
///
/// **Invariant**: `(write + 1) - read ≤ capacity` (wrapping)
///
/// Used in: `try_put()` right after winning the write cursor
macro_rules! debug_assert_bounded_occupancy {
    ($occupancy:expr, $capacity:expr) => {
        debug_assert!(
            $occupancy <= $capacity,
            "occupancy {} exceeds capacity {}",
            $occupancy,
            $capacity
        )
    };
}

// =============================================================================
// Slot transitions
// =============================================================================

/// Assert that a slot transition performed by the claiming thread succeeded.
///
/// **Invariant**: only the claimer of generation `g` moves the slot out of
/// `(g, EMPTY)` or `(g, FILLED)`, so its compare-and-swap cannot fail.
///
/// Used in: `Slot::fill()` and `Slot::take()`
macro_rules! debug_assert_slot_transition {
    ($result:expr, $from:expr, $to:expr) => {
        debug_assert!(
            $result.is_ok(),
            "slot transition {:?} -> {:?} lost a race (observed {:?})",
            $from,
            $to,
            $result.map_err(crate::slot::unpack)
        )
    };
}

// =============================================================================
// Index range
// =============================================================================

/// Assert that a masked cursor addresses a real slot.
///
/// Used in: `RingBuffer::slot()`
macro_rules! debug_assert_index_in_range {
    ($index:expr, $len:expr) => {
        debug_assert!(
            $index < $len,
            "slot index {} out of range for {} slots",
            $index,
            $len
        )
    };
}

pub(crate) use debug_assert_bounded_occupancy;
pub(crate) use debug_assert_index_in_range;
pub(crate) use debug_assert_slot_transition;
