use crate::invariants::debug_assert_slot_transition;
use crate::sync::{AtomicU64, Ordering};
use std::cell::UnsafeCell;
use std::cmp::Ordering as Cmp;
use std::mem::MaybeUninit;

// =============================================================================
// SLOT STATE WORD
// =============================================================================
//
// Each slot carries one atomic word packing (generation, state):
//
//     bits 1..=32  generation: the cursor value this slot currently serves
//     bit  0       state: 0 = EMPTY, 1 = FILLED
//
// A slot serving cursor `c` moves through:
//
//     (c, EMPTY) --producer of c--> (c, FILLED) --consumer of c--> (c + capacity, EMPTY)
//
// Both transitions are compare-and-swaps performed by the one thread that won
// cursor `c`. Threads probe the word *before* claiming a cursor, so a claim is
// only ever made on a slot that is ready for it and never has to be abandoned.
//
// Generations are compared by signed wrapping distance to the cursor, which
// stays unambiguous while capacity < 2^31.
//
// =============================================================================

const FILLED_BIT: u64 = 1;

/// Occupancy flag of a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No handle stored; writable by the producer of the current generation.
    Empty,
    /// Holds a handle; readable by the consumer of the current generation.
    Filled,
}

#[inline]
pub(crate) const fn pack(generation: u32, state: SlotState) -> u64 {
    let bit = match state {
        SlotState::Empty => 0,
        SlotState::Filled => FILLED_BIT,
    };
    ((generation as u64) << 1) | bit
}

#[inline]
pub(crate) const fn unpack(word: u64) -> (u32, SlotState) {
    let state = if word & FILLED_BIT == 0 {
        SlotState::Empty
    } else {
        SlotState::Filled
    };
    ((word >> 1) as u32, state)
}

/// Outcome of inspecting a slot on behalf of a cursor value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    /// The slot is in the state this role needs for this cursor.
    Ready,
    /// The thread owning the slot's previous step has not finished yet.
    Busy,
    /// Another thread of the same role already moved past this cursor.
    Taken,
}

pub(crate) struct Slot<T> {
    word: AtomicU64,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    pub(crate) fn new(generation: u32) -> Self {
        Self {
            word: AtomicU64::new(pack(generation, SlotState::Empty)),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    #[inline]
    fn load(&self, cursor: u32) -> (Cmp, SlotState) {
        // Acquire pairs with the Release transitions in fill()/take().
        let (generation, state) = unpack(self.word.load(Ordering::Acquire));
        ((generation.wrapping_sub(cursor) as i32).cmp(&0), state)
    }

    /// Can the producer of `cursor` write here?
    #[inline]
    pub(crate) fn probe_put(&self, cursor: u32) -> Probe {
        match self.load(cursor) {
            (Cmp::Equal, SlotState::Empty) => Probe::Ready,
            (Cmp::Less, _) => Probe::Busy,
            (Cmp::Equal, SlotState::Filled) | (Cmp::Greater, _) => Probe::Taken,
        }
    }

    /// Can the consumer of `cursor` read here?
    #[inline]
    pub(crate) fn probe_get(&self, cursor: u32) -> Probe {
        match self.load(cursor) {
            (Cmp::Equal, SlotState::Filled) => Probe::Ready,
            (Cmp::Equal, SlotState::Empty) | (Cmp::Less, _) => Probe::Busy,
            (Cmp::Greater, _) => Probe::Taken,
        }
    }

    /// Current state flag, for diagnostics.
    #[inline]
    pub(crate) fn state(&self) -> SlotState {
        unpack(self.word.load(Ordering::Acquire)).1
    }

    /// Stores `item` and publishes the slot as FILLED.
    ///
    /// # Safety
    ///
    /// The caller must have won write cursor `cursor` after `probe_put(cursor)`
    /// returned `Ready`.
    #[inline]
    pub(crate) unsafe fn fill(&self, cursor: u32, item: T) {
        (*self.value.get()).write(item);

        let from = pack(cursor, SlotState::Empty);
        let to = pack(cursor, SlotState::Filled);
        let result = self
            .word
            .compare_exchange(from, to, Ordering::Release, Ordering::Relaxed);
        debug_assert_slot_transition!(result, unpack(from), unpack(to));
    }

    /// Moves the handle out and hands the slot to the next lap's producer.
    ///
    /// # Safety
    ///
    /// The caller must have won read cursor `cursor` after `probe_get(cursor)`
    /// returned `Ready`.
    #[inline]
    pub(crate) unsafe fn take(&self, cursor: u32, capacity: u32) -> T {
        let item = (*self.value.get()).assume_init_read();

        let from = pack(cursor, SlotState::Filled);
        let to = pack(cursor.wrapping_add(capacity), SlotState::Empty);
        let result = self
            .word
            .compare_exchange(from, to, Ordering::Release, Ordering::Relaxed);
        debug_assert_slot_transition!(result, unpack(from), unpack(to));
        item
    }
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        if self.state() == SlotState::Filled {
            // SAFETY: FILLED means fill() initialized the value and no take() ran.
            unsafe { self.value.get_mut().assume_init_drop() };
        }
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        for generation in [0, 1, 7, u32::MAX - 1, u32::MAX] {
            for state in [SlotState::Empty, SlotState::Filled] {
                assert_eq!(unpack(pack(generation, state)), (generation, state));
            }
        }
    }

    #[test]
    fn test_slot_lifecycle() {
        let slot = Slot::<u64>::new(3);
        assert_eq!(slot.state(), SlotState::Empty);
        assert_eq!(slot.probe_put(3), Probe::Ready);
        assert_eq!(slot.probe_get(3), Probe::Busy);

        unsafe { slot.fill(3, 99) };
        assert_eq!(slot.state(), SlotState::Filled);
        assert_eq!(slot.probe_put(3), Probe::Taken);
        assert_eq!(slot.probe_get(3), Probe::Ready);
        // Producer of the next lap must wait for the consumer.
        assert_eq!(slot.probe_put(3 + 4), Probe::Busy);

        assert_eq!(unsafe { slot.take(3, 4) }, 99);
        assert_eq!(slot.state(), SlotState::Empty);
        assert_eq!(slot.probe_get(3), Probe::Taken);
        assert_eq!(slot.probe_put(7), Probe::Ready);
    }

    #[test]
    fn test_probe_across_wrap() {
        let slot = Slot::<u8>::new(u32::MAX);
        unsafe { slot.fill(u32::MAX, 1) };
        assert_eq!(unsafe { slot.take(u32::MAX, 2) }, 1);

        // u32::MAX + 2 wraps to 1.
        assert_eq!(slot.probe_put(1), Probe::Ready);
        assert_eq!(slot.probe_put(u32::MAX), Probe::Taken);
        assert_eq!(slot.probe_get(u32::MAX), Probe::Taken);
    }

    #[test]
    fn test_capacity_one_reader_blocks_next_writer() {
        let slot = Slot::<u8>::new(0);
        unsafe { slot.fill(0, 5) };
        // A consumer has won read cursor 0 but not taken the value yet:
        // the producer of cursor 1 must see the slot as busy, not ready.
        assert_eq!(slot.probe_put(1), Probe::Busy);
        assert_eq!(unsafe { slot.take(0, 1) }, 5);
        assert_eq!(slot.probe_put(1), Probe::Ready);
    }

    #[test]
    fn test_drop_releases_filled_value() {
        use std::sync::Arc;

        let handle = Arc::new(());
        let slot = Slot::new(0);
        unsafe { slot.fill(0, Arc::clone(&handle)) };
        assert_eq!(Arc::strong_count(&handle), 2);
        drop(slot);
        assert_eq!(Arc::strong_count(&handle), 1);
    }
}
