use crate::backoff::RetryBudget;
use crate::invariants::{debug_assert_bounded_occupancy, debug_assert_index_in_range};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::slot::{Probe, Slot, SlotState};
use crate::sync::{AtomicU32, Ordering};
use crate::trace::{debug, trace};
use crate::{Backoff, Config, ConfigError, GetError, PutError, PutErrorKind};
use crossbeam_utils::CachePadded;
use std::fmt;

// =============================================================================
// CURSORS & MEMORY ORDERING
// =============================================================================
//
// `write` and `read` are free-running u32 cursors. Occupancy is
// `write.wrapping_sub(read)`; crossing 2^32 is normal operation. A cursor
// value `c` lives in slot `c & mask`.
//
// **Put (cursor c):**
// 1. Load `read` then `write` (Acquire). Loading `read` first means the
//    difference can overstate occupancy but never go negative.
// 2. Full if `write - read >= capacity`.
// 3. Probe slot word (Acquire): must be `(c, EMPTY)`. This pairs with the
//    consumer's Release in `take()`, so its read of the old value is done.
// 4. CAS `write` c -> c+1. Winning it makes this thread the only writer of
//    generation c.
// 5. Write value, CAS word to `(c, FILLED)` with Release.
//
// **Get (cursor c):** mirror image. Empty if `read == write`; probe for
// `(c, FILLED)` (pairs with the producer's Release in `fill()`), CAS `read`,
// move the value out, CAS word to `(c + capacity, EMPTY)` with Release.
//
// Because the probe happens before the claim, a won cursor never has to be
// abandoned: every claimed cursor value is delivered.
//
// =============================================================================

/// Bounded lock-free MPMC slot ring.
///
/// Hands opaque handles (`Arc<Worker>`, `&'a Process`, indices, ...) between
/// any number of producer and consumer threads. Every operation is bounded by
/// two retry budgets from [`Config`] and reports failure instead of blocking.
///
/// # Example
///
/// ```
/// use slotring_rs::RingBuffer;
///
/// let ring = RingBuffer::new(5).unwrap();
/// assert_eq!(ring.capacity(), 8);
///
/// assert!(ring.put("a"));
/// assert!(ring.put("b"));
/// assert_eq!(ring.len(), 2);
///
/// assert_eq!(ring.get(), Some("a"));
/// assert_eq!(ring.get(), Some("b"));
/// assert_eq!(ring.get(), None);
/// ```
pub struct RingBuffer<T> {
    // === PRODUCER HOT ===
    /// Next cursor value to be claimed by a producer
    write: CachePadded<AtomicU32>,

    // === CONSUMER HOT ===
    /// Next cursor value to be claimed by a consumer
    read: CachePadded<AtomicU32>,

    // === READ-ONLY AFTER CONSTRUCTION ===
    capacity: u32,
    mask: u32,
    config: Config,
    metrics: Metrics,

    slots: Box<[Slot<T>]>,
}

// Safety: handles only ever move between threads through the slot protocol,
// which gives each value exactly one writer and one reader per generation.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> RingBuffer<T> {
    /// Creates a ring with at least `capacity` slots and default retry budgets.
    ///
    /// Fails with [`ConfigError::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: u32) -> Result<Self, ConfigError> {
        Self::with_config(Config::new(capacity))
    }

    /// Creates a ring from a full configuration.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        Self::with_origin(config, 0)
    }

    /// Creates a ring whose cursors start at `origin` instead of zero.
    pub(crate) fn with_origin(config: Config, origin: u32) -> Result<Self, ConfigError> {
        let capacity = config.validate()?;
        let mask = capacity - 1;

        // Slot i first serves the smallest cursor >= origin that maps to i.
        let slots = (0..capacity)
            .map(|i| Slot::new(origin.wrapping_add(i.wrapping_sub(origin) & mask)))
            .collect();

        debug!(
            requested = config.capacity,
            capacity,
            claim_attempts = config.claim_attempts,
            slot_polls = config.slot_polls,
            "slot ring created"
        );

        Ok(Self {
            write: CachePadded::new(AtomicU32::new(origin)),
            read: CachePadded::new(AtomicU32::new(origin)),
            capacity,
            mask,
            config,
            metrics: Metrics::new(),
            slots,
        })
    }

    // ---------------------------------------------------------------------
    // CONSTANTS & STATUS
    // ---------------------------------------------------------------------

    /// Returns the number of slots (a power of two).
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns the index mask, `capacity - 1`.
    #[inline]
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Returns the configuration the ring was built from.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the occupancy, `write - read` with wrapping subtraction.
    ///
    /// Advisory under concurrency: the two cursors are loaded separately, so
    /// the value is a point-in-time estimate. It is never negative and is
    /// clamped to `capacity`.
    #[inline]
    pub fn len(&self) -> u32 {
        let read = self.read.load(Ordering::Acquire);
        let write = self.write.load(Ordering::Acquire);
        write.wrapping_sub(read).min(self.capacity)
    }

    /// Returns true if no cursor value is outstanding.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if occupancy has reached capacity.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Raw write cursor (diagnostics).
    #[inline]
    pub fn write_cursor(&self) -> u32 {
        self.write.load(Ordering::Relaxed)
    }

    /// Raw read cursor (diagnostics).
    #[inline]
    pub fn read_cursor(&self) -> u32 {
        self.read.load(Ordering::Relaxed)
    }

    /// State flag of the slot that serves `cursor` (diagnostics).
    pub fn slot_state(&self, cursor: u32) -> SlotState {
        self.slot(cursor).state()
    }

    #[inline]
    fn slot(&self, cursor: u32) -> &Slot<T> {
        let index = (cursor & self.mask) as usize;
        debug_assert_index_in_range!(index, self.slots.len());
        &self.slots[index]
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// Inserts `item`. Returns `false` if the retry budgets ran out.
    ///
    /// On failure the item is dropped; use [`try_put`](Self::try_put) to get
    /// it back.
    #[inline]
    pub fn put(&self, item: T) -> bool {
        self.try_put(item).is_ok()
    }

    /// Inserts `item`, or hands it back with the reason the attempt gave up.
    ///
    /// Fullness and lost cursor races spend the claim budget; a slot whose
    /// previous consumer is still reading spends the poll budget. A cursor is
    /// claimed only once its slot is writable, so a failed Put leaves the
    /// ring untouched.
    pub fn try_put(&self, item: T) -> Result<(), PutError<T>> {
        let mut claims = RetryBudget::new(self.config.claim_attempts);
        let mut polls = RetryBudget::new(self.config.slot_polls);
        let mut backoff = Backoff::new();

        loop {
            let read = self.read.load(Ordering::Acquire);
            let write = self.write.load(Ordering::Acquire);

            let kind = if write.wrapping_sub(read) >= self.capacity {
                PutErrorKind::Full
            } else {
                let slot = self.slot(write);
                match slot.probe_put(write) {
                    Probe::Ready => {
                        if self
                            .write
                            .compare_exchange(
                                write,
                                write.wrapping_add(1),
                                Ordering::AcqRel,
                                Ordering::Relaxed,
                            )
                            .is_ok()
                        {
                            debug_assert_bounded_occupancy!(
                                write
                                    .wrapping_add(1)
                                    .wrapping_sub(self.read.load(Ordering::Relaxed)),
                                self.capacity
                            );
                            // SAFETY: probe_put returned Ready and we won cursor `write`.
                            unsafe { slot.fill(write, item) };
                            if self.config.enable_metrics {
                                self.metrics.record_put();
                                self.metrics.add_contention_retries(claims.used());
                            }
                            return Ok(());
                        }
                        PutErrorKind::Contended
                    }
                    Probe::Busy => {
                        if !polls.spend() {
                            return Err(self.put_failed(
                                PutErrorKind::SlotBusy,
                                item,
                                write,
                                &claims,
                            ));
                        }
                        backoff.snooze();
                        continue;
                    }
                    Probe::Taken => PutErrorKind::Contended,
                }
            };

            if !claims.spend() {
                return Err(self.put_failed(kind, item, write, &claims));
            }
            backoff.snooze();
        }
    }

    #[cold]
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn put_failed(
        &self,
        kind: PutErrorKind,
        item: T,
        cursor: u32,
        claims: &RetryBudget,
    ) -> PutError<T> {
        trace!(cursor, ?kind, attempts = claims.used(), "put gave up");
        if self.config.enable_metrics {
            match kind {
                PutErrorKind::Full => self.metrics.record_full(),
                PutErrorKind::SlotBusy => self.metrics.record_slot_busy(),
                PutErrorKind::Contended => {}
            }
            self.metrics.add_contention_retries(claims.used());
        }
        PutError { kind, item }
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// Removes the oldest available item, or `None` if there is none or the
    /// retry budgets ran out.
    #[inline]
    pub fn get(&self) -> Option<T> {
        self.try_get().ok()
    }

    /// Removes the oldest available item, or says why it could not.
    ///
    /// An empty ring returns [`GetError::Empty`] at once without touching the
    /// read cursor.
    pub fn try_get(&self) -> Result<T, GetError> {
        let mut claims = RetryBudget::new(self.config.claim_attempts);
        let mut polls = RetryBudget::new(self.config.slot_polls);
        let mut backoff = Backoff::new();

        loop {
            let read = self.read.load(Ordering::Acquire);
            let write = self.write.load(Ordering::Acquire);

            if read == write {
                if self.config.enable_metrics {
                    self.metrics.record_empty();
                    self.metrics.add_contention_retries(claims.used());
                }
                return Err(GetError::Empty);
            }

            let slot = self.slot(read);
            match slot.probe_get(read) {
                Probe::Ready => {
                    if self
                        .read
                        .compare_exchange(
                            read,
                            read.wrapping_add(1),
                            Ordering::AcqRel,
                            Ordering::Relaxed,
                        )
                        .is_ok()
                    {
                        // SAFETY: probe_get returned Ready and we won cursor `read`.
                        let item = unsafe { slot.take(read, self.capacity) };
                        if self.config.enable_metrics {
                            self.metrics.record_get();
                            self.metrics.add_contention_retries(claims.used());
                        }
                        return Ok(item);
                    }
                }
                Probe::Busy => {
                    if !polls.spend() {
                        return Err(self.get_failed(GetError::SlotBusy, read, &claims));
                    }
                    backoff.snooze();
                    continue;
                }
                Probe::Taken => {}
            }

            if !claims.spend() {
                return Err(self.get_failed(GetError::Contended, read, &claims));
            }
            backoff.snooze();
        }
    }

    #[cold]
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn get_failed(&self, err: GetError, cursor: u32, claims: &RetryBudget) -> GetError {
        trace!(cursor, ?err, attempts = claims.used(), "get gave up");
        if self.config.enable_metrics {
            if err == GetError::SlotBusy {
                self.metrics.record_slot_busy();
            }
            self.metrics.add_contention_retries(claims.used());
        }
        err
    }

    // ---------------------------------------------------------------------
    // DIAGNOSTICS
    // ---------------------------------------------------------------------

    /// Get a snapshot of metrics if enabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.config.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("write_cursor", &self.write_cursor())
            .field("read_cursor", &self.read_cursor())
            .finish_non_exhaustive()
    }
}
