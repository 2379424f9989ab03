//! Shared occurrence tracker: one atomic claim flag per blocklist ordinal.
//!
//! # Invariants
//! - Flags are stored in `AtomicU64` words; padding bits beyond `slots` stay
//!   zero (maintained by never setting them).
//! - A flag only ever transitions false -> true, and exactly one caller
//!   observes that transition per ordinal for the lifetime of the tracker.
//!
//! # Ordering
//! All atomic operations use `Relaxed`. The `fetch_or` itself guarantees a
//! unique "was-unset" observer per bit, and no other data is published
//! through the flag, so no acquire/release edges are needed.
//!
//! This is the only state mutated by more than one worker during a run. In
//! decontaminate mode (every match contaminated, no first-occurrence concept)
//! the tracker is not constructed at all.

use std::sync::atomic::{AtomicU64, Ordering};

/// Fixed-size array of claim flags shared by all workers.
///
/// The caller that gets `true` from [`claim_or_reject`](Self::claim_or_reject)
/// owns the first occurrence for that ordinal and keeps its document; every
/// other caller must treat its copy as a duplicate.
pub struct OccurrenceTracker {
    words: Vec<AtomicU64>,
    slots: usize,
}

impl std::fmt::Debug for OccurrenceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OccurrenceTracker")
            .field("slots", &self.slots)
            .field("claimed", &self.claimed())
            .finish()
    }
}

impl OccurrenceTracker {
    /// Creates a tracker with `slots` unclaimed flags. Zero slots is valid
    /// (empty blocklist); no ordinal is addressable then.
    pub fn new(slots: usize) -> Self {
        let num_words = slots.div_ceil(64);
        let mut words = Vec::with_capacity(num_words);
        for _ in 0..num_words {
            words.push(AtomicU64::new(0));
        }
        Self { words, slots }
    }

    /// Atomically claims `ordinal`. Returns `true` exactly once per ordinal
    /// across all workers; the winner's document is the surviving first
    /// occurrence.
    ///
    /// # Panics
    ///
    /// Panics (debug) if `ordinal >= slots`.
    #[inline]
    pub fn claim_or_reject(&self, ordinal: usize) -> bool {
        debug_assert!(ordinal < self.slots, "ordinal out of range");
        let mask = 1u64 << (ordinal % 64);
        let prev = self.words[ordinal / 64].fetch_or(mask, Ordering::Relaxed);
        (prev & mask) == 0
    }

    /// Whether `ordinal` has been claimed by anyone.
    #[inline]
    pub fn is_claimed(&self, ordinal: usize) -> bool {
        debug_assert!(ordinal < self.slots, "ordinal out of range");
        let mask = 1u64 << (ordinal % 64);
        (self.words[ordinal / 64].load(Ordering::Relaxed) & mask) != 0
    }

    /// Number of addressable ordinals.
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Snapshot count of claimed ordinals. Claims racing with this call may
    /// or may not be reflected.
    pub fn claimed(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }
}
