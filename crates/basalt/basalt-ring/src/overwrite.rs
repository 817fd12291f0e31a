//! Fixed-capacity FIFO that evicts its oldest entry instead of rejecting a write.
//!
//! # Design
//! - Slots live in a [`SlotStore`]; each holds one bitwise copy of `T`.
//! - Two cursors and a count describe the live region:
//!
//! ```text
//!   capacity = 6, count = 3
//!
//!   ┌─────┬─────┬─────┬─────┬─────┬─────┐
//!   │     │  a  │  b  │  c  │     │     │
//!   └─────┴─────┴─────┴─────┴─────┴─────┘
//!            ^                 ^
//!         dequeue           enqueue
//! ```
//!
//! - When `count == capacity` the cursors coincide. An enqueue then moves
//!   `dequeue` one slot forward before the overwrite, so the entry being
//!   replaced can never be read again and the rest stay in order.
//!
//! # Thread Safety
//! `OverwriteRing` does no locking of its own. Share it behind a critical
//! section; every method that moves a cursor takes `&mut self`.

use basalt_events::Payload;
use basalt_slots::SlotStore;
use std::fmt::Write;
use std::mem::size_of;

use crate::config::{RingConfig, advance};
use crate::error::RingError;
use crate::render::Renderer;

/// Cursor state of a ring. Copied out for inspection only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursors {
    /// Next slot to be written.
    pub enqueue: usize,
    /// Oldest unread slot; meaningful only while `count > 0`.
    pub dequeue: usize,
    /// Unread entries, always in `0..=capacity`.
    pub count: usize,
}

/// What an enqueue did besides storing the value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnqueueOutcome {
    /// The previously oldest unread entry was overwritten.
    pub evicted: bool,
    /// Set when this enqueue raised the high-water mark; holds the new mark.
    pub new_high_water: Option<usize>,
}

pub struct OverwriteRing<T: Copy> {
    store: SlotStore<T>,
    cursors: Cursors,
    capacity: usize,
    high_water: usize,
    evicted: u64,
    renderer: Renderer,
}

impl<T: Copy> OverwriteRing<T> {
    /// Allocates the slot storage and places both cursors at slot 0.
    ///
    /// # Errors
    /// - `capacity` or `payload_size` is zero
    /// - `payload_size` differs from `size_of::<T>()`
    /// - the storage mapping fails
    pub fn new(cfg: RingConfig) -> Result<Self, RingError> {
        if cfg.capacity == 0 {
            return Err(RingError::ZeroCapacity);
        }
        if cfg.payload_size == 0 {
            return Err(RingError::ZeroPayloadSize);
        }
        if cfg.payload_size != size_of::<T>() {
            return Err(RingError::PayloadSize {
                configured: cfg.payload_size,
                actual: size_of::<T>(),
            });
        }

        let store = SlotStore::new(cfg.capacity).map_err(RingError::Storage)?;

        Ok(Self {
            store,
            cursors: Cursors::default(),
            capacity: cfg.capacity,
            high_water: 0,
            evicted: 0,
            renderer: cfg.renderer,
        })
    }

    /// Stores `value` at the enqueue cursor. Never fails and never blocks.
    ///
    /// On a full ring the oldest unread entry is dropped and `count` stays at
    /// `capacity`.
    #[inline]
    pub fn enqueue(&mut self, value: &T) -> EnqueueOutcome {
        let c = &mut self.cursors;
        let evicted = c.count == self.capacity;
        if evicted {
            // enqueue == dequeue here; step the reader off the slot first.
            c.dequeue = advance(c.dequeue, self.capacity);
            self.evicted += 1;
        }

        self.store.write(c.enqueue, value);
        c.enqueue = advance(c.enqueue, self.capacity);
        if !evicted {
            c.count += 1;
        }

        let new_high_water = if c.count > self.high_water {
            self.high_water = c.count;
            Some(c.count)
        } else {
            None
        };

        EnqueueOutcome {
            evicted,
            new_high_water,
        }
    }

    /// Removes and returns the oldest entry, or `None` when the ring is empty.
    #[inline]
    pub fn dequeue(&mut self) -> Option<T> {
        let c = &mut self.cursors;
        if c.count == 0 {
            return None;
        }
        // Every counted slot has been written.
        let value = self.store.read(c.dequeue)?;
        c.dequeue = advance(c.dequeue, self.capacity);
        c.count -= 1;
        Some(value)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cursors.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cursors.count == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Largest `count` ever observed.
    #[inline]
    pub fn high_water_mark(&self) -> usize {
        self.high_water
    }

    /// Entries dropped by overwrite since creation.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn cursors(&self) -> Cursors {
        self.cursors
    }
}

impl<T: Payload> OverwriteRing<T> {
    /// Renders the cursor state and every slot in index order.
    ///
    /// ```text
    /// <label> count=2 enq=2 deq=0
    /// 7 9 - -
    /// ```
    ///
    /// Slots never written print as `-`.
    pub fn dump(&self, label: &str) -> String {
        let c = self.cursors;
        let mut out = format!(
            "{label} count={} enq={} deq={}\n",
            c.count, c.enqueue, c.dequeue
        );
        for idx in 0..self.capacity {
            if idx > 0 {
                out.push(' ');
            }
            let Some(value) = self.store.read(idx) else {
                out.push('-');
                continue;
            };
            // Writing into a String cannot fail.
            let _ = match self.renderer {
                Renderer::Tag => write!(out, "{}", value.tag()),
                Renderer::Debug => write!(out, "{value:?}"),
            };
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_events::Sample;

    fn ring(capacity: usize) -> OverwriteRing<u32> {
        OverwriteRing::new(RingConfig::for_payload::<u32>(capacity)).unwrap()
    }

    fn drain(r: &mut OverwriteRing<u32>) -> Vec<u32> {
        std::iter::from_fn(|| r.dequeue()).collect()
    }

    #[test]
    fn empty_dequeue_leaves_ring_untouched() {
        let mut r = ring(4);
        assert_eq!(r.dequeue(), None);
        assert_eq!(r.len(), 0);
        assert_eq!(r.cursors(), Cursors::default());
    }

    #[test]
    fn fifo_without_eviction() {
        let mut r = ring(8);
        for v in [10, 20, 30] {
            r.enqueue(&v);
        }
        assert_eq!(drain(&mut r), vec![10, 20, 30]);
    }

    #[test]
    fn full_ring_evicts_exactly_the_oldest() {
        let mut r = ring(4);
        for v in 1..=4 {
            assert!(!r.enqueue(&v).evicted);
        }
        let out = r.enqueue(&5);
        assert!(out.evicted);
        assert_eq!(out.new_high_water, None);
        assert_eq!(r.len(), 4);
        assert_eq!(r.high_water_mark(), 4);
        assert_eq!(r.evicted(), 1);
        assert_eq!(r.dequeue(), Some(2));
        assert_eq!(drain(&mut r), vec![3, 4, 5]);
    }

    #[test]
    fn capacity_one_keeps_only_the_latest() {
        let mut r = ring(1);
        r.enqueue(&0xA);
        r.enqueue(&0xB);
        assert_eq!(r.len(), 1);
        assert_eq!(r.dequeue(), Some(0xB));
        assert_eq!(r.dequeue(), None);
    }

    #[test]
    fn high_water_mark_tracks_peak_count() {
        let mut r = ring(8);
        assert_eq!(r.enqueue(&1).new_high_water, Some(1));
        assert_eq!(r.enqueue(&2).new_high_water, Some(2));
        r.dequeue();
        r.dequeue();
        assert_eq!(r.enqueue(&3).new_high_water, None);
        assert_eq!(r.enqueue(&4).new_high_water, None);
        assert_eq!(r.enqueue(&5).new_high_water, Some(3));
        assert_eq!(r.high_water_mark(), 3);
    }

    #[test]
    fn count_stays_in_bounds_over_mixed_traffic() {
        let mut r = ring(5);
        let mut peak = 0;
        let mut last_mark = 0;
        for step in 0u32..500 {
            // Two enqueues for every dequeue on most steps, forcing wrap and eviction.
            if step % 3 == 0 {
                r.dequeue();
            } else {
                r.enqueue(&step);
            }
            assert!(r.len() <= r.capacity());
            peak = peak.max(r.len());
            assert!(r.high_water_mark() >= last_mark);
            last_mark = r.high_water_mark();
        }
        assert_eq!(r.high_water_mark(), peak);
    }

    #[test]
    fn survivors_come_out_in_order_after_wraps() {
        let mut r = ring(3);
        for v in 0..10 {
            r.enqueue(&v);
        }
        assert_eq!(drain(&mut r), vec![7, 8, 9]);
        r.enqueue(&42);
        assert_eq!(drain(&mut r), vec![42]);
    }

    #[test]
    fn wrong_payload_size_is_rejected() {
        let err = OverwriteRing::<u32>::new(RingConfig::new(4, 8)).err().unwrap();
        assert!(matches!(
            err,
            RingError::PayloadSize {
                configured: 8,
                actual: 4
            }
        ));
        assert!(matches!(
            OverwriteRing::<u32>::new(RingConfig::new(0, 4)),
            Err(RingError::ZeroCapacity)
        ));
    }

    #[test]
    fn multi_lane_payloads_survive_copy() {
        let mut r: OverwriteRing<Sample> =
            OverwriteRing::new(RingConfig::for_payload::<Sample>(2)).unwrap();
        r.enqueue(&Sample::new(1));
        r.enqueue(&Sample::new(2));
        r.enqueue(&Sample::new(3));
        let s = r.dequeue().unwrap();
        assert_eq!(s.seq, 2);
        assert!(s.is_intact());
    }

    #[test]
    fn dump_marks_unwritten_slots() {
        let mut r = ring(4);
        r.enqueue(&7);
        r.enqueue(&9);
        assert_eq!(r.dump("q"), "q count=2 enq=2 deq=0\n7 9 - -");
    }

    #[test]
    fn debug_renderer_prints_whole_payload() {
        let cfg = RingConfig::for_payload::<u32>(2).with_renderer(Renderer::Debug);
        let mut r: OverwriteRing<u32> = OverwriteRing::new(cfg).unwrap();
        r.enqueue(&5);
        assert!(r.dump("d").ends_with("5 -"));
    }
}
