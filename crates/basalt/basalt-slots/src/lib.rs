//! Fixed backing storage for ring slots.
//!
//! A `SlotStore<T>` is one anonymous memory map of `capacity * size_of::<T>()`
//! bytes, split into `capacity` slots. It is sized once at creation and never
//! grows; the mapping is released when the store is dropped.
//!
//! The element type is fixed on the store, and a slot only yields a value once
//! a `T` has been written into it, so every read returns a value some caller
//! actually stored.

use memmap2::MmapMut;
use std::io;
use std::marker::PhantomData;
use std::mem::size_of;
use std::ptr;

pub struct SlotStore<T: Copy> {
    mmap: MmapMut,
    capacity: usize,
    /// `written[i]` is set once slot `i` holds a `T`.
    written: Vec<bool>,
    _pd: PhantomData<T>,
}

impl<T: Copy> SlotStore<T> {
    /// Map zeroed storage for `capacity` slots of `size_of::<T>()` bytes each.
    pub fn new(capacity: usize) -> io::Result<Self> {
        let len = capacity
            .checked_mul(size_of::<T>())
            .filter(|&len| len > 0)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "slot store needs a non-zero capacity and slot size",
                )
            })?;
        let mmap = MmapMut::map_anon(len)?;
        Ok(Self {
            mmap,
            capacity,
            written: vec![false; capacity],
            _pd: PhantomData,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy `value` bitwise into slot `idx`.
    ///
    /// # Panics
    /// Panics if `idx >= capacity`.
    #[inline(always)]
    pub fn write(&mut self, idx: usize, value: &T) {
        let offset = self.offset(idx);
        // SAFETY: `offset` checked `idx`, so the slot's size_of::<T>() bytes lie
        // inside the mapping. The mapping carries no alignment guarantee for T.
        unsafe {
            let dst = self.mmap.as_mut_ptr().add(offset) as *mut T;
            ptr::write_unaligned(dst, *value);
        }
        self.written[idx] = true;
    }

    /// Copy the `T` out of slot `idx`, or `None` if nothing was ever written there.
    ///
    /// # Panics
    /// Panics if `idx >= capacity`.
    #[inline(always)]
    pub fn read(&self, idx: usize) -> Option<T> {
        let offset = self.offset(idx);
        if !self.written[idx] {
            return None;
        }
        // SAFETY: in bounds as in `write`, and the slot holds the bytes of a
        // valid `T` stored by `write`; the store's type never changes.
        Some(unsafe { ptr::read_unaligned(self.mmap.as_ptr().add(offset) as *const T) })
    }

    #[inline(always)]
    fn offset(&self, idx: usize) -> usize {
        assert!(idx < self.capacity, "slot index {idx} out of range");
        idx * size_of::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    #[test]
    fn store_is_sized_from_its_type() {
        let store = SlotStore::<u64>::new(4).unwrap();
        assert_eq!(store.capacity(), 4);
    }

    #[test]
    fn zero_sized_store_is_rejected() {
        assert!(SlotStore::<u64>::new(0).is_err());
        assert!(SlotStore::<()>::new(8).is_err());
    }

    #[test]
    fn writes_stay_inside_their_slot() {
        let mut store = SlotStore::<u32>::new(3).unwrap();
        store.write(1, &0xAABB_CCDD);
        assert_eq!(store.read(1), Some(0xAABB_CCDD));
        assert_eq!(store.read(0), None);
        assert_eq!(store.read(2), None);
    }

    #[test]
    fn unwritten_slot_never_yields_a_value() {
        // An all-zero slot is not a valid NonZeroU32.
        let mut store = SlotStore::<NonZeroU32>::new(2).unwrap();
        assert_eq!(store.read(0), None);

        let seven = NonZeroU32::new(7).unwrap();
        store.write(0, &seven);
        assert_eq!(store.read(0), Some(seven));
        assert_eq!(store.read(1), None);
    }

    #[test]
    fn rewritten_slot_returns_latest_value() {
        let mut store = SlotStore::<(u8, u32)>::new(1).unwrap();
        store.write(0, &(1, 10));
        store.write(0, &(2, 20));
        assert_eq!(store.read(0), Some((2, 20)));
    }

    #[test]
    #[should_panic]
    fn out_of_range_slot_panics() {
        let store = SlotStore::<u32>::new(2).unwrap();
        let _ = store.read(2);
    }
}
