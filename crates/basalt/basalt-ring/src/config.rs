//! Ring configuration and cursor arithmetic.

use crate::render::Renderer;
use std::mem::size_of;

/// Construction parameters for an [`OverwriteRing`](crate::OverwriteRing).
///
/// Neither value may change after the ring is built.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RingConfig {
    /// Number of slots. Any value `>= 1`; no power-of-two requirement.
    pub capacity: usize,
    /// Bytes per slot. Must equal the size of the stored payload type.
    pub payload_size: usize,
    /// How `dump` renders slot contents.
    pub renderer: Renderer,
}

impl RingConfig {
    /// Creates a configuration with an explicit slot size.
    ///
    /// # Example
    /// ```
    /// use basalt_ring::RingConfig;
    /// let cfg = RingConfig::new(4, 4);
    /// assert_eq!(cfg.capacity, 4);
    /// ```
    pub fn new(capacity: usize, payload_size: usize) -> Self {
        Self {
            capacity,
            payload_size,
            renderer: Renderer::default(),
        }
    }

    /// Creates a configuration whose slot size is exactly `size_of::<T>()`.
    ///
    /// # Example
    /// ```
    /// use basalt_ring::RingConfig;
    /// let cfg = RingConfig::for_payload::<u64>(16);
    /// assert_eq!(cfg.payload_size, 8);
    /// ```
    pub fn for_payload<T: Copy>(capacity: usize) -> Self {
        Self::new(capacity, size_of::<T>())
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }
}

/// Steps a cursor forward one slot, wrapping to 0 after the last index.
///
/// ```text
/// capacity = 3:  0 → 1 → 2 → 0 → 1 ...
/// capacity = 1:  0 → 0 → 0 ...
/// ```
#[inline(always)]
pub fn advance(idx: usize, capacity: usize) -> usize {
    let next = idx + 1;
    if next == capacity { 0 } else { next }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_wraps_at_capacity() {
        assert_eq!(advance(0, 3), 1);
        assert_eq!(advance(2, 3), 0);
        assert_eq!(advance(0, 1), 0);
    }
}
