//! Payload types carried by the queue.
//!
//! Every payload is a plain `Copy` value copied bitwise into a fixed-size slot.
//! Each one exposes a 32-bit tag: the value written to the event log and the
//! value compared against the end-of-stream sentinel.

use std::fmt::Debug;

/// Reserved tag marking end-of-stream. Never a legitimate payload value.
pub const END_OF_STREAM: u32 = 0xdead_beef;

pub trait Payload: Copy + Debug + Send + 'static {
    /// Value recorded for this payload in the event log.
    fn tag(&self) -> u32;

    /// Builds the payload a producer sends for `tag`.
    fn from_tag(tag: u32) -> Self;

    #[inline]
    fn sentinel() -> Self {
        Self::from_tag(END_OF_STREAM)
    }

    #[inline]
    fn is_sentinel(&self) -> bool {
        self.tag() == END_OF_STREAM
    }

    /// False when the value cannot have come from a whole, untorn copy.
    #[inline]
    fn is_intact(&self) -> bool {
        true
    }
}

impl Payload for u32 {
    #[inline]
    fn tag(&self) -> u32 {
        *self
    }

    #[inline]
    fn from_tag(tag: u32) -> Self {
        tag
    }
}

/// Number of derived lanes in a [`Sample`].
pub const SAMPLE_LANES: usize = 9;

/// A ten-lane record: one sequence tag plus nine floats derived from it.
///
/// The lanes are a pure function of `seq`, so a reader can tell whether the
/// copy it got out of a slot was torn by a concurrent write.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub seq: u32,
    pub lanes: [f32; SAMPLE_LANES],
}

impl Sample {
    pub fn new(seq: u32) -> Self {
        Self {
            seq,
            lanes: std::array::from_fn(|i| lane_value(seq, i)),
        }
    }

    fn lanes_match(&self) -> bool {
        self.lanes
            .iter()
            .enumerate()
            .all(|(i, v)| v.to_bits() == lane_value(self.seq, i).to_bits())
    }
}

#[inline]
fn lane_value(seq: u32, lane: usize) -> f32 {
    // Keep the mixed value under 2^24 so it is exact as an f32.
    let mixed = seq.wrapping_mul(0x9E37_79B1).rotate_left(lane as u32 * 3) & 0x00FF_FFFF;
    mixed as f32
}

impl Payload for Sample {
    #[inline]
    fn tag(&self) -> u32 {
        self.seq
    }

    #[inline]
    fn from_tag(tag: u32) -> Self {
        Sample::new(tag)
    }

    fn is_intact(&self) -> bool {
        self.lanes_match()
    }
}
