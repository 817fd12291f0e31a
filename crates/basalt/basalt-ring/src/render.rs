/// Per-slot rendering used by [`OverwriteRing::dump`](crate::OverwriteRing::dump).
///
/// Chosen once when the ring is configured; rendering only borrows the slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Renderer {
    /// The payload's 32-bit tag.
    #[default]
    Tag,
    /// The payload's full `Debug` form.
    Debug,
}
