mod config;
mod error;
mod overwrite;
mod render;

pub use config::{RingConfig, advance};
pub use error::RingError;
pub use overwrite::{Cursors, EnqueueOutcome, OverwriteRing};
pub use render::Renderer;
