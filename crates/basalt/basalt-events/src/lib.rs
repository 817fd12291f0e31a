pub mod event;
pub mod payload;

pub use event::{EventKind, EventRecord};
pub use payload::{END_OF_STREAM, Payload, Sample};
