use std::io;

#[derive(Debug, thiserror::Error)]
pub enum RingError {
    #[error("ring capacity must be at least 1")]
    ZeroCapacity,

    #[error("payload size must be at least 1 byte")]
    ZeroPayloadSize,

    #[error("payload size mismatch: ring slots are {configured} bytes, payload type is {actual} bytes")]
    PayloadSize { configured: usize, actual: usize },

    #[error("failed to map slot storage")]
    Storage(#[source] io::Error),
}
