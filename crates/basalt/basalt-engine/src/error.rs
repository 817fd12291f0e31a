use basalt_lock::Role;
use basalt_ring::RingError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to build queue")]
    Ring(#[from] RingError),

    #[error("{0:?} thread panicked")]
    RolePanicked(Role),
}
