use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
pub enum Error {
    #[error("at least 2 cost samples are needed to estimate a burn rate, found {found}")]
    InsufficientSamples { found: usize },

    #[error("hour of day must be between 0 and 23, got {0}")]
    InvalidHour(u8),
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum CollectError<E> {
    #[error("telemetry stream ended after {received} of {expected} samples")]
    StreamExhausted { expected: usize, received: usize },

    #[error("telemetry stream failed: {0}")]
    Stream(E),
}
