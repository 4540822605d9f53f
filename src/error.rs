// THEORY:
// A single error type for the whole detection core. Almost every stage is a pure
// function of its inputs and cannot fail; the variants below cover the handful of
// precondition violations (unknown color, background misuse, size mismatch) and
// configuration problems that can surface at startup. Frame acquisition failure is
// deliberately absent: a failed read ends the run loop normally and is reported as a
// `StopReason`, not an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectionError {
    /// The requested color identifier has no profile in the registry.
    #[error("unknown color identifier `{0}`")]
    UnknownColor(String),

    /// The background reference was read before it was captured.
    #[error("background reference has not been captured yet")]
    BackgroundNotInitialized,

    /// A second capture was attempted on an already initialized background.
    #[error("background reference was already captured")]
    BackgroundAlreadyCaptured,

    /// A frame or mask does not match the dimensions it is combined with.
    #[error("dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DetectionError>;
