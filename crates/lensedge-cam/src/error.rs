//! Error types for path generation.

use thiserror::Error;

/// Errors that can occur while building machine paths.
#[derive(Debug, Clone, Error)]
pub enum CamError {
    /// Transition feed rate must be strictly positive.
    #[error("feed rate must be positive, got {0} mm/s")]
    NonPositiveFeedRate(f64),

    /// Spindle period must be strictly positive.
    #[error("spindle period must be positive, got {0} s/rev")]
    NonPositiveSpindlePeriod(f64),

    /// A contour with no samples cannot be cut.
    #[error("contour has no samples")]
    EmptyContour,

    /// Kinematics solution arrays disagree in length.
    #[error("kinematics solution arrays have mismatched lengths: {0}")]
    MismatchedSolution(String),

    /// The kinematics solver found no safe tool path for a contour.
    #[error("no safe tool path exists: {0}")]
    NoToolPath(String),

    /// The tool stack is missing a wheel required by an operation.
    #[error("tool stack has no {0} wheel")]
    MissingWheel(&'static str),

    /// Operation step arrays disagree in length.
    #[error("operation step arrays have mismatched lengths: {0}")]
    MismatchedStep(String),

    /// Step time must start at 0 and never decrease.
    #[error("step time must start at 0 and be non-decreasing")]
    NonMonotonicTime,
}

/// Result type for path generation operations.
pub type CamResult<T> = std::result::Result<T, CamError>;
