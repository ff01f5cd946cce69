//! Error types returned by the deconvolution routines.
//!
//! Every argument problem is reported through [`DeconvolutionError::InvalidArgument`]
//! before any padding or transform work starts, so a failed call never leaves
//! a partial result behind.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DeconvolutionError>;

/// Top level error of the crate.
#[derive(Debug, Error)]
pub enum DeconvolutionError {
    /// A caller supplied argument violated a precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),
    /// A transform was handed a buffer of the wrong size.
    #[error("fft failed: {0}")]
    Fft(#[from] realfft::FftError),
}

impl DeconvolutionError {
    /// Returns `true` for precondition failures.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, DeconvolutionError::InvalidArgument(_))
    }
}

/// The individual precondition failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidArgument {
    #[error("pad mode not valid: {0:?} (expected \"log2\" or \"none\")")]
    PadMode(String),
    #[error("arrays must have at least one dimension")]
    EmptyRank,
    #[error("data rank {data} does not match kernel rank {kernel}")]
    RankMismatch { data: usize, kernel: usize },
    #[error("axis {axis} has zero extent")]
    EmptyAxis { axis: usize },
    #[error("data shape must be >= kernel shape: axis {axis} has data extent {data} < kernel extent {kernel}")]
    KernelExceedsData {
        axis: usize,
        data: usize,
        kernel: usize,
    },
    #[error("target extent {target} on axis {axis} is smaller than array extent {extent}")]
    TargetTooSmall {
        axis: usize,
        extent: usize,
        target: usize,
    },
    #[error("transform planned for shape {expected:?} was given shape {actual:?}")]
    TransformShape {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("epsilon must be finite and non-negative, got {0}")]
    Epsilon(f64),
    #[error("initial estimate must be finite and positive, got {0}")]
    InitialEstimate(f64),
    #[error("sigma on axis {axis} must be finite and positive")]
    Sigma { axis: usize },
    #[error("index {index} on axis {axis} is outside extent {extent}")]
    PointOutOfBounds {
        axis: usize,
        index: usize,
        extent: usize,
    },
}
