use scalespace_tensor::TensorError;
use thiserror::Error;

use crate::parallel::ParallelError;

/// Coarse classification of a [`FilterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A caller-supplied value is out of its domain (sigma, order, ROI, rank, ...).
    InvalidParameter,
    /// The buffer handed to the engine is not dense row-major.
    UnsupportedArrayLayout,
    /// No SIMD tier is usable in this build on this host.
    ConfigurationFatal,
}

/// An error type for the filter engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Sigma must be a finite, strictly positive number.
    #[error("Invalid sigma {0}: must be finite and > 0")]
    InvalidSigma(f64),

    /// Only Gaussian derivatives of order 0, 1 and 2 are supported.
    #[error("Invalid derivative order {0}: must be 0, 1 or 2")]
    InvalidDerivativeOrder(u32),

    /// An explicit window ratio must be finite and positive.
    #[error("Invalid window ratio {0}: must be finite and > 0")]
    InvalidWindowRatio(f64),

    /// The sampled kernel vanished before it could be normalized.
    #[error("Sigma {sigma} is too small to build a derivative kernel of order {order}")]
    DegenerateKernel {
        /// Requested derivative order
        order: u32,
        /// Requested sigma
        sigma: f64,
    },

    /// Only 2-D and 3-D arrays are filtered.
    #[error("Invalid rank {0}: only 2-D and 3-D arrays are supported")]
    InvalidRank(usize),

    /// The region of interest is empty or leaves the array.
    #[error("ROI [{start}, {stop}) on axis {axis} is outside of [0, {size})")]
    RoiOutOfBounds {
        /// The offending axis
        axis: usize,
        /// First index of the ROI on that axis
        start: usize,
        /// One past the last index of the ROI on that axis
        stop: usize,
        /// Length of the array on that axis
        size: usize,
    },

    /// The input view is not dense row-major.
    #[error("Array layout with shape {shape:?} and strides {strides:?} is not contiguous row-major")]
    NonContiguousLayout {
        /// Shape of the rejected view
        shape: Vec<usize>,
        /// Strides of the rejected view
        strides: Vec<usize>,
    },

    /// Row taps that disagree with the kernel or reach past the source.
    #[error("Row taps for {taps} coefficients need {required} source elements, got {coefficients} coefficients and {available} elements")]
    InvalidRowTaps {
        /// Coefficients the taps expect, radius plus one
        taps: usize,
        /// Coefficients supplied
        coefficients: usize,
        /// Source elements the taps read
        required: usize,
        /// Source elements supplied
        available: usize,
    },

    /// No usable SIMD tier could be selected.
    #[error("No usable SIMD tier: {0}")]
    ConfigurationFatal(String),

    /// Error from the tensor containers.
    #[error(transparent)]
    Tensor(#[from] TensorError),

    /// Error while setting up parallel execution.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}

impl FilterError {
    /// Maps the error onto the engine's error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FilterError::NonContiguousLayout { .. } => ErrorKind::UnsupportedArrayLayout,
            FilterError::ConfigurationFatal(_) => ErrorKind::ConfigurationFatal,
            _ => ErrorKind::InvalidParameter,
        }
    }
}
