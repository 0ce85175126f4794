//! Derivative-of-Gaussian filters
//!
//! Every filter builds its kernels once per call and composes separable convolutions.
//! Scalar outputs keep the input shape. Multi-component outputs append a trailing axis
//! holding the components in the order documented per filter.

/// Filters with one value per point
mod ops;
pub use ops::*;

/// Gradient, Hessian and structure tensor filters with a component axis
mod tensor;
pub use tensor::*;

use scalespace_tensor::{Tensor, TensorView};

use crate::convolve::{convolve, FilterElement};
use crate::error::FilterError;
use crate::kernels::Kernel1D;

pub(crate) fn check_rank<const N: usize>() -> Result<(), FilterError> {
    if N == 2 || N == 3 {
        Ok(())
    } else {
        Err(FilterError::InvalidRank(N))
    }
}

// `special` on the listed axes, `smooth` on all others
fn convolve_mixed<T: FilterElement, const N: usize>(
    src: &TensorView<'_, T, N>,
    special: &Kernel1D,
    axes: &[usize],
    smooth: &Kernel1D,
) -> Result<Tensor<T, N>, FilterError> {
    let kernels: [&Kernel1D; N] =
        std::array::from_fn(|axis| if axes.contains(&axis) { special } else { smooth });
    convolve(src, kernels, None)
}
