use scalespace_tensor::{Tensor, TensorView};

use super::{check_rank, convolve_mixed};
use crate::convolve::{convolve, FilterElement};
use crate::error::FilterError;
use crate::kernels::{gaussian_kernel_1d, WindowPolicy};
use crate::linalg;

/// Smooth an array with a Gaussian.
///
/// # Arguments
///
/// * `src` - The source array, 2-D or 3-D, contiguous.
/// * `sigma` - The scale of the Gaussian.
/// * `window` - The window policy deriving the kernel radius.
///
/// # Returns
///
/// The smoothed array, same shape as `src`.
///
/// # Example
///
/// ```
/// use scalespace_imgproc::filter::gaussian_smoothing;
/// use scalespace_imgproc::kernels::WindowPolicy;
/// use scalespace_tensor::Tensor;
///
/// let src = Tensor::<f32, 2>::from_shape_val([16, 16], 2.0).unwrap();
/// let dst = gaussian_smoothing(&src.view(), 1.0, WindowPolicy::Default).unwrap();
/// assert!(dst.as_slice().iter().all(|v| (v - 2.0).abs() < 1e-5));
/// ```
pub fn gaussian_smoothing<T: FilterElement, const N: usize>(
    src: &TensorView<'_, T, N>,
    sigma: f64,
    window: WindowPolicy,
) -> Result<Tensor<T, N>, FilterError> {
    gaussian_derivative(src, sigma, 0, window)
}

/// Apply the same Gaussian derivative order along every axis.
///
/// Order 0 smooths, order 1 yields the mixed derivative `d^N / dx0 .. dxN`, order 2 the
/// product of second derivatives.
///
/// # Arguments
///
/// * `src` - The source array, 2-D or 3-D, contiguous.
/// * `sigma` - The scale of the Gaussian.
/// * `order` - The derivative order, 0, 1 or 2.
/// * `window` - The window policy deriving the kernel radius.
pub fn gaussian_derivative<T: FilterElement, const N: usize>(
    src: &TensorView<'_, T, N>,
    sigma: f64,
    order: u32,
    window: WindowPolicy,
) -> Result<Tensor<T, N>, FilterError> {
    check_rank::<N>()?;
    let kernel = gaussian_kernel_1d(order, sigma, window)?;
    convolve(src, [&kernel; N], None)
}

/// Compute the magnitude of the Gaussian gradient.
///
/// Every partial derivative uses a first-order kernel along its axis and smoothing along
/// the others; the result is `sqrt(sum_i d_i^2)` per point.
///
/// # Arguments
///
/// * `src` - The source array, 2-D or 3-D, contiguous.
/// * `sigma` - The scale of the Gaussian.
/// * `window` - The window policy deriving the kernel radius.
pub fn gaussian_gradient_magnitude<T: FilterElement, const N: usize>(
    src: &TensorView<'_, T, N>,
    sigma: f64,
    window: WindowPolicy,
) -> Result<Tensor<T, N>, FilterError> {
    check_rank::<N>()?;
    let smooth = gaussian_kernel_1d(0, sigma, window)?;
    let deriv = gaussian_kernel_1d(1, sigma, window)?;

    let mut acc = Tensor::from_shape_val(src.shape, T::zero())?;
    for axis in 0..N {
        let partial = convolve_mixed(src, &deriv, &[axis], &smooth)?;
        linalg::add_squared(acc.as_slice_mut(), partial.as_slice());
    }
    linalg::sqrt_in_place(acc.as_slice_mut());
    Ok(acc)
}

/// Compute the Laplacian of Gaussian, the sum of the second derivatives along every axis.
///
/// # Arguments
///
/// * `src` - The source array, 2-D or 3-D, contiguous.
/// * `sigma` - The scale of the Gaussian.
/// * `window` - The window policy deriving the kernel radius.
pub fn laplacian_of_gaussian<T: FilterElement, const N: usize>(
    src: &TensorView<'_, T, N>,
    sigma: f64,
    window: WindowPolicy,
) -> Result<Tensor<T, N>, FilterError> {
    check_rank::<N>()?;
    let smooth = gaussian_kernel_1d(0, sigma, window)?;
    let deriv = gaussian_kernel_1d(2, sigma, window)?;

    let mut acc = convolve_mixed(src, &deriv, &[0], &smooth)?;
    for axis in 1..N {
        let partial = convolve_mixed(src, &deriv, &[axis], &smooth)?;
        linalg::add_assign(acc.as_slice_mut(), partial.as_slice());
    }
    Ok(acc)
}
