use rayon::prelude::*;
use scalespace_tensor::{Tensor, TensorView};

use super::{check_rank, convolve_mixed};
use crate::convolve::{convolve, FilterElement};
use crate::error::FilterError;
use crate::kernels::{gaussian_kernel_1d, WindowPolicy};
use crate::linalg::{self, eigenvalues_2x2, eigenvalues_3x3};

// points per rayon job when interleaving components
const MIN_POINTS: usize = 1024;

// (i, j) with i <= j, row by row
fn upper_triangle(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| (i..n).map(move |j| (i, j)))
}

fn gradient_components<T: FilterElement, const N: usize>(
    src: &TensorView<'_, T, N>,
    sigma: f64,
    window: WindowPolicy,
) -> Result<Vec<Tensor<T, N>>, FilterError> {
    check_rank::<N>()?;
    let smooth = gaussian_kernel_1d(0, sigma, window)?;
    let deriv = gaussian_kernel_1d(1, sigma, window)?;
    (0..N)
        .map(|axis| convolve_mixed(src, &deriv, &[axis], &smooth))
        .collect()
}

fn hessian_components<T: FilterElement, const N: usize>(
    src: &TensorView<'_, T, N>,
    sigma: f64,
    window: WindowPolicy,
) -> Result<Vec<Tensor<T, N>>, FilterError> {
    check_rank::<N>()?;
    let smooth = gaussian_kernel_1d(0, sigma, window)?;
    let first = gaussian_kernel_1d(1, sigma, window)?;
    let second = gaussian_kernel_1d(2, sigma, window)?;
    upper_triangle(N)
        .map(|(i, j)| {
            if i == j {
                convolve_mixed(src, &second, &[i], &smooth)
            } else {
                convolve_mixed(src, &first, &[i, j], &smooth)
            }
        })
        .collect()
}

fn structure_tensor_components<T: FilterElement, const N: usize>(
    src: &TensorView<'_, T, N>,
    inner_sigma: f64,
    outer_sigma: f64,
    window: WindowPolicy,
) -> Result<Vec<Tensor<T, N>>, FilterError> {
    let gradient = gradient_components(src, inner_sigma, window)?;
    let outer = gaussian_kernel_1d(0, outer_sigma, window)?;
    upper_triangle(N)
        .map(|(i, j)| -> Result<Tensor<T, N>, FilterError> {
            let product = linalg::mul(gradient[i].as_slice(), gradient[j].as_slice());
            let view = TensorView::from_slice(src.shape, &product)?;
            convolve(&view, [&outer; N], None)
        })
        .collect()
}

// Interleaves the components into a trailing axis. `M` is always `N + 1`.
fn stack_components<T: FilterElement, const N: usize, const M: usize>(
    shape: [usize; N],
    components: &[Tensor<T, N>],
) -> Result<Tensor<T, M>, FilterError> {
    let count = components.len();
    let out_shape: [usize; M] = std::array::from_fn(|a| if a < N { shape[a] } else { count });
    let mut data = vec![T::zero(); out_shape.iter().product()];
    data.par_chunks_mut(count)
        .enumerate()
        .with_min_len(MIN_POINTS)
        .for_each(|(p, point)| {
            for (v, component) in point.iter_mut().zip(components) {
                *v = component.as_slice()[p];
            }
        });
    Ok(Tensor::from_shape_vec(out_shape, data)?)
}

// Solves the per-point symmetric eigenproblem and writes the eigenvalues into a trailing
// axis. `M` is always `N + 1`.
fn eigenvalue_components<T, const N: usize, const M: usize, const C: usize, const E: usize>(
    shape: [usize; N],
    components: &[Tensor<T, N>],
    solve: fn([T; C]) -> [T; E],
) -> Result<Tensor<T, M>, FilterError>
where
    T: FilterElement,
{
    let out_shape: [usize; M] = std::array::from_fn(|a| if a < N { shape[a] } else { E });
    let mut data = vec![T::zero(); out_shape.iter().product()];
    data.par_chunks_mut(E)
        .enumerate()
        .with_min_len(MIN_POINTS)
        .for_each(|(p, point)| {
            let matrix: [T; C] = std::array::from_fn(|c| components[c].as_slice()[p]);
            point.copy_from_slice(&solve(matrix));
        });
    Ok(Tensor::from_shape_vec(out_shape, data)?)
}

/// Compute the Gaussian gradient of a 2-D array.
///
/// # Returns
///
/// An array of shape `[rows, cols, 2]` holding `[d/d0, d/d1]` per point.
pub fn gaussian_gradient_2d<T: FilterElement>(
    src: &TensorView<'_, T, 2>,
    sigma: f64,
    window: WindowPolicy,
) -> Result<Tensor<T, 3>, FilterError> {
    let components = gradient_components(src, sigma, window)?;
    stack_components(src.shape, &components)
}

/// Compute the Gaussian gradient of a 3-D array.
///
/// # Returns
///
/// An array of shape `[n0, n1, n2, 3]` holding `[d/d0, d/d1, d/d2]` per point.
pub fn gaussian_gradient_3d<T: FilterElement>(
    src: &TensorView<'_, T, 3>,
    sigma: f64,
    window: WindowPolicy,
) -> Result<Tensor<T, 4>, FilterError> {
    let components = gradient_components(src, sigma, window)?;
    stack_components(src.shape, &components)
}

/// Compute the Hessian of Gaussian of a 2-D array.
///
/// Diagonal entries use a second-order kernel along their axis; the off-diagonal entry
/// uses first-order kernels along both axes.
///
/// # Returns
///
/// An array of shape `[rows, cols, 3]` holding `[h00, h01, h11]` per point.
pub fn hessian_of_gaussian_2d<T: FilterElement>(
    src: &TensorView<'_, T, 2>,
    sigma: f64,
    window: WindowPolicy,
) -> Result<Tensor<T, 3>, FilterError> {
    let components = hessian_components(src, sigma, window)?;
    stack_components(src.shape, &components)
}

/// Compute the Hessian of Gaussian of a 3-D array.
///
/// # Returns
///
/// An array of shape `[n0, n1, n2, 6]` holding `[h00, h01, h02, h11, h12, h22]` per point.
pub fn hessian_of_gaussian_3d<T: FilterElement>(
    src: &TensorView<'_, T, 3>,
    sigma: f64,
    window: WindowPolicy,
) -> Result<Tensor<T, 4>, FilterError> {
    let components = hessian_components(src, sigma, window)?;
    stack_components(src.shape, &components)
}

/// Compute the structure tensor of a 2-D array.
///
/// The gradient is taken at `inner_sigma`; every product of two partials is then smoothed
/// at `outer_sigma`.
///
/// # Returns
///
/// An array of shape `[rows, cols, 3]` holding `[t00, t01, t11]` per point.
pub fn structure_tensor_2d<T: FilterElement>(
    src: &TensorView<'_, T, 2>,
    inner_sigma: f64,
    outer_sigma: f64,
    window: WindowPolicy,
) -> Result<Tensor<T, 3>, FilterError> {
    let components = structure_tensor_components(src, inner_sigma, outer_sigma, window)?;
    stack_components(src.shape, &components)
}

/// Compute the structure tensor of a 3-D array.
///
/// # Returns
///
/// An array of shape `[n0, n1, n2, 6]` holding `[t00, t01, t02, t11, t12, t22]` per point.
pub fn structure_tensor_3d<T: FilterElement>(
    src: &TensorView<'_, T, 3>,
    inner_sigma: f64,
    outer_sigma: f64,
    window: WindowPolicy,
) -> Result<Tensor<T, 4>, FilterError> {
    let components = structure_tensor_components(src, inner_sigma, outer_sigma, window)?;
    stack_components(src.shape, &components)
}

/// Compute the eigenvalues of the Hessian of Gaussian of a 2-D array.
///
/// # Arguments
///
/// * `src` - The source array, contiguous.
/// * `sigma` - The scale of the Gaussian.
/// * `window` - The window policy deriving the kernel radius.
///
/// # Returns
///
/// An array of shape `[rows, cols, 2]` with the eigenvalues of every point, largest first.
///
/// # Example
///
/// ```
/// use scalespace_imgproc::filter::hessian_of_gaussian_eigenvalues_2d;
/// use scalespace_imgproc::kernels::WindowPolicy;
/// use scalespace_tensor::Tensor;
///
/// let src = Tensor::<f64, 2>::from_shape_fn([32, 32], |[y, x]| {
///     let (y, x) = (y as f64, x as f64);
///     3.0 * y * y + x * x
/// })
/// .unwrap();
/// let ev = hessian_of_gaussian_eigenvalues_2d(&src.view(), 1.0, WindowPolicy::Ratio(3.0)).unwrap();
/// assert_eq!(ev.shape, [32, 32, 2]);
/// assert!((ev.get([16, 16, 0]).unwrap() - 6.0).abs() < 1e-9);
/// assert!((ev.get([16, 16, 1]).unwrap() - 2.0).abs() < 1e-9);
/// ```
pub fn hessian_of_gaussian_eigenvalues_2d<T: FilterElement>(
    src: &TensorView<'_, T, 2>,
    sigma: f64,
    window: WindowPolicy,
) -> Result<Tensor<T, 3>, FilterError> {
    let components = hessian_components(src, sigma, window)?;
    eigenvalue_components(src.shape, &components, eigenvalues_2x2::<T>)
}

/// Compute the eigenvalues of the Hessian of Gaussian of a 3-D array.
///
/// # Returns
///
/// An array of shape `[n0, n1, n2, 3]` with the eigenvalues of every point, largest first.
pub fn hessian_of_gaussian_eigenvalues_3d<T: FilterElement>(
    src: &TensorView<'_, T, 3>,
    sigma: f64,
    window: WindowPolicy,
) -> Result<Tensor<T, 4>, FilterError> {
    let components = hessian_components(src, sigma, window)?;
    eigenvalue_components(src.shape, &components, eigenvalues_3x3::<T>)
}

/// Compute the eigenvalues of the structure tensor of a 2-D array.
///
/// # Arguments
///
/// * `src` - The source array, contiguous.
/// * `inner_sigma` - The scale of the gradient.
/// * `outer_sigma` - The scale of the smoothing applied to the gradient products.
/// * `window` - The window policy deriving the kernel radii.
///
/// # Returns
///
/// An array of shape `[rows, cols, 2]` with the eigenvalues of every point, largest first.
pub fn structure_tensor_eigenvalues_2d<T: FilterElement>(
    src: &TensorView<'_, T, 2>,
    inner_sigma: f64,
    outer_sigma: f64,
    window: WindowPolicy,
) -> Result<Tensor<T, 3>, FilterError> {
    let components = structure_tensor_components(src, inner_sigma, outer_sigma, window)?;
    eigenvalue_components(src.shape, &components, eigenvalues_2x2::<T>)
}

/// Compute the eigenvalues of the structure tensor of a 3-D array.
///
/// # Returns
///
/// An array of shape `[n0, n1, n2, 3]` with the eigenvalues of every point, largest first.
pub fn structure_tensor_eigenvalues_3d<T: FilterElement>(
    src: &TensorView<'_, T, 3>,
    inner_sigma: f64,
    outer_sigma: f64,
    window: WindowPolicy,
) -> Result<Tensor<T, 4>, FilterError> {
    let components = structure_tensor_components(src, inner_sigma, outer_sigma, window)?;
    eigenvalue_components(src.shape, &components, eigenvalues_3x3::<T>)
}
