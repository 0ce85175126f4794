//! Separable N-dimensional FIR convolution with mirror boundaries.
//!
//! A convolution runs one 1-D pass per axis, the last (contiguous) axis first. Every pass
//! only covers the window the remaining passes still need, so a region of interest is
//! produced without computing the full result, and the values match the full result
//! bit for bit.

mod boundary;
mod simd;

use std::ops::Range;

use scalespace_tensor::{get_strides_from_shape, Tensor, TensorView};

use crate::cpu::{self, SimdTier};
use crate::error::FilterError;
use crate::kernels::Kernel1D;
use crate::parallel::{ExecutionStrategy, LineExecutor};

pub use boundary::{halo_range, mirror_index};
pub use simd::{select_implementation, FilterElement, FirRowKernel, RowFn, RowTaps};

/// A box `[start, stop)` of output indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi<const N: usize> {
    /// First index on every axis.
    pub start: [usize; N],
    /// One past the last index on every axis.
    pub stop: [usize; N],
}

impl<const N: usize> Roi<N> {
    /// Creates a region from its corners.
    pub fn new(start: [usize; N], stop: [usize; N]) -> Self {
        Self { start, stop }
    }

    /// The region covering a whole array.
    pub fn full(shape: [usize; N]) -> Self {
        Self {
            start: [0; N],
            stop: shape,
        }
    }

    /// Extent of the region on every axis.
    pub fn shape(&self) -> [usize; N] {
        std::array::from_fn(|axis| self.stop[axis].saturating_sub(self.start[axis]))
    }

    /// Range covered on one axis.
    pub fn axis_range(&self, axis: usize) -> Range<usize> {
        self.start[axis]..self.stop[axis]
    }

    /// Checks that the region is non-empty and inside an array of the given shape.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::RoiOutOfBounds`] naming the first offending axis.
    pub fn validate(&self, shape: &[usize; N]) -> Result<(), FilterError> {
        for axis in 0..N {
            let (start, stop, size) = (self.start[axis], self.stop[axis], shape[axis]);
            if start >= stop || stop > size {
                return Err(FilterError::RoiOutOfBounds {
                    axis,
                    start,
                    stop,
                    size,
                });
            }
        }
        Ok(())
    }
}

/// Knobs of a single convolution call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConvolveOptions {
    /// How the lines of every pass are scheduled.
    pub strategy: ExecutionStrategy,
    /// Widest SIMD tier the call may use; `None` lets the host decide.
    pub max_tier: Option<SimdTier>,
}

/// Convolve an array with one kernel per axis.
///
/// # Arguments
///
/// * `src` - A contiguous row-major 2-D or 3-D array.
/// * `kernels` - The kernel of every axis, in axis order.
/// * `roi` - The region to produce, the whole array if `None`.
///
/// # Returns
///
/// A tensor with the shape of the region.
///
/// # Errors
///
/// Invalid rank or region, a non-contiguous input, or no usable SIMD tier.
///
/// # Example
///
/// ```
/// use scalespace_imgproc::convolve::{convolve, Roi};
/// use scalespace_imgproc::kernels::{gaussian_kernel_1d, WindowPolicy};
/// use scalespace_tensor::TensorView;
///
/// let data = vec![1.0f32; 20 * 30];
/// let src = TensorView::from_slice([20, 30], &data).unwrap();
/// let k = gaussian_kernel_1d(0, 1.5, WindowPolicy::Default).unwrap();
///
/// let roi = Roi::new([5, 5], [10, 25]);
/// let dst = convolve(&src, [&k, &k], Some(&roi)).unwrap();
/// assert_eq!(dst.shape, [5, 20]);
/// assert!(dst.as_slice().iter().all(|v| (v - 1.0).abs() < 1e-5));
/// ```
pub fn convolve<T, const N: usize>(
    src: &TensorView<'_, T, N>,
    kernels: [&Kernel1D; N],
    roi: Option<&Roi<N>>,
) -> Result<Tensor<T, N>, FilterError>
where
    T: FilterElement,
{
    convolve_with_options(src, kernels, roi, &ConvolveOptions::default())
}

/// Convolve an array with one kernel per axis, with explicit execution options.
///
/// See [`convolve`].
pub fn convolve_with_options<T, const N: usize>(
    src: &TensorView<'_, T, N>,
    kernels: [&Kernel1D; N],
    roi: Option<&Roi<N>>,
    options: &ConvolveOptions,
) -> Result<Tensor<T, N>, FilterError>
where
    T: FilterElement,
{
    if N != 2 && N != 3 {
        return Err(FilterError::InvalidRank(N));
    }
    let data = src
        .as_contiguous_slice()
        .ok_or_else(|| FilterError::NonContiguousLayout {
            shape: src.shape.to_vec(),
            strides: src.strides.to_vec(),
        })?;

    let roi = match roi {
        Some(roi) => {
            roi.validate(&src.shape)?;
            *roi
        }
        None => Roi::full(src.shape),
    };

    let tier = cpu::select_tier(options.max_tier)?;

    let window: [Range<usize>; N] = std::array::from_fn(|axis| {
        halo_range(
            roi.start[axis],
            roi.stop[axis],
            kernels[axis].radius(),
            src.shape[axis],
        )
    });

    let executor = LineExecutor::new(options.strategy)?;
    let (mut buffer, mut shape) = innermost_pass(
        data,
        src.shape,
        &window,
        &roi,
        kernels[N - 1],
        tier,
        &executor,
    )?;

    for axis in (0..N - 1).rev() {
        (buffer, shape) = outer_pass(
            &buffer,
            shape,
            axis,
            src.shape[axis],
            window[axis].start,
            roi.axis_range(axis),
            kernels[axis],
            tier,
            &executor,
        )?;
    }

    Ok(Tensor::from_shape_vec(shape, buffer)?)
}

fn element_coefficients<T: FilterElement>(kernel: &Kernel1D) -> Vec<T> {
    kernel
        .half_coefficients()
        .into_iter()
        .map(T::from_coefficient)
        .collect()
}

// offset in the source of the first element of an output line of the innermost pass
fn line_offset<const N: usize>(
    mut line: usize,
    shape: &[usize; N],
    window: &[Range<usize>; N],
    strides: &[usize; N],
) -> usize {
    let mut offset = 0;
    for axis in (0..N - 1).rev() {
        offset += (window[axis].start + line % shape[axis]) * strides[axis];
        line /= shape[axis];
    }
    offset
}

// Filters the contiguous axis. Outer axes keep their halo window; every line is copied
// with its mirrored border into a scratch row that the row routine reads with shifted
// taps.
fn innermost_pass<T: FilterElement, const N: usize>(
    data: &[T],
    src_shape: [usize; N],
    window: &[Range<usize>; N],
    roi: &Roi<N>,
    kernel: &Kernel1D,
    tier: SimdTier,
    executor: &LineExecutor,
) -> Result<(Vec<T>, [usize; N]), FilterError> {
    let axis = N - 1;
    let radius = kernel.radius();
    let axis_len = src_shape[axis];
    let strides = get_strides_from_shape(src_shape);

    let mut shape: [usize; N] = std::array::from_fn(|a| window[a].len());
    shape[axis] = roi.stop[axis] - roi.start[axis];
    let len = shape[axis];
    let first = roi.start[axis] as isize - radius as isize;

    let row = select_implementation::<T>(tier, kernel.symmetry())?;
    let coefs = element_coefficients::<T>(kernel);
    let mut out = vec![T::zero(); shape.iter().product()];

    log::trace!(
        "convolve axis {axis}: {} lines of {len}, radius {radius}, {:?}",
        out.len() / len,
        row
    );

    executor.for_each_line_init(
        &mut out,
        len,
        || {
            let mut taps = RowTaps::default();
            taps.fill(radius, |k| (radius as isize + k) as usize);
            (vec![T::zero(); len + 2 * radius], taps)
        },
        |(scratch, taps), index, line| {
            let base = line_offset(index, &shape, window, &strides);
            for (t, v) in scratch.iter_mut().enumerate() {
                *v = data[base + mirror_index(first + t as isize, axis_len)];
            }
            row.apply(&coefs, scratch, taps, line)
        },
    )?;

    Ok((out, shape))
}

// Filters an outer axis of a contiguous buffer. Output rows are whole runs of the
// trailing axes, so the taps select entire source rows through the mirror map.
#[allow(clippy::too_many_arguments)]
fn outer_pass<T: FilterElement, const N: usize>(
    src: &[T],
    shape: [usize; N],
    axis: usize,
    axis_len: usize,
    window_start: usize,
    range: Range<usize>,
    kernel: &Kernel1D,
    tier: SimdTier,
    executor: &LineExecutor,
) -> Result<(Vec<T>, [usize; N]), FilterError> {
    let radius = kernel.radius();
    let inner: usize = shape[axis + 1..].iter().product();
    let n_in = shape[axis];
    let n_out = range.len();

    let mut out_shape = shape;
    out_shape[axis] = n_out;

    let row = select_implementation::<T>(tier, kernel.symmetry())?;
    let coefs = element_coefficients::<T>(kernel);
    let mut out = vec![T::zero(); out_shape.iter().product()];

    log::trace!(
        "convolve axis {axis}: {} rows of {inner}, radius {radius}, {:?}",
        out.len() / inner,
        row
    );

    executor.for_each_line_init(&mut out, inner, RowTaps::default, |taps, index, line| {
        let (outer, i) = (index / n_out, index % n_out);
        let center = (range.start + i) as isize;
        taps.fill(radius, |k| {
            (outer * n_in + mirror_index(center + k, axis_len) - window_start) * inner
        });
        row.apply(&coefs, src, taps, line)
    })?;

    Ok((out, out_shape))
}
