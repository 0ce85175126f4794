#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! The crate computes Gaussian smoothing and derivative-of-Gaussian filters on 2-D and
//! 3-D arrays of `f32` or `f64`:
//!
//! - [`kernels`] samples the FIR kernels of order 0, 1 and 2.
//! - [`convolve`] runs the separable convolution with mirror boundaries and optional
//!   region of interest, on the widest SIMD tier the host supports.
//! - [`filter`] builds the derived filters on top: gradient magnitude, Laplacian,
//!   Hessian and structure tensor, and their eigenvalues.
//!
//! ```rust
//! use scalespace_imgproc::filter::gaussian_gradient_magnitude;
//! use scalespace_imgproc::kernels::WindowPolicy;
//! use scalespace_tensor::Tensor;
//!
//! let src = Tensor::<f32, 2>::from_shape_fn([64, 64], |[y, x]| (x + y) as f32).unwrap();
//! let mag = gaussian_gradient_magnitude(&src.view(), 2.0, WindowPolicy::Default).unwrap();
//! assert_eq!(mag.shape, [64, 64]);
//! ```

/// run-time CPU capability detection.
pub mod cpu;

/// separable convolution engine.
pub mod convolve;

/// error types for the filter engine.
pub mod error;

/// derivative-of-Gaussian filters.
pub mod filter;

/// Gaussian kernel factory.
pub mod kernels;

/// eigenvalues and pointwise helpers.
pub mod linalg;

/// module containing parallelization utilities.
pub mod parallel;

pub use crate::convolve::{convolve, convolve_with_options, ConvolveOptions, FilterElement, Roi};
pub use crate::cpu::{CapabilitySet, SimdTier};
pub use crate::error::{ErrorKind, FilterError};
pub use crate::kernels::{gaussian_kernel_1d, Kernel1D, WindowPolicy};
pub use crate::parallel::{ExecutionStrategy, LineExecutor};
