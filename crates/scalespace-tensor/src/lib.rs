#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `scalespace-tensor` holds the plain data containers the filter engine reads and
//! writes:
//!
//! - **Tensor**: an owned, row-major N-dimensional buffer.
//! - **TensorView**: a borrowed view with its own shape, strides and offset. Views over
//!   sub-regions are generally not contiguous; [`TensorView::as_contiguous`] performs
//!   the copy the filter engine refuses to do on its own.
//!
//! ```rust
//! use scalespace_tensor::{Tensor, TensorView};
//!
//! let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
//! let view = TensorView::from_slice([3, 4], &data).unwrap();
//! assert!(view.is_standard_layout());
//!
//! // the inner 2x2 block is strided, copy it to make it contiguous
//! let block = view.slice([1, 1], [3, 3]).unwrap();
//! assert!(!block.is_standard_layout());
//! let owned: Tensor<f32, 2> = block.as_contiguous();
//! assert_eq!(owned.as_slice(), &[5.0, 6.0, 9.0, 10.0]);
//! ```

/// Tensor module containing the owned tensor and its error type.
pub mod tensor;

/// View module containing borrowed, possibly strided tensor views.
pub mod view;

pub use crate::tensor::{get_strides_from_shape, Tensor, TensorError};
pub use crate::view::TensorView;

/// Type alias for a 2-dimensional tensor.
pub type Tensor2<T> = Tensor<T, 2>;

/// Type alias for a 3-dimensional tensor.
pub type Tensor3<T> = Tensor<T, 3>;

/// Type alias for a 4-dimensional tensor.
pub type Tensor4<T> = Tensor<T, 4>;
