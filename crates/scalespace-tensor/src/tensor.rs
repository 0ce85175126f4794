use thiserror::Error;

use crate::view::TensorView;

/// An error type for tensor operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    /// Tensor shape does not match the provided data.
    #[error("Shape mismatch: expected {expected} elements for shape, but got {actual} elements in data")]
    InvalidShape {
        /// Expected number of elements based on shape
        expected: usize,
        /// Actual number of elements in the data
        actual: usize,
    },

    /// One of the axes has zero length.
    #[error("Axis {axis} has zero length")]
    EmptyAxis {
        /// The offending axis
        axis: usize,
    },

    /// Index exceeds tensor bounds.
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index that was attempted
        index: usize,
        /// The size of the dimension being indexed
        size: usize,
    },

    /// The strides and offset of a view reach past the end of the borrowed data.
    #[error("View reaches element {required} but the data holds only {available} elements")]
    ViewOutOfBounds {
        /// One past the largest element index the view can address
        required: usize,
        /// Number of elements in the borrowed data
        available: usize,
    },
}

impl TensorError {
    /// Creates an InvalidShape error.
    pub fn invalid_shape(expected: usize, actual: usize) -> Self {
        Self::InvalidShape { expected, actual }
    }
}

/// Compute the strides of a row-major (C-contiguous) buffer with the given shape.
///
/// # Example
///
/// ```
/// use scalespace_tensor::get_strides_from_shape;
///
/// assert_eq!(get_strides_from_shape([2, 3]), [3, 1]);
/// assert_eq!(get_strides_from_shape([2, 3, 4]), [12, 4, 1]);
/// ```
pub fn get_strides_from_shape<const N: usize>(shape: [usize; N]) -> [usize; N] {
    let mut strides: [usize; N] = [0; N];
    let mut stride = 1;
    for i in (0..shape.len()).rev() {
        strides[i] = stride;
        stride *= shape[i];
    }
    strides
}

pub(crate) fn check_non_empty<const N: usize>(shape: &[usize; N]) -> Result<(), TensorError> {
    match shape.iter().position(|&dim| dim == 0) {
        Some(axis) => Err(TensorError::EmptyAxis { axis }),
        None => Ok(()),
    }
}

/// A multi-dimensional array with owned, row-major data.
///
/// Every axis has a non-zero length and the data is always stored contiguously, so the
/// strides are fully determined by the shape.
///
/// # Example
///
/// ```
/// use scalespace_tensor::Tensor;
///
/// let t = Tensor::<f32, 2>::from_shape_vec([2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// assert_eq!(t.shape, [2, 2]);
/// assert_eq!(t.get([1, 0]), Some(&3.0));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor<T, const N: usize> {
    pub(crate) data: Vec<T>,
    /// The shape of the tensor.
    pub shape: [usize; N],
    /// The strides of the tensor data in memory.
    pub strides: [usize; N],
}

impl<T, const N: usize> Tensor<T, N> {
    /// Creates a new tensor from a shape and a row-major data vector.
    ///
    /// # Errors
    ///
    /// Fails if an axis is empty or the data length does not match the shape.
    pub fn from_shape_vec(shape: [usize; N], data: Vec<T>) -> Result<Self, TensorError> {
        check_non_empty(&shape)?;
        let numel = shape.iter().product::<usize>();
        if numel != data.len() {
            return Err(TensorError::invalid_shape(numel, data.len()));
        }
        Ok(Self {
            data,
            shape,
            strides: get_strides_from_shape(shape),
        })
    }

    /// Creates a new tensor filled with a single value.
    pub fn from_shape_val(shape: [usize; N], value: T) -> Result<Self, TensorError>
    where
        T: Clone,
    {
        let numel = shape.iter().product::<usize>();
        Self::from_shape_vec(shape, vec![value; numel])
    }

    /// Creates a new tensor whose elements are produced from their index.
    ///
    /// # Example
    ///
    /// ```
    /// use scalespace_tensor::Tensor;
    ///
    /// let t = Tensor::<usize, 2>::from_shape_fn([2, 3], |[r, c]| r * 10 + c).unwrap();
    /// assert_eq!(t.as_slice(), &[0, 1, 2, 10, 11, 12]);
    /// ```
    pub fn from_shape_fn<F>(shape: [usize; N], mut f: F) -> Result<Self, TensorError>
    where
        F: FnMut([usize; N]) -> T,
    {
        check_non_empty(&shape)?;
        let numel = shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(numel);
        let mut index = [0usize; N];
        for _ in 0..numel {
            data.push(f(index));
            for dim in (0..N).rev() {
                index[dim] += 1;
                if index[dim] < shape[dim] {
                    break;
                }
                index[dim] = 0;
            }
        }
        Self::from_shape_vec(shape, data)
    }

    /// Creates a tensor of zeros (the `Default` value of `T`).
    pub fn zeros(shape: [usize; N]) -> Result<Self, TensorError>
    where
        T: Clone + Default,
    {
        Self::from_shape_val(shape, T::default())
    }

    /// Get the data of the tensor as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get the data of the tensor as a mutable slice.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the tensor and returns its data vector.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Returns the number of elements in the tensor.
    #[inline]
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Returns the linear offset of a multi-dimensional index, if it lies inside the shape.
    pub fn get_iter_offset(&self, index: [usize; N]) -> Option<usize> {
        let mut offset = 0;
        for ((&idx, &dim), &stride) in index.iter().zip(self.shape.iter()).zip(self.strides.iter()) {
            if idx >= dim {
                return None;
            }
            offset += idx * stride;
        }
        Some(offset)
    }

    /// Returns a reference to the element at the given index, if any.
    pub fn get(&self, index: [usize; N]) -> Option<&T> {
        self.get_iter_offset(index).map(|offset| &self.data[offset])
    }

    /// Borrows the tensor as a contiguous view.
    pub fn view(&self) -> TensorView<'_, T, N> {
        TensorView {
            data: &self.data,
            shape: self.shape,
            strides: self.strides,
            offset: 0,
        }
    }

    /// Applies a function to every element, producing a new tensor of the same shape.
    pub fn map<U, F>(&self, f: F) -> Tensor<U, N>
    where
        F: Fn(&T) -> U,
    {
        Tensor {
            data: self.data.iter().map(f).collect(),
            shape: self.shape,
            strides: self.strides,
        }
    }
}
