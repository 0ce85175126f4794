use crate::tensor::{check_non_empty, get_strides_from_shape, Tensor, TensorError};

/// A non-owning view into N-dimensional data.
///
/// The view borrows the data for its lifetime `'a`; it never copies on construction.
/// Element `[i0, i1, ..]` lives at `offset + i0 * strides[0] + i1 * strides[1] + ..` in the
/// borrowed slice.
///
/// # Example
///
/// ```rust
/// use scalespace_tensor::TensorView;
///
/// let data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let view = TensorView::from_slice([2, 3], &data).unwrap();
/// assert_eq!(view.get([1, 1]), Some(&5.0));
///
/// // a transposed view over the same data
/// let t = TensorView::from_strided(&data, [3, 2], [1, 3], 0).unwrap();
/// assert_eq!(t.get([2, 0]), Some(&3.0));
/// assert!(!t.is_standard_layout());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct TensorView<'a, T, const N: usize> {
    pub(crate) data: &'a [T],
    /// The shape of the tensor view.
    pub shape: [usize; N],
    /// The strides for accessing elements in the view.
    pub strides: [usize; N],
    pub(crate) offset: usize,
}

impl<'a, T, const N: usize> TensorView<'a, T, N> {
    /// Creates a contiguous row-major view over a slice.
    ///
    /// # Errors
    ///
    /// Fails if an axis is empty or the slice length does not match the shape.
    pub fn from_slice(shape: [usize; N], data: &'a [T]) -> Result<Self, TensorError> {
        check_non_empty(&shape)?;
        let numel = shape.iter().product::<usize>();
        if numel != data.len() {
            return Err(TensorError::invalid_shape(numel, data.len()));
        }
        Ok(Self {
            data,
            shape,
            strides: get_strides_from_shape(shape),
            offset: 0,
        })
    }

    /// Creates a view with arbitrary strides and a starting offset.
    ///
    /// # Errors
    ///
    /// Fails if an axis is empty or if the last addressable element lies outside `data`.
    pub fn from_strided(
        data: &'a [T],
        shape: [usize; N],
        strides: [usize; N],
        offset: usize,
    ) -> Result<Self, TensorError> {
        check_non_empty(&shape)?;
        let last = shape
            .iter()
            .zip(strides.iter())
            .map(|(&dim, &stride)| (dim - 1) * stride)
            .sum::<usize>()
            + offset;
        if last >= data.len() {
            return Err(TensorError::ViewOutOfBounds {
                required: last + 1,
                available: data.len(),
            });
        }
        Ok(Self {
            data,
            shape,
            strides,
            offset,
        })
    }

    /// Returns the number of elements addressed by the view.
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Returns the offset of the first element in the borrowed data.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the whole borrowed data, regardless of the view's shape.
    #[inline]
    pub fn storage(&self) -> &'a [T] {
        self.data
    }

    /// Whether the strides describe a dense row-major layout.
    pub fn is_standard_layout(&self) -> bool {
        let mut expected_stride: usize = 1;
        for (&dim, &stride) in self.shape.iter().rev().zip(self.strides.iter().rev()) {
            if dim > 1 && stride != expected_stride {
                return false;
            }
            expected_stride = expected_stride.saturating_mul(dim);
        }
        true
    }

    /// Returns the addressed elements as one dense slice when the layout allows it.
    pub fn as_contiguous_slice(&self) -> Option<&'a [T]> {
        if !self.is_standard_layout() {
            return None;
        }
        self.data.get(self.offset..self.offset + self.numel())
    }

    /// Returns a reference to the element at the given index, if any.
    pub fn get(&self, index: [usize; N]) -> Option<&'a T> {
        let mut offset = self.offset;
        for ((&idx, &dim), &stride) in index.iter().zip(self.shape.iter()).zip(self.strides.iter()) {
            if idx >= dim {
                return None;
            }
            offset += idx * stride;
        }
        self.data.get(offset)
    }

    /// Restricts the view to the half-open box `[start, stop)` without copying.
    ///
    /// # Errors
    ///
    /// Fails if the box is empty on some axis or extends past the view.
    pub fn slice(&self, start: [usize; N], stop: [usize; N]) -> Result<Self, TensorError> {
        let mut shape = [0usize; N];
        let mut offset = self.offset;
        for axis in 0..N {
            if stop[axis] > self.shape[axis] {
                return Err(TensorError::IndexOutOfBounds {
                    index: stop[axis],
                    size: self.shape[axis],
                });
            }
            if start[axis] >= stop[axis] {
                return Err(TensorError::EmptyAxis { axis });
            }
            shape[axis] = stop[axis] - start[axis];
            offset += start[axis] * self.strides[axis];
        }
        Ok(Self {
            data: self.data,
            shape,
            strides: self.strides,
            offset,
        })
    }

    /// Copies the addressed elements into a new row-major tensor.
    pub fn as_contiguous(&self) -> Tensor<T, N>
    where
        T: Clone,
    {
        let numel = self.numel();
        let mut flat = Vec::with_capacity(numel);
        let mut index = [0usize; N];
        for _ in 0..numel {
            let offset = self.offset
                + index
                    .iter()
                    .zip(self.strides.iter())
                    .map(|(&i, &s)| i * s)
                    .sum::<usize>();
            flat.push(self.data[offset].clone());

            for dim in (0..N).rev() {
                index[dim] += 1;
                if index[dim] < self.shape[dim] {
                    break;
                }
                index[dim] = 0;
            }
        }
        Tensor {
            data: flat,
            shape: self.shape,
            strides: get_strides_from_shape(self.shape),
        }
    }
}
