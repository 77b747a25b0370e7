// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use num_traits::Zero;
use std::ops::{Index, IndexMut};

/// A dense, fixed-shape, row-major array with `D` dimensions.
///
/// The shape is set at construction and never changes afterwards; indexing
/// with an `[usize; D]` coordinate is a constant-time stride computation.
/// Hot loops in the solver address tensors millions of times per second, so
/// the offset math carries `debug_assert!` bounds only and the final access
/// goes through the backing `Vec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tensor<T, const D: usize> {
    shape: [usize; D],
    strides: [usize; D],
    data: Vec<T>,
}

/// Three-dimensional tensor, indexed by (source cell, user type, period).
pub type Tensor3<T> = Tensor<T, 3>;
/// Four-dimensional tensor, indexed by (source, destination, type, period).
pub type Tensor4<T> = Tensor<T, 4>;

impl<T: Copy, const D: usize> Tensor<T, D> {
    /// Creates a tensor of the given shape with every element set to `fill`.
    pub fn filled(shape: [usize; D], fill: T) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            strides: row_major_strides(shape),
            data: vec![fill; len],
        }
    }

    #[inline]
    pub fn shape(&self) -> [usize; D] {
        self.shape
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Overwrites this tensor with the contents of `other`.
    ///
    /// Both tensors must have the same shape.
    #[inline]
    pub fn copy_from(&mut self, other: &Tensor<T, D>) {
        debug_assert_eq!(self.shape, other.shape);
        self.data.copy_from_slice(&other.data);
    }

    #[inline]
    fn offset(&self, idx: [usize; D]) -> usize {
        let mut off = 0;
        for d in 0..D {
            debug_assert!(idx[d] < self.shape[d]);
            off += idx[d] * self.strides[d];
        }
        off
    }
}

impl<T: Copy + Zero, const D: usize> Tensor<T, D> {
    /// Creates a zero-filled tensor of the given shape.
    pub fn zeros(shape: [usize; D]) -> Self {
        Self::filled(shape, T::zero())
    }

    /// Resets every element back to zero without reallocating.
    #[inline]
    pub fn reset(&mut self) {
        self.data.fill(T::zero());
    }
}

impl<T: Copy, const D: usize> Index<[usize; D]> for Tensor<T, D> {
    type Output = T;

    #[inline]
    fn index(&self, idx: [usize; D]) -> &T {
        &self.data[self.offset(idx)]
    }
}

impl<T: Copy, const D: usize> IndexMut<[usize; D]> for Tensor<T, D> {
    #[inline]
    fn index_mut(&mut self, idx: [usize; D]) -> &mut T {
        let off = self.offset(idx);
        &mut self.data[off]
    }
}

#[inline]
fn row_major_strides<const D: usize>(shape: [usize; D]) -> [usize; D] {
    let mut strides = [1usize; D];
    for d in (0..D.saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    strides
}

#[cfg(test)]
mod tests {
    use super::{Tensor, Tensor3, Tensor4};

    #[test]
    fn test_zeros_shape_and_len() {
        let t: Tensor3<i32> = Tensor::zeros([2, 3, 4]);
        assert_eq!(t.shape(), [2, 3, 4]);
        assert_eq!(t.len(), 24);
        assert!(t.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_row_major_layout() {
        let mut t: Tensor3<i32> = Tensor::zeros([2, 3, 4]);
        t[[0, 0, 1]] = 1;
        t[[0, 1, 0]] = 2;
        t[[1, 0, 0]] = 3;
        assert_eq!(t.as_slice()[1], 1);
        assert_eq!(t.as_slice()[4], 2);
        assert_eq!(t.as_slice()[12], 3);
    }

    #[test]
    fn test_index_roundtrip_four_dims() {
        let mut t: Tensor4<i32> = Tensor::zeros([3, 3, 2, 2]);
        t[[2, 1, 0, 1]] = 42;
        assert_eq!(t[[2, 1, 0, 1]], 42);
        assert_eq!(t[[1, 2, 0, 1]], 0);
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let mut t: Tensor3<f64> = Tensor::zeros([2, 2, 2]);
        t[[1, 1, 1]] = 3.5;
        t[[0, 0, 0]] = -1.0;
        t.reset();
        assert!(t.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_copy_from_overwrites() {
        let mut a: Tensor3<i32> = Tensor::zeros([2, 2, 1]);
        let mut b: Tensor3<i32> = Tensor::zeros([2, 2, 1]);
        b[[0, 1, 0]] = 7;
        b[[1, 0, 0]] = -2;
        a[[0, 0, 0]] = 99;
        a.copy_from(&b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_filled_value() {
        let t: Tensor<u8, 2> = Tensor::filled([3, 3], 9);
        assert!(t.iter().all(|&v| v == 9));
    }
}
