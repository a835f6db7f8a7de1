// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralBind — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Pure Rust row-major matrices with the handful of elementwise and
//! row-reduction primitives that output nodes are assembled from.
//!
//! Every operation is synchronous and allocates a fresh buffer unless its
//! name ends in `_inplace`. Buffers are reference counted so reshapes are
//! free and in-place updates copy only when the storage is shared.

use crate::observability::emit_tensor_op;
use core::fmt;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::sync::Arc;

/// Result alias used throughout the pure module.
pub type PureResult<T> = Result<T, TensorError>;

/// Errors emitted by tensors and the graph nodes built on them.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorError {
    /// A tensor constructor received an invalid shape.
    InvalidDimensions { rows: usize, cols: usize },
    /// Data provided to a constructor or operator does not match the tensor shape.
    DataLength { expected: usize, got: usize },
    /// An operator was asked to combine tensors of incompatible shapes.
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    /// Numeric guard detected a non-finite value that would otherwise propagate NaNs.
    NonFiniteValue { label: &'static str, value: f32 },
    /// Generic configuration violation.
    InvalidValue { label: &'static str },
    /// Column count cannot be split into equally sized softmax groups.
    IndivisibleGroups { cols: usize, nchunk: usize },
    /// Dimension resolution finished without a known size for the port.
    UnresolvedShape { port: &'static str },
    /// The loss attached to a graph output expects a different target kind.
    TargetMismatch {
        expected: &'static str,
        got: &'static str,
    },
}

impl fmt::Display for TensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorError::InvalidDimensions { rows, cols } => {
                write!(
                    f,
                    "invalid tensor dimensions ({rows} x {cols}); both axes must be non-zero"
                )
            }
            TensorError::DataLength { expected, got } => {
                write!(f, "data length mismatch: expected {expected}, got {got}")
            }
            TensorError::ShapeMismatch { left, right } => {
                write!(
                    f,
                    "shape mismatch: left={:?}, right={:?} cannot be combined",
                    left, right
                )
            }
            TensorError::NonFiniteValue { label, value } => {
                write!(f, "{label} must be finite, got {value}")
            }
            TensorError::InvalidValue { label } => {
                write!(f, "invalid value for {label}")
            }
            TensorError::IndivisibleGroups { cols, nchunk } => {
                write!(
                    f,
                    "number of columns ({cols}) must be divisible by ngroup * ninst ({nchunk})"
                )
            }
            TensorError::UnresolvedShape { port } => {
                write!(f, "shape of port {port} could not be resolved")
            }
            TensorError::TargetMismatch { expected, got } => {
                write!(f, "output node expects a {expected} target but the loss provides {got}")
            }
        }
    }
}

impl Error for TensorError {}

/// A dense 2D tensor stored row-major behind a reference-counted buffer.
#[derive(Clone, Debug)]
pub struct Tensor {
    data: Arc<Vec<f32>>,
    rows: usize,
    cols: usize,
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self.data.as_slice() == other.data.as_slice()
    }
}

impl Tensor {
    fn from_parts(rows: usize, cols: usize, data: Vec<f32>) -> PureResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(TensorError::InvalidDimensions { rows, cols });
        }
        let expected = rows * cols;
        if expected != data.len() {
            return Err(TensorError::DataLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data: Arc::new(data),
            rows,
            cols,
        })
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> PureResult<Self> {
        Self::from_parts(rows, cols, vec![0.0; rows * cols])
    }

    /// Create a tensor from raw data. The provided vector must match
    /// `rows * cols` elements.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> PureResult<Self> {
        Self::from_parts(rows, cols, data)
    }

    /// Construct a tensor by applying a generator function to each coordinate.
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> PureResult<Self>
    where
        F: FnMut(usize, usize) -> f32,
    {
        if rows == 0 || cols == 0 {
            return Err(TensorError::InvalidDimensions { rows, cols });
        }
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self::from_parts(rows, cols, data)
    }

    /// Construct a tensor by sampling a uniform distribution in `[min, max)`
    /// from a seeded generator, so benchmarks and tests stay reproducible.
    pub fn random_uniform(
        rows: usize,
        cols: usize,
        min: f32,
        max: f32,
        seed: u64,
    ) -> PureResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(TensorError::InvalidDimensions { rows, cols });
        }
        if !min.is_finite() {
            return Err(TensorError::NonFiniteValue {
                label: "random_uniform_min",
                value: min,
            });
        }
        if !max.is_finite() {
            return Err(TensorError::NonFiniteValue {
                label: "random_uniform_max",
                value: max,
            });
        }
        if min >= max {
            return Err(TensorError::InvalidValue {
                label: "random_uniform_bounds",
            });
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let distribution = Uniform::new(min, max);
        let data = (0..rows * cols)
            .map(|_| distribution.sample(&mut rng))
            .collect();
        Self::from_parts(rows, cols, data)
    }

    /// Returns the `(rows, cols)` pair of the tensor.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of elements stored in the tensor.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Tensors always hold at least one element.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Row-major view of the elements.
    pub fn data(&self) -> &[f32] {
        self.data.as_slice()
    }

    /// Mutable row-major view; copies the buffer first when it is shared.
    pub fn data_mut(&mut self) -> &mut [f32] {
        Arc::make_mut(&mut self.data).as_mut_slice()
    }

    /// Borrow a single row.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.rows {
            return None;
        }
        let offset = index * self.cols;
        Some(&self.data[offset..offset + self.cols])
    }

    fn map(&self, op_name: &'static str, f: impl Fn(f32) -> f32) -> Tensor {
        let data: Vec<f32> = self.data.iter().map(|&value| f(value)).collect();
        emit_tensor_op(op_name, self.shape(), self.shape());
        Tensor {
            data: Arc::new(data),
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Element-wise exponential.
    pub fn exp(&self) -> Tensor {
        self.map("exp", f32::exp)
    }

    /// Element-wise logistic function `1 / (1 + exp(-x))`.
    pub fn logistic(&self) -> Tensor {
        self.map("logistic", logistic)
    }

    /// Maximum of every row.
    pub fn row_max(&self) -> Vec<f32> {
        let maxima = self
            .data
            .chunks_exact(self.cols)
            .map(|row| row.iter().copied().fold(f32::NEG_INFINITY, f32::max))
            .collect();
        emit_tensor_op("row_max", self.shape(), (self.rows, 1));
        maxima
    }

    /// Returns the sum over columns for each row.
    pub fn sum_axis1(&self) -> Vec<f32> {
        let sums = self
            .data
            .chunks_exact(self.cols)
            .map(|row| row.iter().sum())
            .collect();
        emit_tensor_op("sum_axis1", self.shape(), (self.rows, 1));
        sums
    }

    /// Subtracts `column[r]` from every element of row `r`.
    pub fn sub_col(&self, column: &[f32]) -> PureResult<Tensor> {
        if column.len() != self.rows {
            return Err(TensorError::DataLength {
                expected: self.rows,
                got: column.len(),
            });
        }
        let mut data = Vec::with_capacity(self.len());
        for (row, &shift) in self.data.chunks_exact(self.cols).zip(column) {
            data.extend(row.iter().map(|value| value - shift));
        }
        emit_tensor_op("sub_col", self.shape(), self.shape());
        Self::from_parts(self.rows, self.cols, data)
    }

    /// Divides every element of row `r` by `column[r]` in place.
    pub fn div_col_inplace(&mut self, column: &[f32]) -> PureResult<()> {
        if column.len() != self.rows {
            return Err(TensorError::DataLength {
                expected: self.rows,
                got: column.len(),
            });
        }
        let cols = self.cols;
        let data = Arc::make_mut(&mut self.data);
        for (row, &divisor) in data.chunks_exact_mut(cols).zip(column) {
            for value in row.iter_mut() {
                *value /= divisor;
            }
        }
        emit_tensor_op("div_col_inplace", self.shape(), self.shape());
        Ok(())
    }

    /// Returns a reshaped view sharing the same buffer when the element
    /// counts agree.
    pub fn reshape(&self, rows: usize, cols: usize) -> PureResult<Tensor> {
        if rows == 0 || cols == 0 {
            return Err(TensorError::InvalidDimensions { rows, cols });
        }
        if rows * cols != self.len() {
            return Err(TensorError::DataLength {
                expected: rows * cols,
                got: self.len(),
            });
        }
        emit_tensor_op("reshape", self.shape(), (rows, cols));
        Ok(Tensor {
            data: Arc::clone(&self.data),
            rows,
            cols,
        })
    }

    /// Element-wise subtraction.
    pub fn sub(&self, other: &Tensor) -> PureResult<Tensor> {
        if self.shape() != other.shape() {
            return Err(TensorError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a - b)
            .collect();
        emit_tensor_op("sub", self.shape(), self.shape());
        Self::from_parts(self.rows, self.cols, data)
    }

    /// Returns a new tensor where every element is scaled by `value`.
    pub fn scale(&self, value: f32) -> PureResult<Tensor> {
        if !value.is_finite() {
            return Err(TensorError::NonFiniteValue {
                label: "scale",
                value,
            });
        }
        Ok(self.map("scale", |a| a * value))
    }
}

#[inline]
fn logistic(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
