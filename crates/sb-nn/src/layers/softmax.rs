// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralBind — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::module::{Module, Ports, Requirements, TargetKind};
use crate::shape::{resolve_dims, PortDims};
use crate::wiring::WiringContext;
use crate::{PureResult, RuntimeFlags, Tensor, TensorError};
use tracing::{debug, trace};

const PORTS: Ports = Ports {
    inputs: &["X"],
    outputs: &["Z"],
};

const REQUIREMENTS: Requirements = Requirements {
    target: Some(TargetKind::Logistic),
    terminal: true,
};

/// How a row of `cols` values is split into softmax domains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoftmaxMode {
    /// One value per domain: the softmax collapses to an independent logistic.
    SingleLogistic,
    /// The whole row is one distribution.
    FullRowSoftmax,
    /// `groups` contiguous segments of `width` columns, each its own distribution.
    GroupedSoftmax { groups: usize, width: usize },
}

impl SoftmaxMode {
    /// Chooses the mode for rows of `cols` values split into `nchunk` domains.
    pub fn resolve(cols: usize, nchunk: usize) -> PureResult<Self> {
        if cols == 0 {
            return Err(TensorError::InvalidDimensions { rows: 0, cols });
        }
        if nchunk == 0 {
            return Err(TensorError::InvalidValue {
                label: "softmax_nchunk",
            });
        }
        if nchunk == cols {
            Ok(SoftmaxMode::SingleLogistic)
        } else if nchunk == 1 {
            Ok(SoftmaxMode::FullRowSoftmax)
        } else if cols % nchunk != 0 {
            Err(TensorError::IndivisibleGroups { cols, nchunk })
        } else {
            Ok(SoftmaxMode::GroupedSoftmax {
                groups: nchunk,
                width: cols / nchunk,
            })
        }
    }

    /// Applies the transform. The caller guarantees `input` has the column
    /// count the mode was resolved for.
    pub fn apply(&self, input: &Tensor) -> PureResult<Tensor> {
        match *self {
            SoftmaxMode::SingleLogistic => Ok(input.logistic()),
            SoftmaxMode::FullRowSoftmax => stable_row_softmax(input),
            SoftmaxMode::GroupedSoftmax { groups, width } => {
                let (rows, cols) = input.shape();
                let segments = input.reshape(rows * groups, width)?;
                stable_row_softmax(&segments)?.reshape(rows, cols)
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SoftmaxMode::SingleLogistic => "single_logistic",
            SoftmaxMode::FullRowSoftmax => "full_row",
            SoftmaxMode::GroupedSoftmax { .. } => "grouped",
        }
    }
}

/// `exp(x - rowmax(x))` normalised by its row sum.
fn stable_row_softmax(input: &Tensor) -> PureResult<Tensor> {
    let shifted = input.sub_col(&input.row_max())?;
    let mut probs = shifted.exp();
    let sums = probs.sum_axis1();
    probs.div_col_inplace(&sums)?;
    Ok(probs)
}

fn elementwise_shapes(dims: &mut PortDims) -> PureResult<()> {
    if let Some(cols) = dims.get("X") {
        dims.set("Z", cols)?;
    } else if let Some(cols) = dims.get("Z") {
        dims.set("X", cols)?;
    }
    Ok(())
}

/// Softmax output node.
///
/// Computes `Z = softmax(X)` row-wise. Each row is split into
/// `ngroup * ninst` contiguous groups that are normalised independently, so
/// the column count must be divisible by that product. When every group holds
/// a single value the node emits the logistic of each entry instead.
///
/// The backward pass hands the output gradient through untouched. That is
/// only correct when the node is the graph's final output and the loss
/// already differentiates through the softmax, which [`Softmax::wire`]
/// enforces via [`Module::requirements`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Softmax {
    ngroup: usize,
    ninst: usize,
}

impl Default for Softmax {
    fn default() -> Self {
        Self {
            ngroup: 1,
            ninst: 1,
        }
    }
}

impl Softmax {
    /// Creates a node that splits every row (per instance) into `ngroup`
    /// softmax groups.
    pub fn new(ngroup: usize) -> PureResult<Self> {
        if ngroup == 0 {
            return Err(TensorError::InvalidValue {
                label: "softmax_ngroup",
            });
        }
        Ok(Self { ngroup, ninst: 1 })
    }

    pub fn ngroup(&self) -> usize {
        self.ngroup
    }

    pub fn ninst(&self) -> usize {
        self.ninst
    }

    /// Number of independent softmax domains per row.
    pub fn nchunk(&self) -> PureResult<usize> {
        self.ngroup
            .checked_mul(self.ninst)
            .ok_or(TensorError::InvalidValue {
                label: "softmax_nchunk",
            })
    }

    /// Wires the node into a graph: checks the placement against the node's
    /// requirements, resolves the port dimensions and fixes the softmax mode
    /// for every later call. `ninst` is bound only when wiring succeeds.
    pub fn wire(&mut self, ctx: &WiringContext, dims: &mut PortDims) -> PureResult<WiredSoftmax> {
        if ctx.ninst == 0 {
            return Err(TensorError::InvalidValue {
                label: "softmax_ninst",
            });
        }
        let nchunk = self
            .ngroup
            .checked_mul(ctx.ninst)
            .ok_or(TensorError::InvalidValue {
                label: "softmax_nchunk",
            })?;
        ctx.check(&self.requirements())?;
        resolve_dims(&*self, dims)?;
        let cols = dims.require("X")?;
        let mode = SoftmaxMode::resolve(cols, nchunk)?;
        self.ninst = ctx.ninst;
        debug!(
            ngroup = self.ngroup,
            ninst = self.ninst,
            cols,
            mode = mode.label(),
            "softmax mode resolved"
        );
        Ok(WiredSoftmax {
            mode,
            cols,
            ninst: self.ninst,
            nchunk,
        })
    }
}

impl Module for Softmax {
    fn ports(&self) -> Ports {
        PORTS
    }

    fn bind_instances(&mut self, ninst: usize) -> PureResult<()> {
        if ninst == 0 {
            return Err(TensorError::InvalidValue {
                label: "softmax_ninst",
            });
        }
        self.ninst = ninst;
        Ok(())
    }

    fn calc_shapes(&self, dims: &mut PortDims) -> PureResult<()> {
        elementwise_shapes(dims)
    }

    fn forward(&self, input: &Tensor, flags: &RuntimeFlags) -> PureResult<Tensor> {
        if flags.disable_softmax {
            debug!(shape = ?input.shape(), "softmax bypassed");
            return Ok(input.clone());
        }
        let mode = SoftmaxMode::resolve(input.shape().1, self.nchunk()?)?;
        trace!(shape = ?input.shape(), mode = mode.label(), "softmax forward");
        mode.apply(input)
    }

    fn backward(&mut self, grad_output: &Tensor) -> PureResult<Tensor> {
        Ok(grad_output.clone())
    }

    fn requirements(&self) -> Requirements {
        REQUIREMENTS
    }
}

/// A [`Softmax`] whose dimensions and mode were fixed at wiring time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WiredSoftmax {
    mode: SoftmaxMode,
    cols: usize,
    ninst: usize,
    nchunk: usize,
}

impl WiredSoftmax {
    pub fn mode(&self) -> SoftmaxMode {
        self.mode
    }

    /// Column count of both ports.
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn nchunk(&self) -> usize {
        self.nchunk
    }

    fn expect_cols(&self, tensor: &Tensor) -> PureResult<()> {
        let (rows, cols) = tensor.shape();
        if cols != self.cols {
            return Err(TensorError::ShapeMismatch {
                left: (rows, cols),
                right: (rows, self.cols),
            });
        }
        Ok(())
    }
}

impl Module for WiredSoftmax {
    fn ports(&self) -> Ports {
        PORTS
    }

    fn bind_instances(&mut self, ninst: usize) -> PureResult<()> {
        // Rebinding would change the resolved mode.
        if ninst != self.ninst {
            return Err(TensorError::InvalidValue {
                label: "softmax_ninst",
            });
        }
        Ok(())
    }

    fn calc_shapes(&self, dims: &mut PortDims) -> PureResult<()> {
        dims.set("X", self.cols)?;
        dims.set("Z", self.cols)?;
        Ok(())
    }

    fn forward(&self, input: &Tensor, flags: &RuntimeFlags) -> PureResult<Tensor> {
        if flags.disable_softmax {
            debug!(shape = ?input.shape(), "softmax bypassed");
            return Ok(input.clone());
        }
        self.expect_cols(input)?;
        trace!(shape = ?input.shape(), mode = self.mode.label(), "softmax forward");
        self.mode.apply(input)
    }

    fn backward(&mut self, grad_output: &Tensor) -> PureResult<Tensor> {
        self.expect_cols(grad_output)?;
        Ok(grad_output.clone())
    }

    fn requirements(&self) -> Requirements {
        REQUIREMENTS
    }
}
