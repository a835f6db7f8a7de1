// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralBind — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

mod logistic_cross_entropy;

use crate::module::TargetKind;
use crate::{PureResult, Tensor};

pub use logistic_cross_entropy::LogisticCrossEntropy;

/// Trait implemented by differentiable losses attached to a graph output.
pub trait Loss {
    /// Computes the loss value for the given predictions and targets.
    fn forward(&mut self, prediction: &Tensor, target: &Tensor) -> PureResult<Tensor>;

    /// Returns the gradient handed to the output node's backward pass.
    fn backward(&mut self, prediction: &Tensor, target: &Tensor) -> PureResult<Tensor>;

    /// Kind of target the loss is built for; checked against the output
    /// node's requirements when the graph is wired.
    fn target(&self) -> TargetKind;
}
