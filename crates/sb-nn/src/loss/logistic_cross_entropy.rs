// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralBind — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use super::Loss;
use crate::module::TargetKind;
use crate::{PureResult, Tensor, TensorError};

/// Cross entropy over softmax (or logistic) probabilities.
///
/// The gradient returned by [`Loss::backward`] is taken with respect to the
/// pre-activation logits, `(Z - T) / rows`, which is why the softmax node can
/// pass it through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct LogisticCrossEntropy {
    epsilon: f32,
    binary: bool,
}

impl Default for LogisticCrossEntropy {
    fn default() -> Self {
        Self {
            epsilon: 1e-9,
            binary: false,
        }
    }
}

impl LogisticCrossEntropy {
    /// Categorical form `-sum(T * ln Z)` for grouped or full-row softmax outputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binary form `-sum(T ln Z + (1 - T) ln(1 - Z))` for per-target
    /// logistic outputs.
    pub fn binary() -> Self {
        Self {
            binary: true,
            ..Self::default()
        }
    }

    /// Overrides the epsilon used to clamp probabilities.
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon.clamp(1e-12, 0.5);
        self
    }

    /// Returns the epsilon used for clamping.
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }

    fn check_shapes(prediction: &Tensor, target: &Tensor) -> PureResult<()> {
        if prediction.shape() != target.shape() {
            return Err(TensorError::ShapeMismatch {
                left: prediction.shape(),
                right: target.shape(),
            });
        }
        Ok(())
    }
}

impl Loss for LogisticCrossEntropy {
    fn forward(&mut self, prediction: &Tensor, target: &Tensor) -> PureResult<Tensor> {
        Self::check_shapes(prediction, target)?;
        let (rows, _) = prediction.shape();
        let mut sum = 0.0f32;
        for (pred, tgt) in prediction.data().iter().zip(target.data().iter()) {
            if self.binary {
                let p = pred.clamp(self.epsilon, 1.0 - self.epsilon);
                sum -= tgt * p.ln() + (1.0 - tgt) * (1.0 - p).ln();
            } else {
                let p = pred.clamp(self.epsilon, 1.0);
                sum -= tgt * p.ln();
            }
        }
        Tensor::from_vec(1, 1, vec![sum / rows as f32])
    }

    fn backward(&mut self, prediction: &Tensor, target: &Tensor) -> PureResult<Tensor> {
        Self::check_shapes(prediction, target)?;
        let (rows, _) = prediction.shape();
        prediction.sub(target)?.scale(1.0 / rows as f32)
    }

    fn target(&self) -> TargetKind {
        TargetKind::Logistic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::Softmax;
    use crate::module::Module;
    use crate::RuntimeFlags;
    use approx::assert_abs_diff_eq;

    #[test]
    fn categorical_loss_matches_negative_log_likelihood() {
        let mut loss = LogisticCrossEntropy::new();
        let prediction = Tensor::from_vec(2, 2, vec![0.25, 0.75, 0.5, 0.5]).unwrap();
        let target = Tensor::from_vec(2, 2, vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        let value = loss.forward(&prediction, &target).unwrap();
        let expected = -(0.75f32.ln() + 0.5f32.ln()) / 2.0;
        assert_abs_diff_eq!(value.data()[0], expected, epsilon = 1e-6);
        assert_eq!(loss.target(), TargetKind::Logistic);
    }

    #[test]
    fn binary_loss_counts_negative_targets() {
        let mut loss = LogisticCrossEntropy::binary();
        assert!(loss.is_binary());
        let prediction = Tensor::from_vec(1, 2, vec![0.8, 0.1]).unwrap();
        let target = Tensor::from_vec(1, 2, vec![1.0, 0.0]).unwrap();
        let value = loss.forward(&prediction, &target).unwrap();
        let expected = -(0.8f32.ln() + 0.9f32.ln());
        assert_abs_diff_eq!(value.data()[0], expected, epsilon = 1e-6);
    }

    #[test]
    fn gradient_matches_finite_differences_through_softmax() {
        let layer = Softmax::default();
        let flags = RuntimeFlags::new();
        let mut loss = LogisticCrossEntropy::new();
        let logits = vec![0.3f32, -1.2, 0.8];
        let target = Tensor::from_vec(1, 3, vec![0.0, 0.0, 1.0]).unwrap();
        let input = Tensor::from_vec(1, 3, logits.clone()).unwrap();
        let probs = layer.forward(&input, &flags).unwrap();
        let analytic = loss.backward(&probs, &target).unwrap();

        let h = 1e-3f32;
        for i in 0..logits.len() {
            let mut plus = logits.clone();
            plus[i] += h;
            let mut minus = logits.clone();
            minus[i] -= h;
            let f = |values: Vec<f32>, loss: &mut LogisticCrossEntropy| {
                let x = Tensor::from_vec(1, 3, values).unwrap();
                let z = layer.forward(&x, &flags).unwrap();
                loss.forward(&z, &target).unwrap().data()[0]
            };
            let numeric = (f(plus, &mut loss) - f(minus, &mut loss)) / (2.0 * h);
            assert_abs_diff_eq!(analytic.data()[i], numeric, epsilon = 1e-2);
        }
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let mut loss = LogisticCrossEntropy::new().with_epsilon(0.0);
        assert_eq!(loss.epsilon(), 1e-12);
        let a = Tensor::zeros(1, 2).unwrap();
        let b = Tensor::zeros(2, 1).unwrap();
        assert!(matches!(
            loss.backward(&a, &b),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }
}
