// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralBind — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::module::{Requirements, TargetKind};
use crate::{PureResult, TensorError};

/// Facts the host graph knows about a node's position when it wires it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WiringContext {
    /// Number of parallel target instances trained by the graph.
    pub ninst: usize,
    /// Whether the node feeds the loss directly.
    pub is_output: bool,
    /// Target kind of the attached loss, when one has been chosen.
    pub target: Option<TargetKind>,
}

impl Default for WiringContext {
    fn default() -> Self {
        Self {
            ninst: 1,
            is_output: true,
            target: None,
        }
    }
}

impl WiringContext {
    /// Output node context for `ninst` instances with no loss chosen yet.
    pub fn output(ninst: usize) -> Self {
        Self {
            ninst,
            ..Self::default()
        }
    }

    /// Declares the target kind of the attached loss.
    pub fn with_target(mut self, target: TargetKind) -> Self {
        self.target = Some(target);
        self
    }

    /// Marks the node as an interior node of the graph.
    pub fn interior(mut self) -> Self {
        self.is_output = false;
        self
    }

    /// Validates the node's requirements against this position in the graph.
    pub fn check(&self, requirements: &Requirements) -> PureResult<()> {
        if requirements.terminal && !self.is_output {
            return Err(TensorError::InvalidValue {
                label: "node must be the final output of the graph",
            });
        }
        match (requirements.target, self.target) {
            (Some(expected), Some(got)) if expected != got => Err(TensorError::TargetMismatch {
                expected: expected.label(),
                got: got.label(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT_REQS: Requirements = Requirements {
        target: Some(TargetKind::Logistic),
        terminal: true,
    };

    #[test]
    fn matching_output_passes() {
        let ctx = WiringContext::output(3).with_target(TargetKind::Logistic);
        assert_eq!(ctx.ninst, 3);
        assert!(ctx.check(&OUTPUT_REQS).is_ok());
        // Target checks wait until a loss is declared.
        assert!(WiringContext::default().check(&OUTPUT_REQS).is_ok());
    }

    #[test]
    fn mismatched_target_is_rejected() {
        let ctx = WiringContext::output(1).with_target(TargetKind::Linear);
        assert_eq!(
            ctx.check(&OUTPUT_REQS),
            Err(TensorError::TargetMismatch {
                expected: "logistic",
                got: "linear"
            })
        );
    }

    #[test]
    fn interior_placement_is_rejected_for_terminal_nodes() {
        let ctx = WiringContext::output(1).interior();
        assert!(matches!(
            ctx.check(&OUTPUT_REQS),
            Err(TensorError::InvalidValue { .. })
        ));
        assert!(ctx.check(&Requirements::default()).is_ok());
    }
}
