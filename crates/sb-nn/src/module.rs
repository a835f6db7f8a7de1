// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralBind — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::shape::PortDims;
use crate::{PureResult, RuntimeFlags, Tensor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named input and output ports declared by a node at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ports {
    pub inputs: &'static [&'static str],
    pub outputs: &'static [&'static str],
}

impl Ports {
    /// Iterates over every port name, inputs first.
    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.inputs.iter().chain(self.outputs.iter()).copied()
    }
}

/// Kind of training target a loss is built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Probabilities (class memberships or per-target logistic outputs).
    Logistic,
    /// Real valued regression targets.
    Linear,
}

impl TargetKind {
    pub fn label(self) -> &'static str {
        match self {
            TargetKind::Logistic => "logistic",
            TargetKind::Linear => "linear",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Constraints a node places on the graph it is wired into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    /// Target kind the attached loss must be built for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetKind>,
    /// The node must be the final output of the graph.
    #[serde(default)]
    pub terminal: bool,
}

/// Node protocol consumed by the host graph engine.
///
/// The lifecycle is construction, [`Module::bind_instances`] while wiring,
/// a dimension-resolution pass driven through [`Module::calc_shapes`], and
/// finally any number of forward/backward calls against fixed shapes.
pub trait Module {
    /// Declares the node's named ports.
    fn ports(&self) -> Ports;

    /// Binds the number of parallel target instances the graph trains.
    fn bind_instances(&mut self, _ninst: usize) -> PureResult<()> {
        Ok(())
    }

    /// Propagates whatever port dimensions are known to the unknown ports.
    /// Invoked repeatedly during resolution; must be idempotent.
    fn calc_shapes(&self, _dims: &mut PortDims) -> PureResult<()> {
        Ok(())
    }

    /// Runs a forward pass.
    fn forward(&self, input: &Tensor, flags: &RuntimeFlags) -> PureResult<Tensor>;

    /// Propagates a gradient from the output port back to the input port.
    fn backward(&mut self, grad_output: &Tensor) -> PureResult<Tensor>;

    /// Constraints checked by the graph when the node is wired.
    fn requirements(&self) -> Requirements {
        Requirements::default()
    }
}
