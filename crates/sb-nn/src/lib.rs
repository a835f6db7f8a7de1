// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralBind — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Graph node protocol for SpiralBind models.
//!
//! Nodes declare named ports, take part in a one-off dimension-resolution
//! pass while the graph is wired, and then run forward/backward against
//! frozen shapes. The crate ships the softmax output node together with the
//! logistic cross-entropy loss whose gradient it relies on.

pub mod layers;
pub mod loss;
pub mod module;
pub mod shape;
pub mod wiring;

pub use layers::{Softmax, SoftmaxMode, WiredSoftmax};
pub use loss::{LogisticCrossEntropy, Loss};
pub use module::{Module, Ports, Requirements, TargetKind};
pub use shape::{resolve_dims, PortDims};
pub use wiring::WiringContext;

pub use sb_config::RuntimeFlags;
pub use sb_tensor::{PureResult, Tensor, TensorError};
