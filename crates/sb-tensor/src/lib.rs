// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralBind — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

// crates/sb-tensor/src/lib.rs
pub mod observability;
pub mod pure;

pub use observability::{emit_tensor_op, set_tensor_op_observer, TensorOpEvent, TensorOpObserver};
pub use pure::{PureResult, Tensor, TensorError};
