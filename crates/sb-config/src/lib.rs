// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralBind — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Process configuration for SpiralBind: the runtime flag set consulted by
//! graph nodes and the tracing subscriber used by binaries and tests.

pub mod flags;
pub mod tracing;

pub use flags::RuntimeFlags;
pub use tracing::{init_tracing, InitError};
