// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralBind — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Environment variable that switches every softmax node into bypass mode.
pub const DISABLE_SOFTMAX_ENV: &str = "SPIRALBIND_DISABLE_SOFTMAX";

/// Diagnostic switches handed to every forward call.
///
/// Nodes never consult process state on their own; callers either build the
/// flags explicitly or pass the cached snapshot returned by [`config`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeFlags {
    /// Softmax nodes return their input unchanged.
    #[serde(default)]
    pub disable_softmax: bool,
}

impl RuntimeFlags {
    /// All diagnostics off.
    pub const fn new() -> Self {
        Self {
            disable_softmax: false,
        }
    }

    /// Returns a copy with the softmax bypass toggled.
    pub fn with_disable_softmax(mut self, disable: bool) -> Self {
        self.disable_softmax = disable;
        self
    }

    /// Builds a snapshot from environment variables.
    pub fn from_env() -> Self {
        let disable_softmax = std::env::var(DISABLE_SOFTMAX_ENV)
            .ok()
            .map(|v| parse_switch(&v))
            .unwrap_or(false);
        Self { disable_softmax }
    }
}

fn parse_switch(raw: &str) -> bool {
    matches!(
        raw.trim(),
        "1" | "true" | "True" | "TRUE" | "on" | "ON" | "yes"
    )
}

static CONFIG: OnceLock<RuntimeFlags> = OnceLock::new();

/// Returns the lazily captured environment snapshot.
pub fn config() -> &'static RuntimeFlags {
    CONFIG.get_or_init(RuntimeFlags::from_env)
}

/// Pins the process snapshot. Only the first call (or the first [`config`]
/// read) wins; later calls return the already stored value.
pub fn configure(flags: RuntimeFlags) -> &'static RuntimeFlags {
    CONFIG.get_or_init(|| flags)
}
