// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralBind — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Dimension resolution for node ports.
//!
//! Row counts follow the batch and are only known at execution time, so a
//! port's dimension is its column count. Resolution runs once while the graph
//! is wired; afterwards nodes execute against the frozen values.

use crate::module::{Module, Ports};
use crate::{PureResult, TensorError};

/// Column counts of a node's ports during resolution. A port moves from
/// unknown to known exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortDims {
    slots: Vec<(&'static str, Option<usize>)>,
}

impl PortDims {
    /// Creates a table with every declared port unknown.
    pub fn new(ports: Ports) -> Self {
        Self {
            slots: ports.iter().map(|name| (name, None)).collect(),
        }
    }

    /// Builder form of [`PortDims::set`].
    pub fn with(mut self, port: &str, cols: usize) -> PureResult<Self> {
        self.set(port, cols)?;
        Ok(self)
    }

    fn slot_mut(&mut self, port: &str) -> PureResult<&mut Option<usize>> {
        self.slots
            .iter_mut()
            .find(|(name, _)| *name == port)
            .map(|(_, cols)| cols)
            .ok_or(TensorError::InvalidValue {
                label: "undeclared port",
            })
    }

    /// Returns the known column count of `port`.
    pub fn get(&self, port: &str) -> Option<usize> {
        self.slots
            .iter()
            .find(|(name, _)| *name == port)
            .and_then(|(_, cols)| *cols)
    }

    /// Records the column count of `port`. Returns `true` when the port was
    /// previously unknown; re-stating the same value is a no-op and a
    /// different value is a shape mismatch.
    pub fn set(&mut self, port: &str, cols: usize) -> PureResult<bool> {
        if cols == 0 {
            return Err(TensorError::InvalidDimensions { rows: 0, cols });
        }
        let slot = self.slot_mut(port)?;
        match *slot {
            Some(existing) if existing == cols => Ok(false),
            Some(existing) => Err(TensorError::ShapeMismatch {
                left: (0, existing),
                right: (0, cols),
            }),
            None => {
                *slot = Some(cols);
                Ok(true)
            }
        }
    }

    /// Returns the column count of `port` or reports it as unresolved.
    pub fn require(&self, port: &'static str) -> PureResult<usize> {
        self.get(port)
            .ok_or(TensorError::UnresolvedShape { port })
    }

    /// Number of ports whose dimension is known.
    pub fn known(&self) -> usize {
        self.slots.iter().filter(|(_, cols)| cols.is_some()).count()
    }

    /// True once every port is known.
    pub fn is_resolved(&self) -> bool {
        self.known() == self.slots.len()
    }
}

/// Drives [`Module::calc_shapes`] to a fixed point and checks that every port
/// of the module ended up known.
pub fn resolve_dims<M: Module + ?Sized>(module: &M, dims: &mut PortDims) -> PureResult<()> {
    let ports = module.ports();
    // Each productive pass resolves at least one port.
    for _ in 0..=ports.iter().count() {
        let before = dims.known();
        module.calc_shapes(dims)?;
        if dims.is_resolved() {
            return Ok(());
        }
        if dims.known() == before {
            break;
        }
    }
    for port in ports.iter() {
        dims.require(port)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PORTS: Ports = Ports {
        inputs: &["X"],
        outputs: &["Z"],
    };

    #[test]
    fn ports_are_set_once() {
        let mut dims = PortDims::new(PORTS);
        assert_eq!(dims.get("X"), None);
        assert!(dims.set("X", 4).unwrap());
        assert!(!dims.set("X", 4).unwrap());
        assert_eq!(
            dims.set("X", 5),
            Err(TensorError::ShapeMismatch {
                left: (0, 4),
                right: (0, 5)
            })
        );
        assert_eq!(dims.get("X"), Some(4));
        assert_eq!(dims.known(), 1);
        assert!(!dims.is_resolved());
    }

    #[test]
    fn unknown_ports_are_rejected() {
        let mut dims = PortDims::new(PORTS);
        assert!(matches!(
            dims.set("Y", 1),
            Err(TensorError::InvalidValue { .. })
        ));
        assert!(matches!(
            dims.set("X", 0),
            Err(TensorError::InvalidDimensions { .. })
        ));
        assert_eq!(
            dims.require("Z"),
            Err(TensorError::UnresolvedShape { port: "Z" })
        );
    }

    #[test]
    fn resolution_stops_once_every_port_is_known() {
        let layer = crate::layers::Softmax::default();
        let mut dims = PortDims::new(PORTS).with("Z", 6).unwrap();
        resolve_dims(&layer, &mut dims).unwrap();
        assert!(dims.is_resolved());
        assert_eq!(dims.get("X"), Some(6));

        let mut conflicting = PortDims::new(PORTS)
            .with("X", 4)
            .unwrap()
            .with("Z", 5)
            .unwrap();
        assert!(conflicting.is_resolved());
        assert!(matches!(
            resolve_dims(&layer, &mut conflicting),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }
}
