// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralBind — Licensed under AGPL-3.0-or-later.

//! Lightweight hooks for observing tensor primitives without pulling a
//! logging dependency into the tensor crate.

use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, RwLock};

/// Metadata about a completed tensor primitive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorOpEvent {
    pub op_name: &'static str,
    pub input_shape: (usize, usize),
    pub output_shape: (usize, usize),
}

/// Observer callback invoked after a tensor primitive completes.
pub type TensorOpObserver = Arc<dyn Fn(&TensorOpEvent) + Send + Sync + 'static>;

static TENSOR_OP_OBSERVER: OnceLock<RwLock<Option<TensorOpObserver>>> = OnceLock::new();

thread_local! {
    static IN_OBSERVER_CALLBACK: Cell<bool> = const { Cell::new(false) };
}

/// Install (or clear) the global tensor operation observer.
///
/// Returns the previously installed observer, if any.
pub fn set_tensor_op_observer(observer: Option<TensorOpObserver>) -> Option<TensorOpObserver> {
    let lock = TENSOR_OP_OBSERVER.get_or_init(|| RwLock::new(None));
    let mut slot = lock.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    std::mem::replace(&mut *slot, observer)
}

/// Emit an operation event to the currently installed observer.
///
/// No-op (and allocation free) until an observer has been registered via
/// [`set_tensor_op_observer`]. Re-entrant primitives issued from inside the
/// observer are not reported.
pub fn emit_tensor_op(
    op_name: &'static str,
    input_shape: (usize, usize),
    output_shape: (usize, usize),
) {
    let Some(lock) = TENSOR_OP_OBSERVER.get() else {
        return;
    };
    let observer = lock
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();
    let Some(observer) = observer else {
        return;
    };

    let already_in_callback = IN_OBSERVER_CALLBACK.with(|flag| flag.replace(true));
    if already_in_callback {
        return;
    }

    let event = TensorOpEvent {
        op_name,
        input_shape,
        output_shape,
    };
    let _ = catch_unwind(AssertUnwindSafe(|| observer(&event)));

    IN_OBSERVER_CALLBACK.with(|flag| flag.set(false));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tensor;
    use std::sync::Mutex;

    #[test]
    fn observer_sees_primitives_issued_on_its_thread() {
        let thread = std::thread::current().id();
        let seen: Arc<Mutex<Vec<TensorOpEvent>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let previous = set_tensor_op_observer(Some(Arc::new(move |event: &TensorOpEvent| {
            if std::thread::current().id() == thread {
                sink.lock().unwrap().push(event.clone());
            }
        })));

        let t = Tensor::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let _ = t.row_max();
        let _ = t.reshape(1, 4).unwrap();
        let _ = t.sub(&t).unwrap();

        set_tensor_op_observer(previous);
        let events = seen.lock().unwrap();
        assert!(events.contains(&TensorOpEvent {
            op_name: "row_max",
            input_shape: (2, 2),
            output_shape: (2, 1),
        }));
        assert!(events.contains(&TensorOpEvent {
            op_name: "reshape",
            input_shape: (2, 2),
            output_shape: (1, 4),
        }));
        assert!(events.contains(&TensorOpEvent {
            op_name: "sub",
            input_shape: (2, 2),
            output_shape: (2, 2),
        }));
    }
}
