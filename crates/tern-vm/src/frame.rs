//! Per-call temporary environments.

use std::collections::HashMap;

use crate::error::FaultKind;

/// Prefix of the reserved parameter temporaries: argument `i` of a call is
/// bound to `_ARG{i}` in the callee's fresh frame. This is an ABI agreement
/// with the IR producer and must stay consistent with the dispatcher.
pub const ARG_PREFIX: &str = "_ARG";

/// The temporary-variable environment of one active call.
///
/// Frames are never shared or nested: a callee cannot see its caller's
/// temporaries, and the frame is discarded when the call returns.
#[derive(Debug, Default)]
pub struct Frame {
    slots: HashMap<String, i64>,
}

impl Frame {
    pub fn new() -> Self {
        Frame::default()
    }

    /// A fresh frame with `_ARG{i}` bound for each argument.
    pub fn with_args(args: &[i64]) -> Self {
        let mut frame = Frame::new();
        for (i, &value) in args.iter().enumerate() {
            frame.write(&format!("{}{}", ARG_PREFIX, i), value);
        }
        frame
    }

    /// Reads a temporary. A temporary that was never written is a fault,
    /// not an implicit zero.
    pub fn read(&self, name: &str) -> Result<i64, FaultKind> {
        self.slots
            .get(name)
            .copied()
            .ok_or_else(|| FaultKind::UnboundTemp(name.to_string()))
    }

    /// Writes a temporary, creating the slot if new.
    pub fn write(&mut self, name: &str, value: i64) {
        self.slots.insert(name.to_string(), value);
    }
}
