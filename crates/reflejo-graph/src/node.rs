//! Node instances and their persistent scratch state.

use std::collections::HashMap;

use reflejo_core::{
    EnvelopeFollower, HysteresisGate, QuantileWindow, RefractoryGate, TimedWindow, Value,
};

use crate::id::NodeId;

/// Persistent per-instance state for stateful node kinds.
///
/// Scratch is created when the node is materialized and carried across
/// ticks; it is cleared only on explicit graph reset or node removal. This
/// is the mechanism by which envelope followers, moving means, adaptive
/// normalizers, and refractory gates function. `compute` receives the
/// scratch as its only mutable handle.
#[derive(Debug, Clone)]
pub enum NodeScratch {
    /// Stateless kinds.
    None,
    /// Attack/release envelope state.
    Envelope(EnvelopeFollower),
    /// Rolling mean window.
    Window(TimedWindow),
    /// Rolling quantile window.
    Quantile(QuantileWindow),
    /// Hysteresis gate state.
    Gate(HysteresisGate),
    /// Refractory gate state.
    Refractory(RefractoryGate),
}

impl NodeScratch {
    /// Clears the carried state without changing the variant.
    pub fn reset(&mut self) {
        match self {
            NodeScratch::None => {}
            NodeScratch::Envelope(env) => env.reset(),
            NodeScratch::Window(win) => win.clear(),
            NodeScratch::Quantile(win) => win.clear(),
            NodeScratch::Gate(gate) => gate.reset(),
            NodeScratch::Refractory(gate) => gate.reset(),
        }
    }
}

/// One node instance inside a network graph.
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// Unique id within the graph.
    pub id: NodeId,
    /// Label of the [`NodeKind`](crate::kind::NodeKind) this instantiates.
    pub kind_label: String,
    /// Literal per-port overrides, consulted when no edge feeds a port.
    pub input_values: HashMap<String, Value>,
    /// Persistent state for stateful kinds.
    pub scratch: NodeScratch,
    /// Editor position. View-only; the evaluator ignores it.
    pub position: (f32, f32),
}

impl GraphNode {
    /// Creates a node instance with fresh scratch.
    pub fn new(id: NodeId, kind_label: impl Into<String>, scratch: NodeScratch) -> Self {
        Self {
            id,
            kind_label: kind_label.into(),
            input_values: HashMap::new(),
            scratch,
            position: (0.0, 0.0),
        }
    }

    /// Sets a literal input override.
    pub fn set_input_value(&mut self, port: impl Into<String>, value: Value) {
        self.input_values.insert(port.into(), value);
    }

    /// Removes a literal input override.
    pub fn clear_input_value(&mut self, port: &str) {
        self.input_values.remove(port);
    }
}
