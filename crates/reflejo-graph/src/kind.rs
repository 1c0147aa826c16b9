//! Node kind metadata and the uniform compute contract.
//!
//! A kind is a catalogue entry, not a subclass: behavior lives in a plain
//! function pointer with the uniform signature `(inputs, frame, scratch) ->
//! outputs`. `compute` must be deterministic given those three and must not
//! read global time except through the frame; stateful kinds mutate only
//! their scratch.

use reflejo_core::AudioFrame;

use crate::node::NodeScratch;
use crate::port::{Inputs, Outputs, PortSpec};

/// Kind label of the mandatory frame-exposing leaf node.
pub const INPUT_KIND: &str = "Input";

/// Kind label of the mandatory result node.
pub const OUTPUT_KIND: &str = "Output";

/// Conventional port id for a single-output kind's result, and for the
/// `Output` node's produced graph value.
pub const RESULT_PORT: &str = "output";

/// Conventional port id for the `Output` node's single input.
pub const OUTPUT_VALUE_PORT: &str = "value";

/// The uniform compute signature shared by every kind.
pub type ComputeFn = fn(&Inputs, &AudioFrame, &mut NodeScratch) -> Outputs;

/// Metadata and behavior for one class of node.
pub struct NodeKind {
    /// Unique label within the registry; user-facing.
    pub label: &'static str,
    /// One-line description for editors.
    pub description: &'static str,
    /// Declared input ports, in display order.
    pub inputs: Vec<PortSpec>,
    /// Declared output ports, in display order.
    pub outputs: Vec<PortSpec>,
    /// Whether instances carry scratch state across ticks.
    pub stateful: bool,
    /// The compute function.
    pub compute: ComputeFn,
    /// Creates the scratch for a fresh instance.
    pub init_scratch: fn() -> NodeScratch,
}

impl NodeKind {
    /// Looks up a declared input port.
    pub fn input(&self, id: &str) -> Option<&PortSpec> {
        self.inputs.iter().find(|p| p.id == id)
    }

    /// Looks up a declared output port.
    pub fn output(&self, id: &str) -> Option<&PortSpec> {
        self.outputs.iter().find(|p| p.id == id)
    }
}

impl core::fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeKind")
            .field("label", &self.label)
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .field("stateful", &self.stateful)
            .finish()
    }
}
