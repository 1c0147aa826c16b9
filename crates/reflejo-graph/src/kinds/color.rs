//! Color and vector composition kinds.

use reflejo_core::{AudioFrame, PortType, Rgba, Value};

use crate::kind::NodeKind;
use crate::node::NodeScratch;
use crate::port::{Inputs, Outputs, PortSpec};

/// `Color Mix` blends two colors by a [0, 1] factor.
pub fn color_mix_kind() -> NodeKind {
    NodeKind {
        label: "Color Mix",
        description: "Linear blend between two colors",
        inputs: vec![
            PortSpec::new("a", "A", PortType::Color).with_default(Value::Color(Rgba::BLACK)),
            PortSpec::new("b", "B", PortType::Color).with_default(Value::Color(Rgba::WHITE)),
            PortSpec::new("t", "Mix", PortType::Number).with_default(Value::Number(0.5)),
        ],
        outputs: vec![PortSpec::new("output", "Color", PortType::Color)],
        stateful: false,
        compute: compute_color_mix,
        init_scratch: || NodeScratch::None,
    }
}

fn compute_color_mix(inputs: &Inputs, _frame: &AudioFrame, _scratch: &mut NodeScratch) -> Outputs {
    let a = inputs.color("a");
    let b = inputs.color("b");
    let t = inputs.number("t") as f32;
    Outputs::single(Value::Color(a.lerp(b, t)))
}

/// `Vector3` composes three numbers into a vector.
pub fn vector3_kind() -> NodeKind {
    NodeKind {
        label: "Vector3",
        description: "Composes x/y/z into a vector",
        inputs: vec![
            PortSpec::new("x", "X", PortType::Number).with_default(Value::Number(0.0)),
            PortSpec::new("y", "Y", PortType::Number).with_default(Value::Number(0.0)),
            PortSpec::new("z", "Z", PortType::Number).with_default(Value::Number(0.0)),
        ],
        outputs: vec![PortSpec::new("output", "Vector", PortType::Vector3)],
        stateful: false,
        compute: compute_vector3,
        init_scratch: || NodeScratch::None,
    }
}

fn compute_vector3(inputs: &Inputs, _frame: &AudioFrame, _scratch: &mut NodeScratch) -> Outputs {
    Outputs::single(Value::Vector3([
        inputs.number("x"),
        inputs.number("y"),
        inputs.number("z"),
    ]))
}
