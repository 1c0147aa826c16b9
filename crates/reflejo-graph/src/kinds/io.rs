//! The mandatory `Input` and `Output` kinds.

use reflejo_core::{AudioFrame, PortType, Value};

use crate::kind::{NodeKind, INPUT_KIND, OUTPUT_KIND, OUTPUT_VALUE_PORT, RESULT_PORT};
use crate::node::NodeScratch;
use crate::port::{Inputs, Outputs, PortSpec};

/// `Input` exposes the fields of the current audio frame as named ports.
///
/// It has no inputs; its outputs are the only place a network can observe
/// the outside world.
pub fn input_kind() -> NodeKind {
    NodeKind {
        label: INPUT_KIND,
        description: "Exposes the current audio frame",
        inputs: Vec::new(),
        outputs: vec![
            PortSpec::new("audioSignal", "Audio Signal", PortType::Bytes),
            PortSpec::new("frequencyData", "Frequency Data", PortType::Bytes),
            PortSpec::new("time", "Time", PortType::Number),
            PortSpec::new("sampleRate", "Sample Rate", PortType::Number),
            PortSpec::new("fftSize", "FFT Size", PortType::Number),
            PortSpec::new("frequencyAnalysis", "Frequency Analysis", PortType::Analysis),
        ],
        stateful: false,
        compute: compute_input,
        init_scratch: || NodeScratch::None,
    }
}

fn compute_input(_inputs: &Inputs, frame: &AudioFrame, _scratch: &mut NodeScratch) -> Outputs {
    let mut outputs = Outputs::new();
    outputs.insert("audioSignal", Value::Bytes(frame.time_domain.clone()));
    outputs.insert("frequencyData", Value::Bytes(frame.frequency_bins.clone()));
    outputs.insert("time", Value::Number(frame.time));
    outputs.insert("sampleRate", Value::Number(f64::from(frame.sample_rate)));
    outputs.insert("fftSize", Value::Number(frame.fft_size as f64));
    outputs.insert("frequencyAnalysis", Value::Analysis(frame.analysis()));
    outputs
}

/// `Output` returns its single input verbatim as the graph result.
///
/// The `value` port's declared type is nominal: validation and resolution
/// substitute the enclosing graph's output type.
pub fn output_kind() -> NodeKind {
    NodeKind {
        label: OUTPUT_KIND,
        description: "Produces the network's value",
        inputs: vec![PortSpec::new(OUTPUT_VALUE_PORT, "Value", PortType::Number)],
        outputs: vec![PortSpec::new(RESULT_PORT, "Result", PortType::Number)],
        stateful: false,
        compute: compute_output,
        init_scratch: || NodeScratch::None,
    }
}

fn compute_output(inputs: &Inputs, _frame: &AudioFrame, _scratch: &mut NodeScratch) -> Outputs {
    let value = inputs
        .get(OUTPUT_VALUE_PORT)
        .cloned()
        .unwrap_or(Value::Number(0.0));
    Outputs::single(value)
}
