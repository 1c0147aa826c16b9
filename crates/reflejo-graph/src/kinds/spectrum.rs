//! Spectral slicing and level kinds.

use reflejo_core::{AudioFrame, PortType, Value};

use crate::kind::NodeKind;
use crate::node::NodeScratch;
use crate::port::{Inputs, Outputs, PortSpec};

/// `Frequency Band` slices a frequency range out of the spectral composite.
///
/// The bin range is `[floor(startHz / binWidth), ceil(endHz / binWidth)]`
/// where `binWidth = (sampleRate / 2) / (fftSize / 2)`, clamped to the
/// available bins. `startHz > endHz` yields an empty slice.
pub fn frequency_band_kind() -> NodeKind {
    NodeKind {
        label: "Frequency Band",
        description: "Slices a Hz range out of the spectrum",
        inputs: vec![
            PortSpec::new("analysis", "Analysis", PortType::Analysis),
            PortSpec::new("startHz", "Start Hz", PortType::Number)
                .with_default(Value::Number(20.0)),
            PortSpec::new("endHz", "End Hz", PortType::Number)
                .with_default(Value::Number(200.0)),
        ],
        outputs: vec![PortSpec::new("output", "Band", PortType::Bytes)],
        stateful: false,
        compute: compute_frequency_band,
        init_scratch: || NodeScratch::None,
    }
}

fn compute_frequency_band(
    inputs: &Inputs,
    _frame: &AudioFrame,
    _scratch: &mut NodeScratch,
) -> Outputs {
    let analysis = inputs.analysis("analysis");
    let start_hz = inputs.number("startHz");
    let end_hz = inputs.number("endHz");

    let bin_width = analysis.bin_width_hz();
    if start_hz > end_hz || bin_width <= 0.0 || analysis.bins.is_empty() {
        return Outputs::single(Value::Bytes(Vec::new()));
    }

    let lo = ((start_hz / bin_width).floor().max(0.0)) as usize;
    let hi = ((end_hz / bin_width).ceil().max(0.0)) as usize;
    let lo = lo.min(analysis.bins.len());
    let hi = hi.min(analysis.bins.len().saturating_sub(1));
    if lo > hi {
        return Outputs::single(Value::Bytes(Vec::new()));
    }
    Outputs::single(Value::Bytes(analysis.bins[lo..=hi].to_vec()))
}

/// `Average Volume` takes the arithmetic mean of a byte buffer, 0 when
/// empty.
pub fn average_volume_kind() -> NodeKind {
    NodeKind {
        label: "Average Volume",
        description: "Mean level of a byte buffer",
        inputs: vec![PortSpec::new("signal", "Signal", PortType::Bytes)],
        outputs: vec![PortSpec::new("output", "Level", PortType::Number)],
        stateful: false,
        compute: compute_average_volume,
        init_scratch: || NodeScratch::None,
    }
}

fn compute_average_volume(
    inputs: &Inputs,
    _frame: &AudioFrame,
    _scratch: &mut NodeScratch,
) -> Outputs {
    let bytes = inputs.bytes("signal");
    let mean = if bytes.is_empty() {
        0.0
    } else {
        bytes.iter().map(|&b| f64::from(b)).sum::<f64>() / bytes.len() as f64
    };
    Outputs::single(Value::Number(mean))
}
