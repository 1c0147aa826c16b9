//! Stateful smoothing, normalizing, and gating kinds.
//!
//! All five kinds here carry scratch across ticks. Each declares an
//! optional `time` port: when an edge feeds it, that clock drives the
//! state; otherwise the frame clock does.

use reflejo_core::{
    AudioFrame, EnvelopeFollower, HysteresisGate, PortType, QuantileWindow, RefractoryGate,
    TimedWindow, Value,
};

use crate::kind::NodeKind;
use crate::node::NodeScratch;
use crate::port::{Inputs, Outputs, PortSpec};

/// `Envelope Follower` smooths its input with separate attack and release
/// time constants in milliseconds.
pub fn envelope_follower_kind() -> NodeKind {
    NodeKind {
        label: "Envelope Follower",
        description: "Attack/release smoothing",
        inputs: vec![
            PortSpec::new("input", "Input", PortType::Number),
            PortSpec::new("attackMs", "Attack (ms)", PortType::Number)
                .with_default(Value::Number(10.0)),
            PortSpec::new("releaseMs", "Release (ms)", PortType::Number)
                .with_default(Value::Number(100.0)),
            PortSpec::new("time", "Time", PortType::Number).optional(),
        ],
        outputs: vec![PortSpec::new("output", "Envelope", PortType::Number)],
        stateful: true,
        compute: compute_envelope,
        init_scratch: || NodeScratch::Envelope(EnvelopeFollower::new(10.0, 100.0)),
    }
}

fn compute_envelope(inputs: &Inputs, frame: &AudioFrame, scratch: &mut NodeScratch) -> Outputs {
    let NodeScratch::Envelope(env) = scratch else {
        return Outputs::single(Value::Number(0.0));
    };
    env.set_attack_ms(inputs.number("attackMs"));
    env.set_release_ms(inputs.number("releaseMs"));
    let time = inputs.number_or("time", frame.time);
    let level = env.process(inputs.number("input"), time);
    Outputs::single(Value::Number(level))
}

/// `Moving Mean` averages its input over the last `windowMs` of samples.
pub fn moving_mean_kind() -> NodeKind {
    NodeKind {
        label: "Moving Mean",
        description: "Windowed mean over recent input",
        inputs: vec![
            PortSpec::new("input", "Input", PortType::Number),
            PortSpec::new("windowMs", "Window (ms)", PortType::Number)
                .with_default(Value::Number(1000.0)),
            PortSpec::new("time", "Time", PortType::Number).optional(),
        ],
        outputs: vec![PortSpec::new("output", "Mean", PortType::Number)],
        stateful: true,
        compute: compute_moving_mean,
        init_scratch: || NodeScratch::Window(TimedWindow::new(1000.0)),
    }
}

fn compute_moving_mean(inputs: &Inputs, frame: &AudioFrame, scratch: &mut NodeScratch) -> Outputs {
    let NodeScratch::Window(win) = scratch else {
        return Outputs::single(Value::Number(0.0));
    };
    win.set_window_ms(inputs.number("windowMs"));
    let time = inputs.number_or("time", frame.time);
    win.push(inputs.number("input"), time);
    Outputs::single(Value::Number(win.mean()))
}

/// `Adaptive Normalize` maps its input through the rolling
/// `[lowQuantile, highQuantile]` band of recent values to [0, 1].
pub fn adaptive_normalize_kind() -> NodeKind {
    NodeKind {
        label: "Adaptive Normalize",
        description: "Rolling-quantile normalization to [0, 1]",
        inputs: vec![
            PortSpec::new("input", "Input", PortType::Number),
            PortSpec::new("windowMs", "Window (ms)", PortType::Number)
                .with_default(Value::Number(4000.0)),
            PortSpec::new("lowQuantile", "Low Quantile", PortType::Number)
                .with_default(Value::Number(0.01)),
            PortSpec::new("highQuantile", "High Quantile", PortType::Number)
                .with_default(Value::Number(0.99)),
            PortSpec::new("time", "Time", PortType::Number).optional(),
        ],
        outputs: vec![PortSpec::new("output", "Normalized", PortType::Number)],
        stateful: true,
        compute: compute_adaptive_normalize,
        init_scratch: || NodeScratch::Quantile(QuantileWindow::new(4000.0)),
    }
}

fn compute_adaptive_normalize(
    inputs: &Inputs,
    frame: &AudioFrame,
    scratch: &mut NodeScratch,
) -> Outputs {
    let NodeScratch::Quantile(win) = scratch else {
        return Outputs::single(Value::Number(0.0));
    };
    win.set_window_ms(inputs.number("windowMs"));
    let time = inputs.number_or("time", frame.time);
    let value = inputs.number("input");
    win.push(value, time);
    let out = win.normalize(value, inputs.number("lowQuantile"), inputs.number("highQuantile"));
    Outputs::single(Value::Number(out))
}

/// `Hysteresis Gate` outputs 1 above `high`, 0 below `low`, and holds its
/// previous output in between.
pub fn hysteresis_gate_kind() -> NodeKind {
    NodeKind {
        label: "Hysteresis Gate",
        description: "Two-threshold gate with memory",
        inputs: vec![
            PortSpec::new("input", "Input", PortType::Number),
            PortSpec::new("low", "Low", PortType::Number).with_default(Value::Number(0.3)),
            PortSpec::new("high", "High", PortType::Number).with_default(Value::Number(0.5)),
        ],
        outputs: vec![PortSpec::new("output", "Gate", PortType::Number)],
        stateful: true,
        compute: compute_hysteresis_gate,
        init_scratch: || NodeScratch::Gate(HysteresisGate::new(0.3, 0.5)),
    }
}

fn compute_hysteresis_gate(
    inputs: &Inputs,
    _frame: &AudioFrame,
    scratch: &mut NodeScratch,
) -> Outputs {
    let NodeScratch::Gate(gate) = scratch else {
        return Outputs::single(Value::Number(0.0));
    };
    gate.set_thresholds(inputs.number("low"), inputs.number("high"));
    Outputs::single(Value::Number(gate.process(inputs.number("input"))))
}

/// `Refractory Gate` is a hysteresis gate that refuses to re-open until
/// `minIntervalMs` has elapsed since it last opened.
pub fn refractory_gate_kind() -> NodeKind {
    NodeKind {
        label: "Refractory Gate",
        description: "Gate with a minimum re-open interval",
        inputs: vec![
            PortSpec::new("input", "Input", PortType::Number),
            PortSpec::new("low", "Low", PortType::Number).with_default(Value::Number(0.3)),
            PortSpec::new("high", "High", PortType::Number).with_default(Value::Number(0.5)),
            PortSpec::new("minIntervalMs", "Min Interval (ms)", PortType::Number)
                .with_default(Value::Number(250.0)),
            PortSpec::new("time", "Time", PortType::Number).optional(),
        ],
        outputs: vec![PortSpec::new("output", "Gate", PortType::Number)],
        stateful: true,
        compute: compute_refractory_gate,
        init_scratch: || NodeScratch::Refractory(RefractoryGate::new(0.3, 0.5, 250.0)),
    }
}

fn compute_refractory_gate(
    inputs: &Inputs,
    frame: &AudioFrame,
    scratch: &mut NodeScratch,
) -> Outputs {
    let NodeScratch::Refractory(gate) = scratch else {
        return Outputs::single(Value::Number(0.0));
    };
    gate.set_thresholds(inputs.number("low"), inputs.number("high"));
    gate.set_min_interval_ms(inputs.number("minIntervalMs"));
    let time = inputs.number_or("time", frame.time);
    Outputs::single(Value::Number(gate.process(inputs.number("input"), time)))
}
