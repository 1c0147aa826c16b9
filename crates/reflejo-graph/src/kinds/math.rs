//! Arithmetic and range-mapping kinds.

use reflejo_core::{normalize_linear, AudioFrame, MathOp, PortType, Value};

use crate::kind::NodeKind;
use crate::node::NodeScratch;
use crate::port::{Inputs, Outputs, PortSpec};

/// `Math` applies a binary operator to `a` and `b`.
///
/// Division by zero yields 0. A value on the `op` port that does not name
/// an operator passes `a` through unchanged.
pub fn math_kind() -> NodeKind {
    NodeKind {
        label: "Math",
        description: "Binary arithmetic on two numbers",
        inputs: vec![
            PortSpec::new("a", "A", PortType::Number).with_default(Value::Number(0.0)),
            PortSpec::new("b", "B", PortType::Number).with_default(Value::Number(0.0)),
            PortSpec::new("op", "Operator", PortType::MathOp)
                .with_default(Value::MathOp(MathOp::Add)),
        ],
        outputs: vec![PortSpec::new("output", "Result", PortType::Number)],
        stateful: false,
        compute: compute_math,
        init_scratch: || NodeScratch::None,
    }
}

fn compute_math(inputs: &Inputs, _frame: &AudioFrame, _scratch: &mut NodeScratch) -> Outputs {
    let a = inputs.number("a");
    let b = inputs.number("b");
    let result = match inputs.math_op("op") {
        Some(op) => op.apply(a, b),
        None => a,
    };
    Outputs::single(Value::Number(result))
}

/// `Unary Math` applies a named single-argument function to `a`.
///
/// Supported: `sin`, `cos`, `abs`, `sqrt`, `floor`, `exp`, `log`. Domain
/// violations (negative sqrt, non-positive log) and unknown names pass `a`
/// through the safe path: violations yield 0, unknown ops pass through.
pub fn unary_math_kind() -> NodeKind {
    NodeKind {
        label: "Unary Math",
        description: "Single-argument math function",
        inputs: vec![
            PortSpec::new("a", "A", PortType::Number).with_default(Value::Number(0.0)),
            PortSpec::new("op", "Function", PortType::Text)
                .with_default(Value::Text(String::from("sin"))),
        ],
        outputs: vec![PortSpec::new("output", "Result", PortType::Number)],
        stateful: false,
        compute: compute_unary_math,
        init_scratch: || NodeScratch::None,
    }
}

fn compute_unary_math(inputs: &Inputs, _frame: &AudioFrame, _scratch: &mut NodeScratch) -> Outputs {
    let a = inputs.number("a");
    let op = inputs.text("op");
    let result = match op.trim() {
        "sin" => a.sin(),
        "cos" => a.cos(),
        "abs" => a.abs(),
        "sqrt" => {
            if a < 0.0 {
                0.0
            } else {
                a.sqrt()
            }
        }
        "floor" => a.floor(),
        "exp" => a.exp(),
        "log" => {
            if a <= 0.0 {
                0.0
            } else {
                a.ln()
            }
        }
        _ => a,
    };
    Outputs::single(Value::Number(result))
}

/// `Normalize` maps `[inMin, inMax]` linearly onto `[outMin, outMax]`,
/// clamped to the output bounds. A degenerate input range yields `outMin`.
pub fn normalize_kind() -> NodeKind {
    NodeKind {
        label: "Normalize",
        description: "Linear range mapping with clamping",
        inputs: vec![
            PortSpec::new("input", "Input", PortType::Number),
            PortSpec::new("inMin", "In Min", PortType::Number).with_default(Value::Number(0.0)),
            PortSpec::new("inMax", "In Max", PortType::Number)
                .with_default(Value::Number(255.0)),
            PortSpec::new("outMin", "Out Min", PortType::Number)
                .with_default(Value::Number(0.0)),
            PortSpec::new("outMax", "Out Max", PortType::Number)
                .with_default(Value::Number(1.0)),
        ],
        outputs: vec![PortSpec::new("output", "Result", PortType::Number)],
        stateful: false,
        compute: compute_normalize,
        init_scratch: || NodeScratch::None,
    }
}

fn compute_normalize(inputs: &Inputs, _frame: &AudioFrame, _scratch: &mut NodeScratch) -> Outputs {
    let result = normalize_linear(
        inputs.number("input"),
        inputs.number("inMin"),
        inputs.number("inMax"),
        inputs.number("outMin"),
        inputs.number("outMax"),
    );
    Outputs::single(Value::Number(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_math(a: f64, b: f64, op: Value) -> f64 {
        let mut inputs = Inputs::new();
        inputs.insert("a", Value::Number(a));
        inputs.insert("b", Value::Number(b));
        inputs.insert("op", op);
        compute_math(&inputs, &AudioFrame::default(), &mut NodeScratch::None)
            .result()
            .map_or(f64::NAN, Value::as_number)
    }

    #[test]
    fn binary_operators() {
        assert_eq!(run_math(6.0, 2.0, Value::MathOp(MathOp::Div)), 3.0);
        assert_eq!(run_math(6.0, 0.0, Value::MathOp(MathOp::Div)), 0.0);
        assert_eq!(run_math(2.0, 10.0, Value::MathOp(MathOp::Pow)), 1024.0);
        assert_eq!(run_math(2.0, 10.0, Value::MathOp(MathOp::Min)), 2.0);
    }

    #[test]
    fn undefined_operator_passes_a_through() {
        assert_eq!(run_math(7.0, 3.0, Value::Text("sine".into())), 7.0);
    }

    #[test]
    fn operator_parses_from_text() {
        assert_eq!(run_math(7.0, 3.0, Value::Text("sub".into())), 4.0);
    }

    fn run_unary(a: f64, op: &str) -> f64 {
        let mut inputs = Inputs::new();
        inputs.insert("a", Value::Number(a));
        inputs.insert("op", Value::Text(op.into()));
        compute_unary_math(&inputs, &AudioFrame::default(), &mut NodeScratch::None)
            .result()
            .map_or(f64::NAN, Value::as_number)
    }

    #[test]
    fn unary_functions() {
        assert!((run_unary(core::f64::consts::FRAC_PI_2, "sin") - 1.0).abs() < 1e-12);
        assert_eq!(run_unary(-3.0, "abs"), 3.0);
        assert_eq!(run_unary(-4.0, "sqrt"), 0.0);
        assert_eq!(run_unary(0.0, "log"), 0.0);
        assert_eq!(run_unary(2.5, "floor"), 2.0);
    }

    #[test]
    fn unknown_unary_passes_through() {
        assert_eq!(run_unary(42.0, "tan"), 42.0);
    }

    #[test]
    fn normalize_degenerate_range_yields_out_min() {
        let mut inputs = Inputs::new();
        inputs.insert("input", Value::Number(5.0));
        inputs.insert("inMin", Value::Number(2.0));
        inputs.insert("inMax", Value::Number(2.0));
        inputs.insert("outMin", Value::Number(10.0));
        inputs.insert("outMax", Value::Number(20.0));
        let out = compute_normalize(&inputs, &AudioFrame::default(), &mut NodeScratch::None);
        assert_eq!(out.result(), Some(&Value::Number(10.0)));
    }
}
