//! Port declarations and the resolved value maps handed to `compute`.
//!
//! A [`PortSpec`] declares one input or output port of a node kind. At
//! evaluation time the evaluator resolves every declared input port
//! (incoming edge, then the instance's literal override, then the port
//! default, then the type zero) into an [`Inputs`] map; `compute` returns an
//! [`Outputs`] map keyed the same way. Ports marked `optional` are left out
//! of the map when nothing feeds them, which is how stateful kinds detect
//! "no dedicated time input connected, use frame time".

use std::collections::HashMap;

use reflejo_core::{FrequencyAnalysis, MathOp, PortType, Rgba, Value};

/// Declaration of one port on a node kind.
#[derive(Debug, Clone)]
pub struct PortSpec {
    /// Port id, unique within the kind's inputs or outputs.
    pub id: &'static str,
    /// Display label for editors.
    pub label: &'static str,
    /// The port's type. Connections must match it exactly.
    pub ty: PortType,
    /// Fallback value when no edge and no instance override feed the port.
    pub default: Option<Value>,
    /// Optional ports resolve to nothing instead of the type zero.
    pub optional: bool,
}

impl PortSpec {
    /// Declares a required port with no default.
    pub fn new(id: &'static str, label: &'static str, ty: PortType) -> Self {
        Self {
            id,
            label,
            ty,
            default: None,
            optional: false,
        }
    }

    /// Attaches a default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Marks the port optional: unconnected and unset, it is absent from
    /// [`Inputs`] rather than resolving to the type zero.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Resolved input values for one `compute` invocation.
///
/// Typed getters apply the lenient coercions of the value taxonomy; missing
/// ports read as the type zero.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    values: HashMap<String, Value>,
}

impl Inputs {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a resolved value.
    pub fn insert(&mut self, port: impl Into<String>, value: Value) {
        self.values.insert(port.into(), value);
    }

    /// Raw access; `None` when the port resolved to nothing.
    pub fn get(&self, port: &str) -> Option<&Value> {
        self.values.get(port)
    }

    /// Number at `port`, 0.0 when absent.
    pub fn number(&self, port: &str) -> f64 {
        self.values.get(port).map_or(0.0, Value::as_number)
    }

    /// Number at `port`, or `fallback` when the port resolved to nothing.
    ///
    /// This is the dedicated-time-input accessor: a connected port wins,
    /// an absent one falls back to the frame clock.
    pub fn number_or(&self, port: &str, fallback: f64) -> f64 {
        self.values.get(port).map_or(fallback, Value::as_number)
    }

    /// Text at `port`, empty when absent.
    pub fn text(&self, port: &str) -> String {
        self.values.get(port).map_or_else(String::new, Value::as_text)
    }

    /// Toggle at `port`, false when absent.
    pub fn toggle(&self, port: &str) -> bool {
        self.values.get(port).is_some_and(Value::as_toggle)
    }

    /// Byte buffer at `port`, empty when absent.
    pub fn bytes(&self, port: &str) -> Vec<u8> {
        self.values.get(port).map_or_else(Vec::new, Value::as_bytes)
    }

    /// Color at `port`, transparent when absent or not a color.
    pub fn color(&self, port: &str) -> Rgba {
        match self.values.get(port) {
            Some(Value::Color(c)) => *c,
            Some(Value::Text(s)) => Rgba::from_hex(s).unwrap_or(Rgba::TRANSPARENT),
            _ => Rgba::TRANSPARENT,
        }
    }

    /// Spectral composite at `port`, empty when absent.
    pub fn analysis(&self, port: &str) -> FrequencyAnalysis {
        match self.values.get(port) {
            Some(Value::Analysis(a)) => a.clone(),
            _ => FrequencyAnalysis::default(),
        }
    }

    /// Operator at `port`. `None` when the port carries something that does
    /// not name an operator, which math kinds treat as "pass input through".
    pub fn math_op(&self, port: &str) -> Option<MathOp> {
        match self.values.get(port) {
            Some(Value::MathOp(op)) => Some(*op),
            Some(Value::Text(s)) => MathOp::parse(s.trim()),
            _ => None,
        }
    }
}

/// Output values produced by one `compute` invocation, keyed by port id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outputs {
    values: HashMap<String, Value>,
}

impl Outputs {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-port result on the conventional `output` port.
    pub fn single(value: Value) -> Self {
        let mut outputs = Self::new();
        outputs.insert(crate::kind::RESULT_PORT, value);
        outputs
    }

    /// Inserts a value.
    pub fn insert(&mut self, port: impl Into<String>, value: Value) {
        self.values.insert(port.into(), value);
    }

    /// Value at `port`.
    pub fn get(&self, port: &str) -> Option<&Value> {
        self.values.get(port)
    }

    /// The conventional single result port.
    pub fn result(&self) -> Option<&Value> {
        self.get(crate::kind::RESULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_default_on_missing_ports() {
        let inputs = Inputs::new();
        assert_eq!(inputs.number("a"), 0.0);
        assert_eq!(inputs.text("a"), "");
        assert!(!inputs.toggle("a"));
        assert!(inputs.bytes("a").is_empty());
        assert_eq!(inputs.math_op("op"), None);
    }

    #[test]
    fn number_or_distinguishes_absent_from_zero() {
        let mut inputs = Inputs::new();
        assert_eq!(inputs.number_or("time", 7.5), 7.5);
        inputs.insert("time", Value::Number(0.0));
        assert_eq!(inputs.number_or("time", 7.5), 0.0);
    }

    #[test]
    fn math_op_parses_from_text() {
        let mut inputs = Inputs::new();
        inputs.insert("op", Value::Text("mul".into()));
        assert_eq!(inputs.math_op("op"), Some(MathOp::Mul));
        inputs.insert("op", Value::Text("sine".into()));
        assert_eq!(inputs.math_op("op"), None);
    }
}
