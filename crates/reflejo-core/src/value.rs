//! The closed port-type taxonomy and its value enum.
//!
//! Every dataflow connection in a network carries exactly one of these types;
//! connections are legal only between ports of the same [`PortType`]. The
//! [`Value`] enum is the matching runtime representation with the coercion
//! rules the evaluator applies at node boundaries: numbers parse from text
//! (unparsable input collapses to zero rather than erroring), text formats
//! from anything, and a mismatch that cannot coerce degrades to the
//! type-specific zero.

#[cfg(not(feature = "std"))]
use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};

use crate::frame::FrequencyAnalysis;

/// Closed set of dataflow port types.
///
/// The wire names (used by the persistence format and error messages) are the
/// lowerCamel strings from the original project format, see
/// [`wire_name`](Self::wire_name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortType {
    /// Scalar number (f64 on the wire).
    Number,
    /// UTF-8 text.
    Text,
    /// Boolean toggle.
    Toggle,
    /// RGBA color, components in [0, 1].
    Color,
    /// Three-component vector.
    Vector3,
    /// Raw byte buffer (audio signal or frequency data).
    Bytes,
    /// Spectral composite: bins plus analyzer geometry.
    Analysis,
    /// Operator selector for math nodes.
    MathOp,
}

impl PortType {
    /// Stable wire name used by persistence and diagnostics.
    pub const fn wire_name(self) -> &'static str {
        match self {
            PortType::Number => "number",
            PortType::Text => "string",
            PortType::Toggle => "boolean",
            PortType::Color => "color",
            PortType::Vector3 => "vector3",
            PortType::Bytes => "byteArray",
            PortType::Analysis => "frequencyAnalysis",
            PortType::MathOp => "mathOp",
        }
    }

    /// Parses a wire name back into a port type.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Some(match name {
            "number" => PortType::Number,
            "string" => PortType::Text,
            "boolean" => PortType::Toggle,
            "color" => PortType::Color,
            "vector3" => PortType::Vector3,
            "byteArray" => PortType::Bytes,
            "frequencyAnalysis" => PortType::Analysis,
            "mathOp" => PortType::MathOp,
            _ => return None,
        })
    }
}

impl core::fmt::Display for PortType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Binary operator selector carried on `MathOp` ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MathOp {
    /// `a + b`
    #[default]
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`, yielding 0 when `b` is 0.
    Div,
    /// `min(a, b)`
    Min,
    /// `max(a, b)`
    Max,
    /// `a.powf(b)`
    Pow,
}

impl MathOp {
    /// Parses an operator name (`"add"`, `"mul"`, ...).
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "add" => MathOp::Add,
            "sub" => MathOp::Sub,
            "mul" => MathOp::Mul,
            "div" => MathOp::Div,
            "min" => MathOp::Min,
            "max" => MathOp::Max,
            "pow" => MathOp::Pow,
            _ => return None,
        })
    }

    /// The operator's wire name.
    pub const fn name(self) -> &'static str {
        match self {
            MathOp::Add => "add",
            MathOp::Sub => "sub",
            MathOp::Mul => "mul",
            MathOp::Div => "div",
            MathOp::Min => "min",
            MathOp::Max => "max",
            MathOp::Pow => "pow",
        }
    }

    /// Applies the operator. Division by zero yields 0.
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            MathOp::Add => a + b,
            MathOp::Sub => a - b,
            MathOp::Mul => a * b,
            MathOp::Div => {
                if b == 0.0 {
                    0.0
                } else {
                    a / b
                }
            }
            MathOp::Min => a.min(b),
            MathOp::Max => a.max(b),
            MathOp::Pow => libm::pow(a, b),
        }
    }
}

/// RGBA color with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgba {
    /// Red component.
    pub r: f32,
    /// Green component.
    pub g: f32,
    /// Blue component.
    pub b: f32,
    /// Alpha component.
    pub a: f32,
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a color from components. Values are not clamped.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::new(
                f32::from(byte(0)?) / 255.0,
                f32::from(byte(2)?) / 255.0,
                f32::from(byte(4)?) / 255.0,
                1.0,
            )),
            8 => Some(Self::new(
                f32::from(byte(0)?) / 255.0,
                f32::from(byte(2)?) / 255.0,
                f32::from(byte(4)?) / 255.0,
                f32::from(byte(6)?) / 255.0,
            )),
            _ => None,
        }
    }

    /// Formats as `#rrggbbaa`.
    pub fn to_hex(self) -> String {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        format!("#{:02x}{:02x}{:02x}{:02x}", q(self.r), q(self.g), q(self.b), q(self.a))
    }

    /// Componentwise linear blend, `t` clamped to [0, 1].
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }
}

/// A runtime value flowing through a network.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Scalar number.
    Number(f64),
    /// UTF-8 text.
    Text(String),
    /// Boolean toggle.
    Toggle(bool),
    /// RGBA color.
    Color(Rgba),
    /// Three-component vector.
    Vector3([f64; 3]),
    /// Raw byte buffer.
    Bytes(Vec<u8>),
    /// Spectral composite.
    Analysis(FrequencyAnalysis),
    /// Math operator selector.
    MathOp(MathOp),
}

impl Value {
    /// The port type this value inhabits.
    pub const fn port_type(&self) -> PortType {
        match self {
            Value::Number(_) => PortType::Number,
            Value::Text(_) => PortType::Text,
            Value::Toggle(_) => PortType::Toggle,
            Value::Color(_) => PortType::Color,
            Value::Vector3(_) => PortType::Vector3,
            Value::Bytes(_) => PortType::Bytes,
            Value::Analysis(_) => PortType::Analysis,
            Value::MathOp(_) => PortType::MathOp,
        }
    }

    /// The type-specific zero: `0`, `""`, `false`, transparent, origin,
    /// empty bytes, empty analysis, `add`.
    pub fn zero(ty: PortType) -> Self {
        match ty {
            PortType::Number => Value::Number(0.0),
            PortType::Text => Value::Text(String::new()),
            PortType::Toggle => Value::Toggle(false),
            PortType::Color => Value::Color(Rgba::TRANSPARENT),
            PortType::Vector3 => Value::Vector3([0.0; 3]),
            PortType::Bytes => Value::Bytes(Vec::new()),
            PortType::Analysis => Value::Analysis(FrequencyAnalysis::default()),
            PortType::MathOp => Value::MathOp(MathOp::Add),
        }
    }

    /// Extracts a number, coercing where the taxonomy allows.
    ///
    /// Text parses as a float with NaN and parse failures collapsing to 0;
    /// toggles read as 0/1. Everything else is 0.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Text(s) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => n,
                _ => 0.0,
            },
            Value::Toggle(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }

    /// Extracts text, formatting non-text values.
    pub fn as_text(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) => format!("{n}"),
            Value::Toggle(b) => b.to_string(),
            Value::Color(c) => c.to_hex(),
            Value::Vector3([x, y, z]) => format!("[{x}, {y}, {z}]"),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
            Value::Analysis(a) => format!("<analysis {} bins>", a.bins.len()),
            Value::MathOp(op) => op.name().to_string(),
        }
    }

    /// Extracts a toggle. Numbers read as `!= 0`; text parses
    /// `"true"`/`"false"`. Everything else is `false`.
    pub fn as_toggle(&self) -> bool {
        match self {
            Value::Toggle(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => s.trim() == "true",
            _ => false,
        }
    }

    /// Extracts a byte buffer. Analysis values yield their bins; everything
    /// non-bytes yields empty.
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            Value::Bytes(b) => b.clone(),
            Value::Analysis(a) => a.bins.clone(),
            _ => Vec::new(),
        }
    }

    /// Coerces this value to the given port type, falling back to the
    /// type-specific zero when no coercion applies.
    pub fn coerce(&self, ty: PortType) -> Value {
        if self.port_type() == ty {
            return self.clone();
        }
        match ty {
            PortType::Number => Value::Number(self.as_number()),
            PortType::Text => Value::Text(self.as_text()),
            PortType::Toggle => Value::Toggle(self.as_toggle()),
            PortType::Color => match self {
                Value::Text(s) => Rgba::from_hex(s).map_or(Value::zero(ty), Value::Color),
                _ => Value::zero(ty),
            },
            PortType::Bytes => match self {
                Value::Analysis(a) => Value::Bytes(a.bins.clone()),
                _ => Value::zero(ty),
            },
            PortType::MathOp => match self {
                Value::Text(s) => MathOp::parse(s.trim()).map_or(Value::zero(ty), Value::MathOp),
                _ => Value::zero(ty),
            },
            PortType::Vector3 | PortType::Analysis => Value::zero(ty),
        }
    }
}
