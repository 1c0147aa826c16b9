//! Built-in node kinds.
//!
//! Kinds are grouped by family; [`builtin_kinds`] hands the full catalogue
//! to the registry. Port ids use the lowerCamel wire convention
//! (`startHz`, `windowMs`) so persisted graphs read naturally.

pub mod color;
pub mod dynamics;
pub mod io;
pub mod math;
pub mod spectrum;

use crate::kind::NodeKind;

/// The complete built-in catalogue, in registry display order.
pub fn builtin_kinds() -> Vec<NodeKind> {
    vec![
        io::input_kind(),
        io::output_kind(),
        spectrum::frequency_band_kind(),
        spectrum::average_volume_kind(),
        dynamics::envelope_follower_kind(),
        dynamics::moving_mean_kind(),
        dynamics::adaptive_normalize_kind(),
        dynamics::hysteresis_gate_kind(),
        dynamics::refractory_gate_kind(),
        math::math_kind(),
        math::unary_math_kind(),
        math::normalize_kind(),
        color::color_mix_kind(),
        color::vector3_kind(),
    ]
}
